//! `generec stats` command.

use anyhow::Result;
use gene_records::{aggregate, histogram};
use serde_json::json;

use crate::opts::{LedgerOpts, connect};
use crate::output::print_success;

pub async fn cmd_stats(opts: &LedgerOpts) -> Result<()> {
    let conn = connect(opts).await?;
    let records = conn
        .manager
        .load_all(&conn.session.read_only_client())
        .await;

    let stats = aggregate(&records);
    let edges = &conn.manager.config().histogram_edges;
    let counts = histogram(&records, edges);

    let mut human = vec![
        format!("total      {}", stats.total),
        format!("verified   {}", stats.verified),
        format!("pending    {}", stats.pending),
        format!("rejected   {}", stats.rejected),
        format!("avg eff.   {:.1}%", stats.avg_efficiency),
        String::new(),
        "efficiency distribution".to_string(),
    ];
    let mut lower: Option<f64> = None;
    for (upper, count) in edges.iter().zip(&counts) {
        let label = match lower {
            None => format!("<= {upper}"),
            Some(lo) => format!("{lo}-{upper}"),
        };
        human.push(format!("  {label:>9}  {count}"));
        lower = Some(*upper);
    }

    let buckets: Vec<_> = edges
        .iter()
        .zip(&counts)
        .map(|(upper, count)| json!({ "upTo": upper, "count": count }))
        .collect();
    let data = json!({ "stats": stats, "histogram": buckets });
    print_success(opts, data, human.join("\n"), vec![])
}
