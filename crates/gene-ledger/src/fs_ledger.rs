use crate::{Address, LedgerBackend, LedgerError, LedgerResult, TxAck, io_error};
use async_trait::async_trait;
use gene_codec::ContentHash;
use std::{
    fmt,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::{fs, sync::Mutex};

/// Filesystem-backed ledger rooted at `<root>/.ledger`.
///
/// Each key is one file named by the hex encoding of the key. Writes go through
/// a temp file and rename, serialized by a process-local lock so that
/// compare-and-set is atomic for every client sharing this handle.
#[derive(Clone)]
pub struct FsLedger {
    keys_dir: PathBuf,
    block_path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl fmt::Debug for FsLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FsLedger")
            .field("keys_dir", &self.keys_dir)
            .finish()
    }
}

impl FsLedger {
    pub async fn open(root: impl AsRef<Path>) -> LedgerResult<Self> {
        let ledger_root = root.as_ref().join(".ledger");
        let keys_dir = ledger_root.join("keys");
        fs::create_dir_all(&keys_dir)
            .await
            .map_err(|e| io_error(&keys_dir, e))?;
        Ok(Self {
            keys_dir,
            block_path: ledger_root.join("block"),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.keys_dir.join(hex::encode(key.as_bytes()))
    }

    async fn read_key(&self, key: &str) -> LedgerResult<Vec<u8>> {
        let path = self.key_path(key);
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(err) => Err(io_error(path, err)),
        }
    }

    async fn write_atomic(path: &Path, bytes: &[u8]) -> LedgerResult<()> {
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, bytes).await.map_err(|e| io_error(&tmp, e))?;
        fs::rename(&tmp, path).await.map_err(|e| io_error(path, e))
    }

    async fn next_block(&self) -> LedgerResult<u64> {
        let current = match fs::read_to_string(&self.block_path).await {
            Ok(text) => text.trim().parse::<u64>().unwrap_or(0),
            Err(err) if err.kind() == ErrorKind::NotFound => 0,
            Err(err) => return Err(io_error(&self.block_path, err)),
        };
        let next = current + 1;
        Self::write_atomic(&self.block_path, next.to_string().as_bytes()).await?;
        Ok(next)
    }

    // Caller holds `write_lock`.
    async fn apply(&self, key: &str, value: &[u8], signer: &Address) -> LedgerResult<TxAck> {
        Self::write_atomic(&self.key_path(key), value).await?;
        let block = self.next_block().await?;
        Ok(TxAck::confirm(block, signer, key, value))
    }
}

#[async_trait]
impl LedgerBackend for FsLedger {
    async fn is_available(&self) -> LedgerResult<bool> {
        Ok(fs::metadata(&self.keys_dir)
            .await
            .map(|meta| meta.is_dir())
            .unwrap_or(false))
    }

    async fn get(&self, key: &str) -> LedgerResult<Vec<u8>> {
        self.read_key(key).await
    }

    async fn set(&self, key: &str, value: &[u8], signer: &Address) -> LedgerResult<TxAck> {
        let _guard = self.write_lock.lock().await;
        self.apply(key, value, signer).await
    }

    async fn compare_and_set(
        &self,
        key: &str,
        expected: ContentHash,
        value: &[u8],
        signer: &Address,
    ) -> LedgerResult<TxAck> {
        let _guard = self.write_lock.lock().await;
        let actual = ContentHash::of_bytes(&self.read_key(key).await?);
        if actual != expected {
            return Err(LedgerError::Conflict {
                key: key.to_string(),
                expected,
                actual,
            });
        }
        self.apply(key, value, signer).await
    }

    async fn scan_keys(&self, prefix: &str) -> LedgerResult<Vec<String>> {
        let mut entries = fs::read_dir(&self.keys_dir)
            .await
            .map_err(|e| io_error(&self.keys_dir, e))?;
        let mut keys = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| io_error(&self.keys_dir, e))?
        {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            // Skips leftover temp files and anything not written by this ledger.
            let Ok(raw) = hex::decode(name) else { continue };
            let Ok(key) = String::from_utf8(raw) else { continue };
            if key.starts_with(prefix) {
                keys.push(key);
            }
        }
        keys.sort();
        Ok(keys)
    }
}
