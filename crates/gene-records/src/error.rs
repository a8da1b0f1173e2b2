use gene_codec::{DecodeError, RecordId, RecordStatus};
use gene_ledger::LedgerError;
use thiserror::Error;

pub type RecordsResult<T> = Result<T, RecordsError>;

#[derive(Debug, Error)]
pub enum RecordsError {
    #[error("invalid experiment: {0}")]
    Validation(String),
    #[error("record {0} not found")]
    RecordNotFound(RecordId),
    #[error("{requester} does not own record {id} (owner {owner})")]
    NotOwner {
        id: RecordId,
        requester: String,
        owner: String,
    },
    #[error("record {id} is already {from}; cannot mark it {to}")]
    InvalidTransition {
        id: RecordId,
        from: RecordStatus,
        to: RecordStatus,
    },
    #[error("index update lost {attempts} consecutive version races")]
    IndexContention { attempts: u32 },
    #[error("no entropy for record id: {0}")]
    Entropy(String),
    #[error("stored record is malformed: {0}")]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// User-facing action an error is reported against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Submission,
    Verification,
    Rejection,
    Reconciliation,
}

impl Action {
    fn label(&self) -> &'static str {
        match self {
            Action::Submission => "Submission",
            Action::Verification => "Verification",
            Action::Rejection => "Rejection",
            Action::Reconciliation => "Reconciliation",
        }
    }
}

impl RecordsError {
    pub fn is_user_rejection(&self) -> bool {
        matches!(self, RecordsError::Ledger(err) if err.is_user_rejection())
    }

    /// Message for the presentation layer. Explicit user rejection and a
    /// missing wallet get their own wording; everything else is reported as
    /// `<Action> failed: <detail>`.
    pub fn user_message(&self, action: Action) -> String {
        match self {
            _ if self.is_user_rejection() => "Transaction rejected by user".to_string(),
            RecordsError::Ledger(LedgerError::NoSigner) => "Please connect wallet first".to_string(),
            other => format!("{} failed: {other}", action.label()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_rejection_is_distinguished() {
        let err = RecordsError::from(LedgerError::UserRejected);
        assert!(err.is_user_rejection());
        assert_eq!(err.user_message(Action::Submission), "Transaction rejected by user");
    }

    #[test]
    fn generic_failures_name_the_action() {
        let err = RecordsError::RecordNotFound(RecordId::new("1-abc"));
        assert_eq!(
            err.user_message(Action::Verification),
            "Verification failed: record 1-abc not found"
        );
        let err = RecordsError::from(LedgerError::Failed("out of gas".into()));
        assert_eq!(
            err.user_message(Action::Rejection),
            "Rejection failed: ledger call failed: out of gas"
        );
    }

    #[test]
    fn missing_wallet_asks_to_connect() {
        let err = RecordsError::from(LedgerError::NoSigner);
        assert_eq!(err.user_message(Action::Submission), "Please connect wallet first");
    }
}
