use std::time::Duration;

use tokio::sync::watch;

use crate::{Address, DynLedger, LedgerError, LedgerResult, ReadOnlyClient, SignedClient};

/// Wallet connection that owns the active account and hands out ledger clients.
///
/// Anyone may read; writes require a connected account. Account switches are
/// broadcast on a watch channel so UIs can refresh ownership-dependent views.
pub struct WalletSession {
    backend: DynLedger,
    accounts: Vec<Address>,
    active: watch::Sender<Option<Address>>,
    call_timeout: Option<Duration>,
}

impl WalletSession {
    /// Session over `backend` whose wallet controls `accounts`. Starts disconnected.
    pub fn new(backend: DynLedger, accounts: Vec<Address>) -> Self {
        let (active, _) = watch::channel(None);
        Self {
            backend,
            accounts,
            active,
            call_timeout: None,
        }
    }

    pub fn with_call_timeout(mut self, call_timeout: Option<Duration>) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// Connect the wallet, returning its accounts with the active one first.
    pub fn request_accounts(&self) -> Vec<Address> {
        if self.active.borrow().is_none() {
            if let Some(first) = self.accounts.first() {
                self.active.send_replace(Some(first.clone()));
            }
        }
        let active = self.active_account();
        let mut out: Vec<Address> = active.iter().cloned().collect();
        out.extend(
            self.accounts
                .iter()
                .filter(|acc| active.as_ref() != Some(*acc))
                .cloned(),
        );
        out
    }

    /// Notification stream of the active account.
    pub fn accounts_changed(&self) -> watch::Receiver<Option<Address>> {
        self.active.subscribe()
    }

    pub fn active_account(&self) -> Option<Address> {
        self.active.borrow().clone()
    }

    /// Make `account` the active signer, adding it to the wallet if unknown.
    pub fn switch_account(&mut self, account: Address) {
        if !self.accounts.contains(&account) {
            self.accounts.push(account.clone());
        }
        tracing::info!(account = %account, "wallet account changed");
        self.active.send_replace(Some(account));
    }

    pub fn disconnect(&self) {
        self.active.send_replace(None);
    }

    pub fn read_only_client(&self) -> ReadOnlyClient {
        ReadOnlyClient::new(self.backend.clone()).with_call_timeout(self.call_timeout)
    }

    /// Client bound to the active account; fails with [`LedgerError::NoSigner`]
    /// while disconnected.
    pub fn signed_client(&self) -> LedgerResult<SignedClient> {
        let signer = self.active_account().ok_or(LedgerError::NoSigner)?;
        Ok(SignedClient::new(self.backend.clone(), signer).with_call_timeout(self.call_timeout))
    }
}
