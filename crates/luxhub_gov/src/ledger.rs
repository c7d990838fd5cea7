#[cfg(test)]
pub mod mock;

use {
    crate::error::{GovernanceError, Result},
    anyhow::anyhow,
    solana_client::{
        client_error::{ClientError, ClientErrorKind},
        nonblocking::rpc_client::RpcClient,
    },
    solana_sdk::{
        account::Account, commitment_config::CommitmentConfig, hash::Hash, pubkey::Pubkey,
        signature::Signature, transaction::Transaction,
    },
    std::time::Duration,
};

/// Read/write primitives against the external ledger. The orchestrator and
/// membership resolver are generic over this seam so the lifecycle logic can
/// be exercised against an in-process ledger in tests.
#[allow(async_fn_in_trait)]
pub trait Ledger: Send + Sync {
    /// Fetches an account, `None` if it does not exist on the ledger.
    async fn get_account(&self, address: &Pubkey) -> Result<Option<Account>>;
    async fn get_balance(&self, address: &Pubkey) -> Result<u64>;
    async fn latest_blockhash(&self) -> Result<Hash>;
    async fn get_slot(&self) -> Result<u64>;
    /// Submits a signed transaction and waits for confirmation.
    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature>;
}

pub struct RpcLedger {
    rpc: RpcClient,
}

impl RpcLedger {
    pub fn new(url: &str, timeout_secs: u64) -> Self {
        Self {
            rpc: RpcClient::new_with_timeout(url.to_string(), Duration::from_secs(timeout_secs)),
        }
    }
}

/// Timeouts are picked apart from other rpc failures here so callers can
/// treat them as safely retryable.
fn classify(err: ClientError, op: &str) -> GovernanceError {
    match &err.kind {
        ClientErrorKind::Reqwest(e) if e.is_timeout() => GovernanceError::Timeout(op.to_string()),
        _ => GovernanceError::Ledger(anyhow!("{op} failed: {err}")),
    }
}

impl Ledger for RpcLedger {
    async fn get_account(&self, address: &Pubkey) -> Result<Option<Account>> {
        Ok(self
            .rpc
            .get_account_with_commitment(address, CommitmentConfig::confirmed())
            .await
            .map_err(|err| classify(err, "get_account"))?
            .value)
    }

    async fn get_balance(&self, address: &Pubkey) -> Result<u64> {
        self.rpc
            .get_balance(address)
            .await
            .map_err(|err| classify(err, "get_balance"))
    }

    async fn latest_blockhash(&self) -> Result<Hash> {
        self.rpc
            .get_latest_blockhash()
            .await
            .map_err(|err| classify(err, "get_latest_blockhash"))
    }

    async fn get_slot(&self) -> Result<u64> {
        self.rpc
            .get_slot()
            .await
            .map_err(|err| classify(err, "get_slot"))
    }

    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature> {
        self.rpc
            .send_and_confirm_transaction(tx)
            .await
            .map_err(|err| classify(err, "send_transaction"))
    }
}
