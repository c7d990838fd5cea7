use squads::status::ProposalState;

/// Failure taxonomy surfaced at the orchestrator boundary. Ledger failures
/// are always re-wrapped into one of these, never swallowed; the CLI and API
/// translate variants into user-facing messages.
#[derive(Debug, thiserror::Error)]
pub enum GovernanceError {
    #[error("proposal not found at transaction index {0}")]
    NotFound(u64),
    #[error("transaction index conflict after {attempts} attempts, last tried index {last_index}")]
    Conflict { attempts: u32, last_index: u64 },
    #[error("operation not permitted while proposal {index} is {state}")]
    InvalidState { index: u64, state: ProposalState },
    #[error("threshold not met: {approvals} of {threshold} required approvals")]
    ThresholdNotMet { approvals: usize, threshold: u16 },
    #[error("proposal {0} has already been executed")]
    AlreadyExecuted(u64),
    #[error("proposal {0} was rejected")]
    Rejected(u64),
    #[error("proposal {0} was cancelled")]
    Cancelled(u64),
    #[error("no multisig is configured for this deployment")]
    NotConfigured,
    #[error("ledger rpc timed out during {0}")]
    Timeout(String),
    #[error("failed to decode account: {0}")]
    Decode(#[from] squads::DecodeError),
    #[error(transparent)]
    Ledger(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, GovernanceError>;
