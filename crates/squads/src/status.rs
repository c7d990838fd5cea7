//! Single normalization boundary between the on-chain status encodings and
//! the canonical state used everywhere else. Downstream code never branches
//! on raw tags.

use {
    borsh::{BorshDeserialize, BorshSerialize},
    serde::{Deserialize, Serialize},
    std::{fmt, str::FromStr},
};

/// Status union as stored on chain. Older program/SDK generations carried a
/// distinct `Executing` tag between approval and settlement; it no longer
/// appears in new writes but historical accounts still hold it.
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RawProposalStatus {
    Draft { timestamp: i64 },
    Active { timestamp: i64 },
    Rejected { timestamp: i64 },
    Approved { timestamp: i64 },
    Executing,
    Executed { timestamp: i64 },
    Cancelled { timestamp: i64 },
}

/// Canonical proposal state. `None` means the proposal record has not been
/// materialized on chain yet; `Approved` is observational (approvals have
/// reached the threshold) and keeps accepting votes until execution.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProposalState {
    None,
    Draft,
    Active,
    Approved,
    Executed,
    Rejected,
    Cancelled,
}

impl ProposalState {
    /// Maps a raw on-chain tag to the canonical state. An `Active` proposal
    /// whose approvals already meet the threshold reads as `Approved`, so two
    /// concurrent voters observe the same state regardless of which write
    /// flipped the stored tag.
    pub fn normalize(raw: &RawProposalStatus, approvals: usize, threshold: u16) -> Self {
        match raw {
            RawProposalStatus::Draft { .. } => Self::Draft,
            RawProposalStatus::Active { .. } => {
                if approvals >= usize::from(threshold) && threshold > 0 {
                    Self::Approved
                } else {
                    Self::Active
                }
            }
            RawProposalStatus::Approved { .. } | RawProposalStatus::Executing => Self::Approved,
            RawProposalStatus::Executed { .. } => Self::Executed,
            RawProposalStatus::Rejected { .. } => Self::Rejected,
            RawProposalStatus::Cancelled { .. } => Self::Cancelled,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Executed | Self::Rejected | Self::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Draft => "Draft",
            Self::Active => "Active",
            Self::Approved => "Approved",
            Self::Executed => "Executed",
            Self::Rejected => "Rejected",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for ProposalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProposalState {
    type Err = String;

    /// Accepts both current and legacy SDK spellings of each state.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "draft" => Ok(Self::Draft),
            "active" => Ok(Self::Active),
            "approved" | "executeready" | "execute_ready" | "executing" => Ok(Self::Approved),
            "executed" => Ok(Self::Executed),
            "rejected" => Ok(Self::Rejected),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            other => Err(format!("unknown proposal state: {other}")),
        }
    }
}

/// Filter over normalized states. `Pending` groups the votable-or-executable
/// states (Active, Approved).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusFilter {
    State(ProposalState),
    Pending,
}

impl StatusFilter {
    pub fn matches(&self, state: ProposalState) -> bool {
        match self {
            Self::State(want) => *want == state,
            Self::Pending => matches!(state, ProposalState::Active | ProposalState::Approved),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("pending") {
            return Ok(Self::Pending);
        }
        Ok(Self::State(s.parse()?))
    }
}
