//! Response shapes shared by the CLI and the HTTP API.

use {
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
    squads::{
        state::{Permission, Permissions},
        status::ProposalState,
    },
};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusView {
    pub status: ProposalState,
    pub approvals: usize,
    pub rejections: usize,
    pub threshold: u16,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VoteOutcome {
    pub approvals: usize,
    pub rejections: usize,
    pub threshold: u16,
    pub status: ProposalState,
    pub signature: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProposalSummary {
    pub transaction_index: u64,
    pub status: ProposalState,
    pub approvals: usize,
    pub rejections: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProposalPage {
    pub proposals: Vec<ProposalSummary>,
    pub current_transaction_index: u64,
    pub generated_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PermissionsView {
    pub initiate: bool,
    pub vote: bool,
    pub execute: bool,
}

impl From<Permissions> for PermissionsView {
    fn from(value: Permissions) -> Self {
        Self {
            initiate: value.has(Permission::Initiate),
            vote: value.has(Permission::Vote),
            execute: value.has(Permission::Execute),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MembershipView {
    pub is_member: bool,
    pub permissions: PermissionsView,
    pub threshold: u16,
    pub total_members: usize,
    /// False when no multisig is configured or its account is unreachable,
    /// which callers must treat differently from "not a member".
    pub squads_configured: bool,
}

impl MembershipView {
    pub fn unconfigured() -> Self {
        Self {
            is_member: false,
            permissions: PermissionsView {
                initiate: false,
                vote: false,
                execute: false,
            },
            threshold: 0,
            total_members: 0,
            squads_configured: false,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MemberView {
    pub wallet: String,
    pub permissions: PermissionsView,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VaultView {
    pub index: u8,
    pub address: String,
    /// Omitted when the balance lookup for this vault failed.
    pub balance: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MembersPage {
    pub members: Vec<MemberView>,
    pub vaults: Vec<VaultView>,
}
