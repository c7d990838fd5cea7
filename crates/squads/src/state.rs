use {
    crate::{
        account_discriminator, status::RawProposalStatus, DecodeError, ID, SEED_PREFIX,
        SEED_PROPOSAL, SEED_TRANSACTION, SEED_VAULT,
    },
    borsh::{BorshDeserialize, BorshSerialize},
    solana_sdk::pubkey::Pubkey,
};

pub const MULTISIG_DISCRIMINATOR: [u8; 8] = [224, 116, 121, 186, 68, 161, 79, 236];

#[derive(BorshSerialize, BorshDeserialize, Clone, Debug)]
pub struct MultisigV4 {
    __discriminator: [u8; 8],
    /// Key that is used to seed the multisig PDA.
    pub create_key: Pubkey,
    /// The authority that can change the multisig config.
    /// `Pubkey::default()` means the multisig is autonomous and every config
    /// change goes through the normal voting process.
    pub config_authority: Pubkey,
    /// Threshold for signatures.
    pub threshold: u16,
    /// How many seconds must pass between transaction voting settlement and execution.
    pub time_lock: u32,
    /// Last transaction index. 0 means no transactions have been created.
    pub transaction_index: u64,
    /// Last stale transaction index. All transactions up until this index are stale.
    pub stale_transaction_index: u64,
    /// Where rent for closed transaction accounts can be reclaimed, if enabled.
    pub rent_collector: Option<Pubkey>,
    /// Bump for the multisig PDA seed.
    pub bump: u8,
    /// Members of the multisig, sorted by key.
    pub members: Vec<Member>,
}

impl MultisigV4 {
    pub fn new(create_key: Pubkey, threshold: u16, bump: u8, mut members: Vec<Member>) -> Self {
        members.sort_by_key(|m| m.key);
        Self {
            __discriminator: MULTISIG_DISCRIMINATOR,
            create_key,
            config_authority: Pubkey::default(),
            threshold,
            time_lock: 0,
            transaction_index: 0,
            stale_transaction_index: 0,
            rent_collector: None,
            bump,
            members,
        }
    }

    pub fn try_decode(data: &[u8]) -> Result<Self, DecodeError> {
        if data.len() < 8 {
            return Err(DecodeError::TooShort);
        }
        if data[..8] != MULTISIG_DISCRIMINATOR {
            return Err(DecodeError::Discriminator {
                expected: "Multisig",
            });
        }
        Ok(Self::deserialize(&mut &data[..])?)
    }

    pub fn num_voters(members: &[Member]) -> usize {
        members
            .iter()
            .filter(|m| m.permissions.has(Permission::Vote))
            .count()
    }

    pub fn num_proposers(members: &[Member]) -> usize {
        members
            .iter()
            .filter(|m| m.permissions.has(Permission::Initiate))
            .count()
    }

    pub fn num_executors(members: &[Member]) -> usize {
        members
            .iter()
            .filter(|m| m.permissions.has(Permission::Execute))
            .count()
    }

    /// Returns `Some(index)` if `member_pubkey` is a member, with `index` into the `members` vec.
    /// `None` otherwise.
    pub fn is_member(&self, member_pubkey: Pubkey) -> Option<usize> {
        self.members
            .binary_search_by_key(&member_pubkey, |m| m.key)
            .ok()
    }

    pub fn member_has_permission(&self, member_pubkey: Pubkey, permission: Permission) -> bool {
        match self.is_member(member_pubkey) {
            Some(index) => self.members[index].permissions.has(permission),
            _ => false,
        }
    }

    /// How many "reject" votes are enough to make the transaction "Rejected".
    /// The cutoff must be such that it is impossible for the remaining voters
    /// to reach the approval threshold.
    /// For example: total voters = 7, threshold = 3, cutoff = 5.
    pub fn cutoff(&self) -> usize {
        Self::num_voters(&self.members)
            .saturating_sub(usize::from(self.threshold))
            .saturating_add(1)
    }

    pub fn derive_pda(create_key: &Pubkey) -> (Pubkey, u8) {
        Pubkey::find_program_address(&[SEED_PREFIX, SEED_PREFIX, create_key.as_ref()], &ID)
    }

    pub fn derive_vault_pda(multisig_pda: &Pubkey, index: u8) -> (Pubkey, u8) {
        Pubkey::find_program_address(
            &[SEED_PREFIX, multisig_pda.as_ref(), SEED_VAULT, &[index]],
            &ID,
        )
    }

    pub fn derive_transaction_pda(multisig_pda: &Pubkey, transaction_index: u64) -> (Pubkey, u8) {
        Pubkey::find_program_address(
            &[
                SEED_PREFIX,
                multisig_pda.as_ref(),
                SEED_TRANSACTION,
                &transaction_index.to_le_bytes(),
            ],
            &ID,
        )
    }

    pub fn derive_proposal_pda(multisig_pda: &Pubkey, transaction_index: u64) -> (Pubkey, u8) {
        Pubkey::find_program_address(
            &[
                SEED_PREFIX,
                multisig_pda.as_ref(),
                SEED_TRANSACTION,
                &transaction_index.to_le_bytes(),
                SEED_PROPOSAL,
            ],
            &ID,
        )
    }
}

#[derive(BorshSerialize, BorshDeserialize, Eq, PartialEq, Clone, Debug)]
pub struct Member {
    pub key: Pubkey,
    pub permissions: Permissions,
}

#[derive(Clone, Copy, Debug)]
pub enum Permission {
    Initiate = 1 << 0,
    Vote = 1 << 1,
    Execute = 1 << 2,
}

/// Bitmask for permissions.
#[derive(BorshSerialize, BorshDeserialize, Eq, PartialEq, Clone, Copy, Default, Debug)]
pub struct Permissions {
    pub mask: u8,
}

impl Permissions {
    pub fn from_vec(permissions: &[Permission]) -> Self {
        let mut mask = 0;
        for permission in permissions {
            mask |= *permission as u8;
        }
        Self { mask }
    }

    pub fn all() -> Self {
        Self::from_vec(&[Permission::Initiate, Permission::Vote, Permission::Execute])
    }

    pub fn has(&self, permission: Permission) -> bool {
        self.mask & (permission as u8) != 0
    }
}

/// Per-transaction voting record. Approved/rejected sets are disjoint, the
/// program moves a switching voter between them rather than double-recording.
#[derive(BorshSerialize, BorshDeserialize, Debug)]
pub struct ProposalV4 {
    __discriminator: [u8; 8],
    /// The multisig this proposal belongs to.
    pub multisig: Pubkey,
    /// Index of the multisig transaction this proposal is associated with.
    pub transaction_index: u64,
    /// The status of the transaction.
    pub status: RawProposalStatus,
    /// PDA bump.
    pub bump: u8,
    /// Keys of the members that approved the transaction.
    pub approved: Vec<Pubkey>,
    /// Keys of the members that rejected the transaction.
    pub rejected: Vec<Pubkey>,
    /// Keys of the members that cancelled the transaction.
    pub cancelled: Vec<Pubkey>,
}

impl ProposalV4 {
    pub fn new(multisig: Pubkey, transaction_index: u64, status: RawProposalStatus, bump: u8) -> Self {
        Self {
            __discriminator: account_discriminator("Proposal"),
            multisig,
            transaction_index,
            status,
            bump,
            approved: vec![],
            rejected: vec![],
            cancelled: vec![],
        }
    }

    pub fn try_decode(data: &[u8]) -> Result<Self, DecodeError> {
        if data.len() < 8 {
            return Err(DecodeError::TooShort);
        }
        if data[..8] != account_discriminator("Proposal") {
            return Err(DecodeError::Discriminator {
                expected: "Proposal",
            });
        }
        Ok(Self::deserialize(&mut &data[..])?)
    }

    /// Moves `member` into the approved set, clearing any standing rejection.
    pub fn approve(&mut self, member: Pubkey) {
        self.rejected.retain(|k| *k != member);
        if !self.approved.contains(&member) {
            self.approved.push(member);
        }
    }

    /// Moves `member` into the rejected set, clearing any standing approval.
    pub fn reject(&mut self, member: Pubkey) {
        self.approved.retain(|k| *k != member);
        if !self.rejected.contains(&member) {
            self.rejected.push(member);
        }
    }

    pub fn has_voted(&self, member: &Pubkey) -> bool {
        self.approved.contains(member) || self.rejected.contains(member)
    }
}

/// One account reference of a wrapped instruction.
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct AccountMetaSpec {
    pub address: Pubkey,
    pub is_signer: bool,
    pub is_writable: bool,
}

/// The opaque target operation a proposal performs upon execution.
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct VaultInstruction {
    pub program_id: Pubkey,
    pub accounts: Vec<AccountMetaSpec>,
    pub data: Vec<u8>,
}

/// The stored transaction a proposal votes over: which vault signs, and the
/// wrapped instruction to run once approved.
#[derive(BorshSerialize, BorshDeserialize, Debug)]
pub struct VaultTransactionV4 {
    __discriminator: [u8; 8],
    pub multisig: Pubkey,
    pub creator: Pubkey,
    pub transaction_index: u64,
    pub vault_index: u8,
    pub vault_bump: u8,
    pub instruction: VaultInstruction,
}

impl VaultTransactionV4 {
    pub fn new(
        multisig: Pubkey,
        creator: Pubkey,
        transaction_index: u64,
        vault_index: u8,
        vault_bump: u8,
        instruction: VaultInstruction,
    ) -> Self {
        Self {
            __discriminator: account_discriminator("VaultTransaction"),
            multisig,
            creator,
            transaction_index,
            vault_index,
            vault_bump,
            instruction,
        }
    }

    pub fn try_decode(data: &[u8]) -> Result<Self, DecodeError> {
        if data.len() < 8 {
            return Err(DecodeError::TooShort);
        }
        if data[..8] != account_discriminator("VaultTransaction") {
            return Err(DecodeError::Discriminator {
                expected: "VaultTransaction",
            });
        }
        Ok(Self::deserialize(&mut &data[..])?)
    }
}
