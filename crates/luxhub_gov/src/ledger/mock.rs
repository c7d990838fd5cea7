//! In-process ledger holding the multisig program state machine, used by the
//! lifecycle tests. Enforces the store-side rules the chain would: duplicate
//! index rejection, vote switching, reject cutoff, at-most-once execution.

use {
    super::Ledger,
    crate::error::{GovernanceError, Result},
    anyhow::anyhow,
    borsh::{BorshDeserialize, BorshSerialize},
    chrono::Utc,
    solana_sdk::{
        account::Account, hash::Hash, pubkey::Pubkey, signature::Signature,
        transaction::Transaction,
    },
    squads::{
        instruction_discriminator,
        instructions::{
            ProposalActivateArgs, ProposalCancelArgs, ProposalCreateArgs, ProposalVoteArgs,
            VaultTransactionCreateArgs, VaultTransactionExecuteArgs,
        },
        state::{Member, MultisigV4, ProposalV4, VaultTransactionV4},
        status::RawProposalStatus,
    },
    std::{
        collections::{HashMap, HashSet},
        sync::Mutex,
    },
};

struct Inner {
    accounts: HashMap<Pubkey, Vec<u8>>,
    balances: HashMap<Pubkey, u64>,
    fail_balances: HashSet<Pubkey>,
    slot: u64,
    account_fetches: u64,
}

pub struct MockLedger {
    multisig: Pubkey,
    inner: Mutex<Inner>,
}

impl MockLedger {
    pub fn with_multisig(threshold: u16, members: Vec<Member>) -> (Self, Pubkey) {
        let create_key = Pubkey::new_unique();
        let (multisig, bump) = MultisigV4::derive_pda(&create_key);
        let state = MultisigV4::new(create_key, threshold, bump, members);
        let mut accounts = HashMap::new();
        accounts.insert(multisig, state.try_to_vec().unwrap());
        (
            Self {
                multisig,
                inner: Mutex::new(Inner {
                    accounts,
                    balances: HashMap::new(),
                    fail_balances: HashSet::new(),
                    slot: 100,
                    account_fetches: 0,
                }),
            },
            multisig,
        )
    }

    /// A ledger with no multisig account at all, for the unconfigured path.
    pub fn empty() -> Self {
        Self {
            multisig: Pubkey::new_unique(),
            inner: Mutex::new(Inner {
                accounts: HashMap::new(),
                balances: HashMap::new(),
                fail_balances: HashSet::new(),
                slot: 100,
                account_fetches: 0,
            }),
        }
    }

    pub fn set_balance(&self, address: Pubkey, lamports: u64) {
        self.inner.lock().unwrap().balances.insert(address, lamports);
    }

    pub fn fail_balance_for(&self, address: Pubkey) {
        self.inner.lock().unwrap().fail_balances.insert(address);
    }

    pub fn account_fetch_count(&self) -> u64 {
        self.inner.lock().unwrap().account_fetches
    }

    fn multisig_state(inner: &Inner, multisig: &Pubkey) -> anyhow::Result<MultisigV4> {
        let data = inner
            .accounts
            .get(multisig)
            .ok_or_else(|| anyhow!("multisig account not found"))?;
        Ok(MultisigV4::try_decode(data)?)
    }

    fn proposal_state(
        inner: &Inner,
        multisig: &Pubkey,
        index: u64,
    ) -> anyhow::Result<(Pubkey, ProposalV4)> {
        let (pda, _) = MultisigV4::derive_proposal_pda(multisig, index);
        let data = inner
            .accounts
            .get(&pda)
            .ok_or_else(|| anyhow!("proposal {index} not found"))?;
        Ok((pda, ProposalV4::try_decode(data)?))
    }

    fn store_multisig(inner: &mut Inner, multisig: &Pubkey, state: &MultisigV4) {
        inner.accounts.insert(*multisig, state.try_to_vec().unwrap());
    }

    fn bump_transaction_index(inner: &mut Inner, multisig: &Pubkey, index: u64) -> anyhow::Result<()> {
        let mut state = Self::multisig_state(inner, multisig)?;
        if index > state.transaction_index {
            state.transaction_index = index;
            Self::store_multisig(inner, multisig, &state);
        }
        Ok(())
    }

    fn apply(&self, inner: &mut Inner, actor: Pubkey, data: &[u8]) -> anyhow::Result<()> {
        let multisig = self.multisig;
        if data.len() < 8 {
            return Err(anyhow!("instruction data too short"));
        }
        let (disc, args) = data.split_at(8);
        let disc: [u8; 8] = disc.try_into()?;
        if disc == instruction_discriminator("vault_transaction_create") {
            let args = VaultTransactionCreateArgs::try_from_slice(args)?;
            let (pda, _) = MultisigV4::derive_transaction_pda(&multisig, args.transaction_index);
            if inner.accounts.contains_key(&pda) {
                return Err(anyhow!("account {pda} already in use"));
            }
            let (_, vault_bump) = MultisigV4::derive_vault_pda(&multisig, args.vault_index);
            let tx = VaultTransactionV4::new(
                multisig,
                actor,
                args.transaction_index,
                args.vault_index,
                vault_bump,
                args.instruction,
            );
            inner.accounts.insert(pda, tx.try_to_vec().unwrap());
            Self::bump_transaction_index(inner, &multisig, args.transaction_index)?;
        } else if disc == instruction_discriminator("proposal_create") {
            let args = ProposalCreateArgs::try_from_slice(args)?;
            let (pda, bump) = MultisigV4::derive_proposal_pda(&multisig, args.transaction_index);
            if inner.accounts.contains_key(&pda) {
                return Err(anyhow!("account {pda} already in use"));
            }
            let status = if args.draft {
                RawProposalStatus::Draft {
                    timestamp: Utc::now().timestamp(),
                }
            } else {
                RawProposalStatus::Active {
                    timestamp: Utc::now().timestamp(),
                }
            };
            let proposal = ProposalV4::new(multisig, args.transaction_index, status, bump);
            inner.accounts.insert(pda, proposal.try_to_vec().unwrap());
            Self::bump_transaction_index(inner, &multisig, args.transaction_index)?;
        } else if disc == instruction_discriminator("proposal_activate") {
            let args = ProposalActivateArgs::try_from_slice(args)?;
            let (pda, mut proposal) =
                Self::proposal_state(inner, &multisig, args.transaction_index)?;
            match proposal.status {
                RawProposalStatus::Draft { .. } => {
                    proposal.status = RawProposalStatus::Active {
                        timestamp: Utc::now().timestamp(),
                    };
                }
                other => return Err(anyhow!("cannot activate proposal in {other:?}")),
            }
            inner.accounts.insert(pda, proposal.try_to_vec().unwrap());
        } else if disc == instruction_discriminator("proposal_approve")
            || disc == instruction_discriminator("proposal_reject")
        {
            let approve = disc == instruction_discriminator("proposal_approve");
            let args = ProposalVoteArgs::try_from_slice(args)?;
            let state = Self::multisig_state(inner, &multisig)?;
            let (pda, mut proposal) =
                Self::proposal_state(inner, &multisig, args.transaction_index)?;
            match proposal.status {
                RawProposalStatus::Active { .. } | RawProposalStatus::Approved { .. } => {}
                other => return Err(anyhow!("cannot vote on proposal in {other:?}")),
            }
            if approve {
                proposal.approve(actor);
                if proposal.approved.len() >= usize::from(state.threshold) {
                    proposal.status = RawProposalStatus::Approved {
                        timestamp: Utc::now().timestamp(),
                    };
                }
            } else {
                proposal.reject(actor);
                if proposal.rejected.len() >= state.cutoff() {
                    proposal.status = RawProposalStatus::Rejected {
                        timestamp: Utc::now().timestamp(),
                    };
                }
            }
            inner.accounts.insert(pda, proposal.try_to_vec().unwrap());
        } else if disc == instruction_discriminator("proposal_cancel") {
            let args = ProposalCancelArgs::try_from_slice(args)?;
            let (pda, mut proposal) =
                Self::proposal_state(inner, &multisig, args.transaction_index)?;
            match proposal.status {
                RawProposalStatus::Draft { .. } | RawProposalStatus::Active { .. } => {}
                other => return Err(anyhow!("cannot cancel proposal in {other:?}")),
            }
            proposal.status = RawProposalStatus::Cancelled {
                timestamp: Utc::now().timestamp(),
            };
            proposal.cancelled.push(actor);
            inner.accounts.insert(pda, proposal.try_to_vec().unwrap());
        } else if disc == instruction_discriminator("vault_transaction_execute") {
            let args = VaultTransactionExecuteArgs::try_from_slice(args)?;
            let state = Self::multisig_state(inner, &multisig)?;
            let (pda, mut proposal) =
                Self::proposal_state(inner, &multisig, args.transaction_index)?;
            match proposal.status {
                RawProposalStatus::Executed { .. } | RawProposalStatus::Executing => {
                    return Err(anyhow!("proposal {} already executed", args.transaction_index));
                }
                RawProposalStatus::Active { .. } | RawProposalStatus::Approved { .. } => {}
                other => return Err(anyhow!("cannot execute proposal in {other:?}")),
            }
            if proposal.approved.len() < usize::from(state.threshold) {
                return Err(anyhow!("threshold not met"));
            }
            proposal.status = RawProposalStatus::Executed {
                timestamp: Utc::now().timestamp(),
            };
            inner.accounts.insert(pda, proposal.try_to_vec().unwrap());
        } else {
            return Err(anyhow!("unknown instruction"));
        }
        Ok(())
    }
}

impl Ledger for MockLedger {
    async fn get_account(&self, address: &Pubkey) -> Result<Option<Account>> {
        let mut inner = self.inner.lock().unwrap();
        inner.account_fetches += 1;
        Ok(inner.accounts.get(address).map(|data| Account {
            lamports: 1,
            data: data.clone(),
            owner: squads::ID,
            executable: false,
            rent_epoch: 0,
        }))
    }

    async fn get_balance(&self, address: &Pubkey) -> Result<u64> {
        let inner = self.inner.lock().unwrap();
        if inner.fail_balances.contains(address) {
            return Err(GovernanceError::Timeout("get_balance".to_string()));
        }
        Ok(inner.balances.get(address).copied().unwrap_or(0))
    }

    async fn latest_blockhash(&self) -> Result<Hash> {
        Ok(Hash::new_unique())
    }

    async fn get_slot(&self) -> Result<u64> {
        let mut inner = self.inner.lock().unwrap();
        inner.slot += 1;
        Ok(inner.slot)
    }

    /// Applies each instruction in order; a failing instruction aborts the
    /// whole transaction without persisting any of its writes.
    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature> {
        let mut inner = self.inner.lock().unwrap();
        let actor = tx.message.account_keys[0];
        let mut staged = Inner {
            accounts: inner.accounts.clone(),
            balances: inner.balances.clone(),
            fail_balances: inner.fail_balances.clone(),
            slot: inner.slot,
            account_fetches: inner.account_fetches,
        };
        for ix in &tx.message.instructions {
            let program_id = tx.message.account_keys[usize::from(ix.program_id_index)];
            if program_id != squads::ID {
                return Err(GovernanceError::Ledger(anyhow!(
                    "unexpected program {program_id}"
                )));
            }
            self.apply(&mut staged, actor, &ix.data)
                .map_err(GovernanceError::Ledger)?;
        }
        inner.accounts = staged.accounts;
        Ok(Signature::new_unique())
    }
}
