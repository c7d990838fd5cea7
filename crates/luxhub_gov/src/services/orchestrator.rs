//! Drives proposals through their lifecycle on behalf of one member
//! identity. Holds no proposal state of its own: every decision re-derives
//! from the on-chain record, and counts are re-fetched after writes rather
//! than incremented locally.

use {
    crate::{
        error::{GovernanceError, Result},
        ledger::Ledger,
        types::{ProposalPage, ProposalSummary, StatusView, VoteOutcome},
    },
    chrono::Utc,
    solana_sdk::{
        instruction::Instruction, pubkey::Pubkey, signature::{Keypair, Signature}, signer::Signer,
        transaction::Transaction,
    },
    squads::{
        instructions,
        state::{AccountMetaSpec, MultisigV4, ProposalV4, VaultInstruction, VaultTransactionV4},
        status::{ProposalState, StatusFilter},
    },
    std::sync::Arc,
};

/// Bound on retry-with-new-index attempts when creating a proposal.
const MAX_CREATE_ATTEMPTS: u32 = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoteAction {
    Approve,
    Reject,
}

impl std::str::FromStr for VoteAction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "approve" => Ok(Self::Approve),
            "reject" => Ok(Self::Reject),
            other => Err(format!("unknown vote action: {other}")),
        }
    }
}

/// Where the first candidate transaction index comes from when the caller
/// does not pick one. Conflict retries increment from the last tried value
/// either way.
#[derive(Clone, Copy, Debug, Default)]
pub enum IndexSource {
    /// The multisig's own monotonic counter, plus one.
    #[default]
    NextTransactionIndex,
    /// The current ledger slot.
    LedgerSlot,
}

pub struct ProposalOrchestrator<L> {
    ledger: Arc<L>,
    multisig: Option<Pubkey>,
    signer: Arc<Keypair>,
    index_source: IndexSource,
}

impl<L: Ledger> ProposalOrchestrator<L> {
    pub fn new(ledger: Arc<L>, multisig: Option<Pubkey>, signer: Arc<Keypair>) -> Self {
        Self {
            ledger,
            multisig,
            signer,
            index_source: IndexSource::default(),
        }
    }

    pub fn with_index_source(mut self, index_source: IndexSource) -> Self {
        self.index_source = index_source;
        self
    }

    fn multisig(&self) -> Result<Pubkey> {
        self.multisig.ok_or(GovernanceError::NotConfigured)
    }

    async fn fetch_multisig(&self) -> Result<(Pubkey, MultisigV4)> {
        let address = self.multisig()?;
        let account = self
            .ledger
            .get_account(&address)
            .await?
            .ok_or(GovernanceError::NotConfigured)?;
        Ok((address, MultisigV4::try_decode(&account.data)?))
    }

    async fn fetch_proposal(&self, multisig: &Pubkey, index: u64) -> Result<Option<ProposalV4>> {
        let (pda, _) = MultisigV4::derive_proposal_pda(multisig, index);
        match self.ledger.get_account(&pda).await? {
            Some(account) => Ok(Some(ProposalV4::try_decode(&account.data)?)),
            None => Ok(None),
        }
    }

    async fn submit(&self, instructions: &[Instruction]) -> Result<Signature> {
        let blockhash = self.ledger.latest_blockhash().await?;
        let tx = Transaction::new_signed_with_payer(
            instructions,
            Some(&self.signer.pubkey()),
            &[self.signer.as_ref()],
            blockhash,
        );
        self.ledger.send_transaction(&tx).await
    }

    async fn first_candidate_index(&self, multisig_state: &MultisigV4) -> Result<u64> {
        match self.index_source {
            IndexSource::NextTransactionIndex => Ok(multisig_state.transaction_index + 1),
            IndexSource::LedgerSlot => self.ledger.get_slot().await,
        }
    }

    /// Creates a proposal wrapping the given instruction and returns the
    /// committed transaction index. On an index collision the attempt is
    /// retried with the next index, up to [`MAX_CREATE_ATTEMPTS`] times.
    pub async fn create(
        &self,
        program_id: Pubkey,
        accounts: Vec<AccountMetaSpec>,
        payload: Vec<u8>,
        vault_index: u8,
        desired_index: Option<u64>,
    ) -> Result<u64> {
        let (multisig, state) = self.fetch_multisig().await?;
        let wrapped = VaultInstruction {
            program_id,
            accounts,
            data: payload,
        };
        let mut index = match desired_index {
            Some(index) => index,
            None => self.first_candidate_index(&state).await?,
        };
        let mut last_tried = index;
        for attempt in 1..=MAX_CREATE_ATTEMPTS {
            last_tried = index;
            let (transaction_pda, _) = MultisigV4::derive_transaction_pda(&multisig, index);
            if self.ledger.get_account(&transaction_pda).await?.is_some() {
                log::warn!(
                    "transaction index {index} already taken, retrying (attempt {attempt}/{MAX_CREATE_ATTEMPTS})"
                );
                index += 1;
                continue;
            }
            let me = self.signer.pubkey();
            let ixs = [
                instructions::vault_transaction_create(
                    &multisig,
                    index,
                    &me,
                    vault_index,
                    wrapped.clone(),
                    None,
                ),
                instructions::proposal_create(&multisig, index, &me, false),
            ];
            match self.submit(&ixs).await {
                Ok(signature) => {
                    log::info!("created proposal at index {index} ({signature})");
                    return Ok(index);
                }
                Err(err) if is_index_conflict(&err) => {
                    log::warn!(
                        "index {index} collided on submit, retrying (attempt {attempt}/{MAX_CREATE_ATTEMPTS}): {err}"
                    );
                    index += 1;
                }
                Err(err) => return Err(err),
            }
        }
        Err(GovernanceError::Conflict {
            attempts: MAX_CREATE_ATTEMPTS,
            last_index: last_tried,
        })
    }

    /// Casts a vote. A not-yet-materialized proposal record gets a create
    /// instruction, and a draft gets an activate instruction, batched into
    /// the same transaction as the vote itself so no half-applied
    /// intermediate state is ever observable.
    pub async fn vote(&self, index: u64, action: VoteAction) -> Result<VoteOutcome> {
        let (multisig, state) = self.fetch_multisig().await?;
        let proposal = self.fetch_proposal(&multisig, index).await?;
        let current = normalized_state(proposal.as_ref(), state.threshold);
        if current.is_terminal() {
            return Err(GovernanceError::InvalidState {
                index,
                state: current,
            });
        }
        let me = self.signer.pubkey();
        let mut ixs = Vec::with_capacity(2);
        match current {
            ProposalState::None => {
                ixs.push(instructions::proposal_create(&multisig, index, &me, false));
            }
            ProposalState::Draft => {
                ixs.push(instructions::proposal_activate(&multisig, index, &me));
            }
            _ => {}
        }
        ixs.push(match action {
            VoteAction::Approve => instructions::proposal_approve(&multisig, index, &me),
            VoteAction::Reject => instructions::proposal_reject(&multisig, index, &me),
        });
        let signature = self.submit(&ixs).await?;
        // re-fetch so concurrent voters are reflected in what we report
        let proposal = self
            .fetch_proposal(&multisig, index)
            .await?
            .ok_or(GovernanceError::NotFound(index))?;
        Ok(VoteOutcome {
            approvals: proposal.approved.len(),
            rejections: proposal.rejected.len(),
            threshold: state.threshold,
            status: ProposalState::normalize(&proposal.status, proposal.approved.len(), state.threshold),
            signature: signature.to_string(),
        })
    }

    /// Executes an approved proposal through its vault. Fails fast on
    /// terminal states and on insufficient approvals; a race lost to another
    /// executor surfaces as `AlreadyExecuted`, not a generic failure.
    pub async fn execute(&self, index: u64, vault_index: u8) -> Result<Signature> {
        let (multisig, state) = self.fetch_multisig().await?;
        let proposal = self
            .fetch_proposal(&multisig, index)
            .await?
            .ok_or(GovernanceError::NotFound(index))?;
        match ProposalState::normalize(&proposal.status, proposal.approved.len(), state.threshold) {
            ProposalState::Executed => return Err(GovernanceError::AlreadyExecuted(index)),
            ProposalState::Rejected => return Err(GovernanceError::Rejected(index)),
            ProposalState::Cancelled => return Err(GovernanceError::Cancelled(index)),
            _ => {}
        }
        let approvals = proposal.approved.len();
        if approvals < usize::from(state.threshold) {
            return Err(GovernanceError::ThresholdNotMet {
                approvals,
                threshold: state.threshold,
            });
        }
        let (transaction_pda, _) = MultisigV4::derive_transaction_pda(&multisig, index);
        let account = self
            .ledger
            .get_account(&transaction_pda)
            .await?
            .ok_or(GovernanceError::NotFound(index))?;
        let stored = VaultTransactionV4::try_decode(&account.data)?;
        if stored.vault_index != vault_index {
            log::warn!(
                "executing proposal {index} with stored vault {} (caller asked for {vault_index})",
                stored.vault_index
            );
        }
        let ix = instructions::vault_transaction_execute(
            &multisig,
            index,
            &self.signer.pubkey(),
            &stored.instruction,
        );
        self.submit(&[ix]).await.map_err(|err| {
            if err.to_string().contains("already executed") {
                GovernanceError::AlreadyExecuted(index)
            } else {
                err
            }
        })
    }

    /// Cancels an in-flight proposal. Only Draft and Active proposals can be
    /// cancelled.
    pub async fn cancel(&self, index: u64) -> Result<Signature> {
        let (multisig, state) = self.fetch_multisig().await?;
        let proposal = self
            .fetch_proposal(&multisig, index)
            .await?
            .ok_or(GovernanceError::NotFound(index))?;
        let current =
            ProposalState::normalize(&proposal.status, proposal.approved.len(), state.threshold);
        if !matches!(current, ProposalState::Draft | ProposalState::Active) {
            return Err(GovernanceError::InvalidState {
                index,
                state: current,
            });
        }
        self.submit(&[instructions::proposal_cancel(
            &multisig,
            index,
            &self.signer.pubkey(),
        )])
        .await
    }

    /// Pure read of a proposal's normalized state and vote counts. A record
    /// that does not exist yet reads as Draft with zero counts, since that is
    /// a valid observable state from the caller's perspective.
    pub async fn status(&self, index: u64) -> Result<StatusView> {
        let (multisig, state) = self.fetch_multisig().await?;
        let proposal = self.fetch_proposal(&multisig, index).await?;
        Ok(match proposal {
            Some(proposal) => StatusView {
                status: ProposalState::normalize(
                    &proposal.status,
                    proposal.approved.len(),
                    state.threshold,
                ),
                approvals: proposal.approved.len(),
                rejections: proposal.rejected.len(),
                threshold: state.threshold,
            },
            None => StatusView {
                status: ProposalState::Draft,
                approvals: 0,
                rejections: 0,
                threshold: state.threshold,
            },
        })
    }

    /// Walks transaction indices downward from the multisig's counter,
    /// skipping indices with no proposal record, until `limit` matches are
    /// collected. The store exposes no secondary index, so this is a linear
    /// scan over the counter range.
    pub async fn list(
        &self,
        filter: Option<StatusFilter>,
        limit: usize,
    ) -> Result<ProposalPage> {
        let (multisig, state) = self.fetch_multisig().await?;
        let mut proposals = Vec::new();
        let mut index = state.transaction_index;
        while index >= 1 && proposals.len() < limit {
            if let Some(proposal) = self.fetch_proposal(&multisig, index).await? {
                let status = ProposalState::normalize(
                    &proposal.status,
                    proposal.approved.len(),
                    state.threshold,
                );
                if filter.map(|f| f.matches(status)).unwrap_or(true) {
                    proposals.push(ProposalSummary {
                        transaction_index: index,
                        status,
                        approvals: proposal.approved.len(),
                        rejections: proposal.rejected.len(),
                    });
                }
            }
            index -= 1;
        }
        Ok(ProposalPage {
            proposals,
            current_transaction_index: state.transaction_index,
            generated_at: Utc::now(),
        })
    }
}

fn normalized_state(proposal: Option<&ProposalV4>, threshold: u16) -> ProposalState {
    match proposal {
        Some(p) => ProposalState::normalize(&p.status, p.approved.len(), threshold),
        None => ProposalState::None,
    }
}

/// The store signals an index collision as an attempt to re-create an
/// account that already exists.
fn is_index_conflict(err: &GovernanceError) -> bool {
    err.to_string().contains("already in use")
}
