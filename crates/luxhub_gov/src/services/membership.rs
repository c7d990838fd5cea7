//! Resolves which wallets sit on the multisig and with what permission bits.
//! Holds a read-through cache of the multisig configuration with a bounded
//! TTL; the chain stays the source of truth once the entry expires.

use {
    crate::{
        error::{GovernanceError, Result},
        ledger::Ledger,
        types::{MemberView, MembersPage, MembershipView, VaultView},
    },
    solana_sdk::pubkey::Pubkey,
    squads::state::MultisigV4,
    std::{
        sync::{Arc, Mutex},
        time::{Duration, Instant},
    },
};

const DEFAULT_CONFIG_TTL: Duration = Duration::from_secs(30);

pub struct MembershipResolver<L> {
    ledger: Arc<L>,
    multisig: Option<Pubkey>,
    ttl: Duration,
    cached: Mutex<Option<(Instant, MultisigV4)>>,
}

impl<L: Ledger> MembershipResolver<L> {
    pub fn new(ledger: Arc<L>, multisig: Option<Pubkey>) -> Self {
        Self {
            ledger,
            multisig,
            ttl: DEFAULT_CONFIG_TTL,
            cached: Mutex::new(None),
        }
    }

    pub fn with_config_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Reads the multisig configuration through the cache. Absence of the
    /// account is never cached, so a deployment that gets configured later
    /// is picked up on the next call.
    async fn fetch_multisig(&self) -> Result<Option<(Pubkey, MultisigV4)>> {
        let Some(address) = self.multisig else {
            return Ok(None);
        };
        if let Some((fetched_at, state)) = self.cached.lock().unwrap().as_ref() {
            if fetched_at.elapsed() < self.ttl {
                return Ok(Some((address, state.clone())));
            }
        }
        match self.ledger.get_account(&address).await? {
            Some(account) => {
                let state = MultisigV4::try_decode(&account.data)?;
                *self.cached.lock().unwrap() = Some((Instant::now(), state.clone()));
                Ok(Some((address, state)))
            }
            None => Ok(None),
        }
    }

    /// Answers whether `wallet` is a member and with what permissions. An
    /// unconfigured or missing multisig reports `squads_configured = false`
    /// rather than erroring.
    pub async fn is_member(&self, wallet: Pubkey) -> Result<MembershipView> {
        let Some((_, state)) = self.fetch_multisig().await? else {
            return Ok(MembershipView::unconfigured());
        };
        let permissions = state
            .is_member(wallet)
            .map(|idx| state.members[idx].permissions)
            .unwrap_or_default();
        Ok(MembershipView {
            is_member: state.is_member(wallet).is_some(),
            permissions: permissions.into(),
            threshold: state.threshold,
            total_members: state.members.len(),
            squads_configured: true,
        })
    }

    /// Lists all members plus the derived vault addresses for the first
    /// `vault_count` indices. Vault balances are best effort: one failed
    /// lookup logs and omits that balance without failing the whole call.
    pub async fn list_members(&self, vault_count: u8) -> Result<MembersPage> {
        let (address, state) = self
            .fetch_multisig()
            .await?
            .ok_or(GovernanceError::NotConfigured)?;
        let members = state
            .members
            .iter()
            .map(|member| MemberView {
                wallet: member.key.to_string(),
                permissions: member.permissions.into(),
            })
            .collect();
        let mut vaults = Vec::with_capacity(usize::from(vault_count));
        for index in 0..vault_count {
            let (vault, _) = MultisigV4::derive_vault_pda(&address, index);
            let balance = match self.ledger.get_balance(&vault).await {
                Ok(balance) => Some(balance),
                Err(err) => {
                    log::warn!("balance lookup failed for vault {vault}: {err}");
                    None
                }
            };
            vaults.push(VaultView {
                index,
                address: vault.to_string(),
                balance,
            });
        }
        Ok(MembersPage { members, vaults })
    }
}
