use anyhow::{Context, Result};

#[derive(serde::Serialize, serde::Deserialize)]
pub struct Config {
    pub rpc_url: String,
    /// Multisig account address. An empty string means this deployment has no
    /// multisig configured, which callers must be able to distinguish from
    /// "configured but not a member".
    pub multisig: String,
    /// Path to the keypair of the member identity acting on our behalf.
    pub keypair_path: String,
    /// Vault used as signing authority when none is given per call.
    pub default_vault_index: u8,
    /// How many vault addresses to derive when listing members.
    pub vault_count: u8,
    pub rpc_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc_url: "https://api.mainnet-beta.solana.com".to_string(),
            multisig: String::new(),
            keypair_path: "keypair.json".to_string(),
            default_vault_index: 0,
            vault_count: 1,
            rpc_timeout_secs: 60,
        }
    }
}

impl Config {
    pub async fn load(path: &str) -> Result<Self> {
        serde_yaml::from_str(&tokio::fs::read_to_string(path).await?)
            .with_context(|| "failed to deserialize config")
    }

    pub async fn save(&self, path: &str) -> Result<()> {
        tokio::fs::write(
            path,
            serde_yaml::to_string(self).with_context(|| "failed to serialize config")?,
        )
        .await
        .with_context(|| "failed to write config")
    }
}
