use {
    anyhow::Context,
    luxhub_gov::config::Config,
    solana_sdk::pubkey::Pubkey,
    std::str::FromStr,
};

pub async fn check(matches: &clap::ArgMatches, config_path: &str) -> anyhow::Result<()> {
    let cfg = Config::load(config_path).await?;
    let (_, membership) = super::components(&cfg)?;
    let wallet = Pubkey::from_str(matches.get_one::<String>("wallet").unwrap())
        .with_context(|| "invalid wallet address")?;
    let view = membership.is_member(wallet).await?;
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}

pub async fn list(matches: &clap::ArgMatches, config_path: &str) -> anyhow::Result<()> {
    let cfg = Config::load(config_path).await?;
    let (_, membership) = super::components(&cfg)?;
    let vault_count = matches
        .get_one::<u8>("vault-count")
        .copied()
        .unwrap_or(cfg.vault_count);
    let page = membership.list_members(vault_count).await?;
    println!("{}", serde_json::to_string_pretty(&page)?);
    Ok(())
}
