use {
    anyhow::{anyhow, Context},
    base64::{engine::general_purpose::STANDARD, Engine},
    luxhub_gov::{config::Config, services::orchestrator::VoteAction},
    solana_sdk::pubkey::Pubkey,
    squads::{state::AccountMetaSpec, status::StatusFilter},
    std::str::FromStr,
};

pub async fn create(matches: &clap::ArgMatches, config_path: &str) -> anyhow::Result<()> {
    let cfg = Config::load(config_path).await?;
    let (orchestrator, _) = super::components(&cfg)?;
    let program_id = Pubkey::from_str(matches.get_one::<String>("program-id").unwrap())
        .with_context(|| "invalid program id")?;
    let accounts = matches
        .get_many::<String>("account")
        .unwrap_or_default()
        .map(|spec| parse_account_spec(spec))
        .collect::<anyhow::Result<Vec<_>>>()?;
    let payload = STANDARD
        .decode(matches.get_one::<String>("payload-b64").unwrap())
        .with_context(|| "payload is not valid base64")?;
    let vault_index = matches
        .get_one::<u8>("vault-index")
        .copied()
        .unwrap_or(cfg.default_vault_index);
    let desired_index = matches.get_one::<u64>("index").copied();
    let transaction_index = orchestrator
        .create(program_id, accounts, payload, vault_index, desired_index)
        .await?;
    println!("{}", serde_json::json!({ "transaction_index": transaction_index }));
    Ok(())
}

pub async fn vote(matches: &clap::ArgMatches, config_path: &str) -> anyhow::Result<()> {
    let cfg = Config::load(config_path).await?;
    let (orchestrator, _) = super::components(&cfg)?;
    let index = *matches.get_one::<u64>("index").unwrap();
    let action = VoteAction::from_str(matches.get_one::<String>("action").unwrap())
        .map_err(|msg| anyhow!(msg))?;
    let outcome = orchestrator.vote(index, action).await?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

pub async fn execute(matches: &clap::ArgMatches, config_path: &str) -> anyhow::Result<()> {
    let cfg = Config::load(config_path).await?;
    let (orchestrator, _) = super::components(&cfg)?;
    let index = *matches.get_one::<u64>("index").unwrap();
    let vault_index = matches
        .get_one::<u8>("vault-index")
        .copied()
        .unwrap_or(cfg.default_vault_index);
    let signature = orchestrator.execute(index, vault_index).await?;
    println!("{}", serde_json::json!({ "signature": signature.to_string() }));
    Ok(())
}

pub async fn cancel(matches: &clap::ArgMatches, config_path: &str) -> anyhow::Result<()> {
    let cfg = Config::load(config_path).await?;
    let (orchestrator, _) = super::components(&cfg)?;
    let index = *matches.get_one::<u64>("index").unwrap();
    let signature = orchestrator.cancel(index).await?;
    println!("{}", serde_json::json!({ "signature": signature.to_string() }));
    Ok(())
}

pub async fn status(matches: &clap::ArgMatches, config_path: &str) -> anyhow::Result<()> {
    let cfg = Config::load(config_path).await?;
    let (orchestrator, _) = super::components(&cfg)?;
    let index = *matches.get_one::<u64>("index").unwrap();
    let view = orchestrator.status(index).await?;
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}

pub async fn list(matches: &clap::ArgMatches, config_path: &str) -> anyhow::Result<()> {
    let cfg = Config::load(config_path).await?;
    let (orchestrator, _) = super::components(&cfg)?;
    let filter = match matches.get_one::<String>("status") {
        Some(s) => Some(StatusFilter::from_str(s).map_err(|msg| anyhow!(msg))?),
        None => None,
    };
    let limit = matches.get_one::<usize>("limit").copied().unwrap_or(20);
    let page = orchestrator.list(filter, limit).await?;
    println!("{}", serde_json::to_string_pretty(&page)?);
    Ok(())
}

/// Parses `<address>[:flags]` where flags are any of `s` (signer) and
/// `w` (writable), e.g. `So11111111111111111111111111111111111111112:w`.
fn parse_account_spec(spec: &str) -> anyhow::Result<AccountMetaSpec> {
    let (address, flags) = match spec.split_once(':') {
        Some((address, flags)) => (address, flags),
        None => (spec, ""),
    };
    for flag in flags.chars() {
        if flag != 's' && flag != 'w' {
            return Err(anyhow!("unknown account flag '{flag}' in {spec}"));
        }
    }
    Ok(AccountMetaSpec {
        address: Pubkey::from_str(address)
            .with_context(|| format!("invalid account address in {spec}"))?,
        is_signer: flags.contains('s'),
        is_writable: flags.contains('w'),
    })
}
