use {
    anyhow::Context,
    luxhub_gov::{
        config::Config,
        ledger::RpcLedger,
        services::{membership::MembershipResolver, orchestrator::ProposalOrchestrator},
    },
    solana_sdk::{pubkey::Pubkey, signature::read_keypair_file},
    std::{str::FromStr, sync::Arc},
    tokio::signal::unix::Signal,
};

pub mod api;
pub mod config;
pub mod members;
pub mod proposal;

/// Builds the orchestrator and membership resolver a command needs from the
/// loaded config.
pub fn components(
    cfg: &Config,
) -> anyhow::Result<(
    ProposalOrchestrator<RpcLedger>,
    MembershipResolver<RpcLedger>,
)> {
    let ledger = Arc::new(RpcLedger::new(&cfg.rpc_url, cfg.rpc_timeout_secs));
    let multisig = if cfg.multisig.is_empty() {
        None
    } else {
        Some(
            Pubkey::from_str(&cfg.multisig)
                .with_context(|| "invalid multisig address in config")?,
        )
    };
    let signer = Arc::new(
        read_keypair_file(&cfg.keypair_path)
            .map_err(|err| anyhow::anyhow!("failed to read keypair: {err}"))?,
    );
    Ok((
        ProposalOrchestrator::new(ledger.clone(), multisig, signer),
        MembershipResolver::new(ledger, multisig),
    ))
}

pub async fn handle_exit(
    mut sig_quit: Signal,
    mut sig_int: Signal,
    mut sig_term: Signal,
    finished_rx: tokio::sync::oneshot::Receiver<Option<String>>,
) -> anyhow::Result<()> {
    // handle exit routines
    tokio::select! {
        _ = sig_quit.recv() => {
            log::warn!("goodbye..");
            return Ok(());
        }
        _ = sig_int.recv() => {
            log::warn!("goodbye..");
            return Ok(());
        }
        _ = sig_term.recv() => {
            log::warn!("goodbye..");
            return Ok(());
        }
        msg = finished_rx => {
            match msg {
                // service encountered error
                Ok(Some(msg)) => return Err(anyhow::anyhow!(msg)),
                // service finished without error
                Ok(None) => return Ok(()),
                // underlying channel had an error
                Err(err) => return Err(anyhow::anyhow!(err))
            }
        }
    }
}
