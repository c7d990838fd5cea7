use {
    luxhub_gov::{config::Config, services::gov_api::serve_api},
    tokio::signal::unix::{signal, SignalKind},
};

pub async fn serve(matches: &clap::ArgMatches, config_path: &str) -> anyhow::Result<()> {
    let listen_url = matches.get_one::<String>("listen-url").unwrap().clone();
    let cfg = Config::load(config_path).await?;

    let sig_quit = signal(SignalKind::quit())?;
    let sig_int = signal(SignalKind::interrupt())?;
    let sig_term = signal(SignalKind::terminate())?;
    let (finished_tx, finished_rx) = tokio::sync::oneshot::channel();

    tokio::task::spawn(async move {
        let res = serve_api(&listen_url, &cfg).await;
        let _ = finished_tx.send(res.err().map(|err| format!("{err:#?}")));
    });

    super::handle_exit(sig_quit, sig_int, sig_term, finished_rx).await
}
