pub mod commands;

use {
    anyhow::{anyhow, Result},
    clap::{value_parser, Arg, ArgMatches, Command},
    luxhub_gov::utils::init_log,
};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("luxhub_gov")
        .about("luxhub multisig governance client")
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .help("log verbosity to use")
                .default_value("info"),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .help("optionally output logs to this file")
                .default_value(""),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .default_value("config.yaml"),
        )
        .subcommands(vec![
            Command::new("new-config"),
            Command::new("proposal")
                .about("proposal lifecycle commands")
                .subcommands(vec![
                    Command::new("create")
                        .about("create a proposal wrapping a program instruction")
                        .arg(
                            Arg::new("program-id")
                                .long("program-id")
                                .help("program the wrapped instruction targets")
                                .required(true),
                        )
                        .arg(
                            Arg::new("account")
                                .long("account")
                                .help("wrapped instruction account as <address>[:flags], flags from {s, w}")
                                .action(clap::ArgAction::Append),
                        )
                        .arg(
                            Arg::new("payload-b64")
                                .long("payload-b64")
                                .help("base64 encoded instruction payload")
                                .required(true),
                        )
                        .arg(vault_index_flag())
                        .arg(
                            Arg::new("index")
                                .long("index")
                                .help("explicit transaction index to use")
                                .value_parser(value_parser!(u64))
                                .required(false),
                        ),
                    Command::new("vote")
                        .about("approve or reject a proposal")
                        .arg(index_flag())
                        .arg(
                            Arg::new("action")
                                .long("action")
                                .help("one of approve|reject")
                                .required(true),
                        ),
                    Command::new("execute")
                        .about("execute an approved proposal")
                        .arg(index_flag())
                        .arg(vault_index_flag()),
                    Command::new("cancel")
                        .about("cancel an in-flight proposal")
                        .arg(index_flag()),
                    Command::new("status")
                        .about("show a proposal's normalized status and vote counts")
                        .arg(index_flag()),
                    Command::new("list")
                        .about("list recent proposals, newest first")
                        .arg(
                            Arg::new("status")
                                .long("status")
                                .help("filter by status, 'pending' matches active and approved")
                                .required(false),
                        )
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .help("max number of proposals to return")
                                .value_parser(value_parser!(usize))
                                .required(false),
                        ),
                ]),
            Command::new("member")
                .about("multisig membership commands")
                .subcommands(vec![
                    Command::new("check")
                        .about("check whether a wallet is a multisig member")
                        .arg(
                            Arg::new("wallet")
                                .long("wallet")
                                .help("wallet address to check")
                                .required(true),
                        ),
                    Command::new("list")
                        .about("list members and derived vaults")
                        .arg(
                            Arg::new("vault-count")
                                .long("vault-count")
                                .help("how many vault addresses to derive")
                                .value_parser(value_parser!(u8))
                                .required(false),
                        ),
                ]),
            Command::new("services")
                .about("service management commands")
                .subcommands(vec![Command::new("api")
                    .about("starts the governance http api")
                    .arg(
                        Arg::new("listen-url")
                            .long("listen-url")
                            .help("url to expose the api on")
                            .default_value("127.0.0.1:3000"),
                    )]),
        ])
        .get_matches();

    let config_path = matches.get_one::<String>("config").unwrap();
    let log_level = matches.get_one::<String>("log-level").unwrap();
    let log_file = matches.get_one::<String>("log-file").unwrap();
    // only preserve logs from the single most recent execution
    if let Ok(exists) = tokio::fs::try_exists(log_file).await {
        if exists {
            if let Err(err) = tokio::fs::rename(log_file, format!("{log_file}.old")).await {
                log::error!("failed to rotate log file {err:#?}");
            }
        }
    }
    init_log(log_level, log_file);

    process_matches(&matches, config_path).await
}

async fn process_matches(matches: &ArgMatches, config_path: &str) -> anyhow::Result<()> {
    match matches.subcommand() {
        Some(("new-config", _)) => commands::config::new_config(config_path).await,
        Some(("proposal", p)) => match p.subcommand() {
            Some(("create", c)) => commands::proposal::create(c, config_path).await,
            Some(("vote", v)) => commands::proposal::vote(v, config_path).await,
            Some(("execute", e)) => commands::proposal::execute(e, config_path).await,
            Some(("cancel", c)) => commands::proposal::cancel(c, config_path).await,
            Some(("status", s)) => commands::proposal::status(s, config_path).await,
            Some(("list", l)) => commands::proposal::list(l, config_path).await,
            _ => Err(anyhow!("invalid subcommand")),
        },
        Some(("member", m)) => match m.subcommand() {
            Some(("check", c)) => commands::members::check(c, config_path).await,
            Some(("list", l)) => commands::members::list(l, config_path).await,
            _ => Err(anyhow!("invalid subcommand")),
        },
        Some(("services", s)) => match s.subcommand() {
            Some(("api", a)) => commands::api::serve(a, config_path).await,
            _ => Err(anyhow!("invalid subcommand")),
        },
        _ => Err(anyhow!("invalid subcommand")),
    }
}

fn index_flag() -> Arg {
    Arg::new("index")
        .long("index")
        .help("proposal transaction index")
        .value_parser(value_parser!(u64))
        .required(true)
}

fn vault_index_flag() -> Arg {
    Arg::new("vault-index")
        .long("vault-index")
        .help("vault to act as signing authority")
        .value_parser(value_parser!(u8))
        .required(false)
}
