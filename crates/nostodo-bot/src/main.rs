use std::path::PathBuf;

use clap::{Parser, Subcommand};
use nostr_sdk::prelude::ToBech32;

use nostodo_bot::cli::run_bot;
use nostodo_core::config::Credentials;
use nostodo_core::tracing_setup::init_tracing;
use nostodo_core::{BotConfig, SigningIdentity};

#[derive(Parser)]
#[command(name = "nostodo-bot")]
#[command(about = "A TODO list bot that lives on Nostr relays")]
struct Cli {
    /// Path to JSON config file (contains credentials, relays, alias)
    #[arg(long, short = 'c', env = "NOSTODO_CONFIG")]
    config: Option<PathBuf>,

    /// Bot secret key (nsec, hex, or ncryptsec); overrides the config file
    #[arg(long, env = "NOSTODO_NSEC", hide_env_values = true)]
    nsec: Option<String>,

    /// Password for an ncryptsec key
    #[arg(long, env = "NOSTODO_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to relays and answer mentions (default)
    Run {
        /// Relay URL (can be specified multiple times; replaces configured relays)
        #[arg(long, short = 'r')]
        relay: Vec<String>,

        /// SQLite database path
        #[arg(long)]
        database: Option<PathBuf>,

        /// Address for the HTTP view
        #[arg(long)]
        http_bind: Option<String>,

        /// Do not start the HTTP view
        #[arg(long)]
        no_http: bool,
    },

    /// Generate a fresh key pair and print it
    Keygen,

    /// Print the bot's npub
    Whoami,
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let mut config = load_config(&cli);

    if let Some(key) = cli.nsec {
        config.credentials = Some(Credentials {
            key,
            password: cli.password,
        });
    } else if let (Some(creds), Some(password)) = (config.credentials.as_mut(), cli.password) {
        creds.password = Some(password);
    }

    match cli.command.unwrap_or(Commands::Run {
        relay: Vec::new(),
        database: None,
        http_bind: None,
        no_http: false,
    }) {
        Commands::Run {
            relay,
            database,
            http_bind,
            no_http,
        } => {
            if !relay.is_empty() {
                config.relays = relay;
            }
            if database.is_some() {
                config.database_path = database;
            }
            if let Some(bind) = http_bind {
                config.http_bind = bind;
            }
            let serve_http = !no_http && !config.http_bind.is_empty();

            if let Err(e) = run_bot(config, serve_http) {
                eprintln!("Bot error: {:#}", e);
                std::process::exit(1);
            }
        }
        Commands::Keygen => {
            let identity = SigningIdentity::generate();
            let nsec = identity
                .keys()
                .secret_key()
                .to_bech32()
                .unwrap_or_else(|_| identity.keys().secret_key().to_secret_hex());
            println!("nsec: {}", nsec);
            println!("npub: {}", identity.npub());
        }
        Commands::Whoami => match config.identity() {
            Ok(identity) => println!("{}", identity.npub()),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
    }
}

/// Load configuration from file, falling back to defaults
fn load_config(cli: &Cli) -> BotConfig {
    match cli.config {
        Some(ref path) => match BotConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
        None => BotConfig::default(),
    }
}
