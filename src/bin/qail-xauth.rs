//! qail-xauth — MYSQL41 authentication toolbox
//!
//! # Usage
//!
//! ```bash
//! # Stored hash for an account table
//! qail-xauth hash 'password'
//!
//! # Client response for a given salt
//! qail-xauth scramble 'password' --salt 3132333435363738393031323334353637383930
//!
//! # Run a full handshake against configured accounts
//! qail-xauth check --user alice --password secret --config xauth.toml
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use qail_xauth::prelude::*;
use qail_xauth::scramble::{encode_password_hash, password_hash};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "qail-xauth")]
#[command(author = "QAIL Contributors")]
#[command(version)]
#[command(about = "🔐 MYSQL41 authentication toolbox", long_about = None)]
#[command(after_help = "EXAMPLES:
    qail-xauth hash 'password'
    qail-xauth scramble 'password' --salt 3132333435363738393031323334353637383930
    qail-xauth check --user alice --password secret --host 10.0.0.7")]
struct Cli {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    format: OutputFormat,

    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the stored `*HEX` hash of a password
    Hash {
        password: String,
    },
    /// Print the client response for a password and server salt
    Scramble {
        password: String,
        /// Server salt as hex
        #[arg(short, long)]
        salt: String,
    },
    /// Run an in-process handshake against the configured accounts
    Check {
        #[arg(short, long)]
        user: String,
        #[arg(short, long, default_value = "")]
        password: String,
        /// Default schema to request
        #[arg(short, long, default_value = "")]
        db: String,
        /// Client address presented to the server
        #[arg(long, default_value = "127.0.0.1:33060")]
        addr: String,
        /// Accounts file (defaults to the user config dir)
        #[arg(short, long, env = "QAIL_XAUTH_CONFIG")]
        config: Option<PathBuf>,
        /// Override the config's skip_auth policy
        #[arg(long)]
        skip_auth: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match &cli.command {
        Commands::Hash { password } => run_hash(password, cli.format),
        Commands::Scramble { password, salt } => run_scramble(password, salt, cli.format),
        Commands::Check {
            user,
            password,
            db,
            addr,
            config,
            skip_auth,
        } => run_check(user, password, db, addr, config.as_deref(), *skip_auth, cli.format),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_hash(password: &str, format: OutputFormat) -> Result<()> {
    let encoded = encode_password_hash(&password_hash(password.as_bytes()));
    match format {
        OutputFormat::Table => println!("{}", encoded.yellow()),
        OutputFormat::Json => println!("{}", json!({ "password": encoded })),
    }
    Ok(())
}

fn run_scramble(password: &str, salt: &str, format: OutputFormat) -> Result<()> {
    let salt = hex::decode(salt).context("salt must be hex")?;
    if salt.len() != SCRAMBLE_LENGTH {
        anyhow::bail!("salt must be {} bytes, got {}", SCRAMBLE_LENGTH, salt.len());
    }
    let response = encode_secret(password.as_bytes(), &salt);
    match format {
        OutputFormat::Table => {
            if response.is_empty() {
                println!("{}", "(empty password, empty response)".dimmed());
            } else {
                println!("{}", response.yellow());
            }
        }
        OutputFormat::Json => println!("{}", json!({ "response": response })),
    }
    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> Result<XAuthConfig> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match XAuthConfig::default_path() {
            Some(p) if p.exists() => p,
            _ => return Ok(XAuthConfig::default()),
        },
    };
    XAuthConfig::load(&path).with_context(|| format!("loading {}", path.display()))
}

fn run_check(
    user: &str,
    password: &str,
    db: &str,
    addr: &str,
    config: Option<&std::path::Path>,
    skip_auth: bool,
    format: OutputFormat,
) -> Result<()> {
    let config = load_config(config)?;
    let store = CredentialStore::from_config(&config)?;
    let peer = PeerContext::new(addr).with_skip_auth(skip_auth || config.skip_auth);

    let mut auth = qail_xauth::authenticator(store);
    let salt = match auth.handle_start(MECHANISM_NAME, b"") {
        AuthOutcome::Ongoing(salt) => salt,
        other => anyhow::bail!("unexpected start outcome: {:?}", other),
    };

    let mut reply = Vec::with_capacity(db.len() + user.len() + 43);
    reply.extend_from_slice(db.as_bytes());
    reply.push(0);
    reply.extend_from_slice(user.as_bytes());
    reply.push(0);
    reply.extend_from_slice(encode_secret(password.as_bytes(), &salt).as_bytes());

    let outcome = auth.handle_continue(&peer, &reply);

    match format {
        OutputFormat::Table => print_outcome(&outcome, user, addr),
        OutputFormat::Json => {
            let value = match &outcome {
                AuthOutcome::Succeeded(binding) => json!({
                    "status": "ok",
                    "user": binding.user,
                    "db": binding.dbname,
                }),
                other => {
                    let code = other.error_code();
                    json!({
                        "status": "error",
                        "code": code.map(|c| c.code()),
                        "sql_state": code.map(|c| c.sql_state()),
                        "message": code.map(|c| c.message()),
                    })
                }
            };
            println!("{}", value);
        }
    }

    if !outcome.is_success() {
        std::process::exit(2);
    }
    Ok(())
}

fn print_outcome(outcome: &AuthOutcome, user: &str, addr: &str) {
    match outcome {
        AuthOutcome::Succeeded(binding) => {
            println!("{} Authenticated {} from {}", "✓".green(), user.cyan(), addr);
            if !binding.dbname.is_empty() {
                println!("  {} {}", "Schema:".dimmed(), binding.dbname);
            }
        }
        other => {
            let text = other
                .error_code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| format!("{:?}", other));
            println!("{} {}", "✗".red(), text.red());
        }
    }
}
