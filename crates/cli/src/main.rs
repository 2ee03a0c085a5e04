mod config;
mod error;
mod model;

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use codec::{Capabilities, ErrorMessage};
use policy::PrincipalResolver;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use config::Config;
use error::{Error, Result};
use model::Account;

const CONFIG_FILE: &str = "scope.toml";
const LOG_ENV: &str = "SCOPE_LOG";

#[derive(Parser)]
#[command(name = "scope")]
#[command(about = "Read and write records through a caller's rights", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file with the principal table
    #[arg(short, long, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Session token of the caller; omit for an anonymous request
    #[arg(short, long, env = "SCOPE_TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the caller's identity and rights
    Whoami,
    /// Print a stored account as the caller may see it
    View {
        /// Stored account (JSON)
        record: PathBuf,
    },
    /// Apply a request body to a stored account and print the result
    Apply {
        /// Stored account (JSON)
        record: PathBuf,
        /// Request body; read from stdin when omitted
        #[arg(short, long)]
        body: Option<PathBuf>,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(e.exit_code());
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load_or_default(&cli.config)?;
    init_logging(&config);

    let capabilities = resolve(&config, cli.token.as_deref())?;
    debug!(
        authenticated = capabilities.is_authenticated(),
        user_id = capabilities.user_id(),
        "request capabilities"
    );

    match cli.command {
        Commands::Whoami => cmd_whoami(&capabilities),
        Commands::View { record } => cmd_view(&record, &capabilities),
        Commands::Apply { record, body } => cmd_apply(&record, body.as_deref(), &capabilities),
    }
}

fn init_logging(config: &Config) {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(&config.log.filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn resolve(config: &Config, token: Option<&str>) -> Result<Capabilities> {
    let principal = match token {
        Some(token) => config.principals.resolve(token)?,
        None => None,
    };
    Ok(Capabilities::from(principal))
}

fn cmd_whoami(capabilities: &Capabilities) -> Result<()> {
    match capabilities.principal() {
        Some(principal) => {
            println!("{} (user {})", principal.username, principal.user_id);
            if principal.rights.is_empty() {
                println!("rights: none");
            } else {
                println!("rights: {}", principal.rights.join(", "));
            }
        }
        None => println!("anonymous"),
    }
    Ok(())
}

fn cmd_view(record: &Path, capabilities: &Capabilities) -> Result<()> {
    let account = load_record(record)?;
    respond(codec::to_vec(&account, capabilities), capabilities)
}

fn cmd_apply(record: &Path, body: Option<&Path>, capabilities: &Capabilities) -> Result<()> {
    let mut account = load_record(record)?;

    let bytes = match body {
        Some(path) => std::fs::read(path)?,
        None => {
            let mut buf = Vec::new();
            io::stdin().read_to_end(&mut buf)?;
            buf
        }
    };

    if let Err(e) = codec::read_into(&mut account, &bytes, capabilities) {
        return fail(&e, capabilities);
    }
    respond(codec::to_vec(&account, capabilities), capabilities)
}

fn respond(result: codec::Result<Vec<u8>>, capabilities: &Capabilities) -> Result<()> {
    match result {
        Ok(bytes) => {
            let mut out = io::stdout().lock();
            out.write_all(&bytes)?;
            writeln!(out)?;
            Ok(())
        }
        Err(e) => fail(&e, capabilities),
    }
}

/// Write the error body the caller is allowed to see, then fail with its status.
fn fail(error: &codec::Error, capabilities: &Capabilities) -> Result<()> {
    let message = ErrorMessage::for_caller(error, capabilities);
    let body = serde_json::to_string(&message).map_err(codec::Error::Encode)?;
    println!("{body}");
    Err(Error::Status {
        status: message.status,
    })
}

fn load_record(path: &Path) -> Result<Account> {
    if !path.exists() {
        return Err(Error::RecordNotFound {
            path: path.to_path_buf(),
        });
    }
    let bytes = std::fs::read(path)?;
    Ok(codec::read_unsafe(&bytes)?)
}
