mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::output::{OutputFormat, print_error};

/// params - crash-safe key/value store shared across processes
#[derive(Parser)]
#[command(name = "params")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Output format
  #[arg(short, long, global = true, value_enum, default_value_t)]
  output: OutputFormat,

  #[command(flatten)]
  store: StoreArgs,

  #[command(subcommand)]
  command: Commands,
}

/// Which store to operate on.
#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
  /// Use the store at this path instead of the resolved default
  #[arg(long, global = true, conflicts_with = "persistent")]
  pub root: Option<PathBuf>,

  /// Use the persistent store
  #[arg(long, global = true)]
  pub persistent: bool,
}

#[derive(Subcommand)]
enum Commands {
  /// Print the value of a key
  Get {
    key: String,

    /// Wait until the key holds a non-empty value
    #[arg(long)]
    block: bool,

    /// Give up waiting after this long (e.g. "5s", "250ms")
    #[arg(long, requires = "block", value_parser = humantime::parse_duration)]
    timeout: Option<Duration>,
  },

  /// Store a value under a key
  Put {
    key: String,

    /// Value to store
    #[arg(required_unless_present = "stdin")]
    value: Option<String>,

    /// Read the value from standard input
    #[arg(long, conflicts_with = "value")]
    stdin: bool,
  },

  /// Print a key as a boolean ("1" is true)
  GetBool { key: String },

  /// Store a boolean as "1" or "0"
  PutBool {
    key: String,

    #[arg(action = ArgAction::Set)]
    value: bool,
  },

  /// Delete a key
  Remove { key: String },

  /// Print every key and value
  Dump,

  /// Show where the store lives
  Info,
}

fn main() -> ExitCode {
  let cli = Cli::parse();

  let filter = if cli.verbose {
    EnvFilter::new("debug")
  } else {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
  };
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let output = cli.output;
  let result = match cli.command {
    Commands::Get { key, block, timeout } => cmd::cmd_get(&cli.store, &key, block, timeout, output),
    Commands::Put { key, value, stdin } => cmd::cmd_put(&cli.store, &key, value, stdin, output),
    Commands::GetBool { key } => cmd::cmd_get_bool(&cli.store, &key, output),
    Commands::PutBool { key, value } => cmd::cmd_put_bool(&cli.store, &key, value, output),
    Commands::Remove { key } => cmd::cmd_remove(&cli.store, &key, output),
    Commands::Dump => cmd::cmd_dump(&cli.store, output),
    Commands::Info => cmd::cmd_info(&cli.store, output),
  };

  match result {
    Ok(code) => code,
    Err(err) => {
      print_error(&format!("{:#}", err));
      ExitCode::FAILURE
    }
  }
}
