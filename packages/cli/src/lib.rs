//! # memoires-cli
//!
//! Command-line front end for the thesis catalogue.
//!
//! Every subcommand prints JSON on stdout; logs go to stderr.
//!
//! ## Usage
//!
//! ```bash
//! # Dashboard numbers
//! memoires stats
//!
//! # Five newest theses of track 2
//! memoires list --filiere 2 --recent
//!
//! # Upload, checked against the PDF rules first
//! memoires upload --file rapport.pdf --field titre="Pont mixte" --field annee=2025
//!
//! # Raw authenticated call
//! MEMOIRES_COOKIE="sessionid=...; csrftoken=..." \
//!     memoires request PATCH /tracks/1/ --data '{"icon": "fas fa-code"}'
//! ```

pub mod args;
pub mod commands;
pub mod error;

use tracing_subscriber::{fmt, EnvFilter};

pub use args::{Args, Command};
pub use commands::{execute, Context};
pub use error::CliError;

/// Install the stderr subscriber. `RUST_LOG` wins over `verbose`.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Run one invocation and print its result.
pub async fn run(args: Args) -> Result<(), CliError> {
    let ctx = Context::from_args(&args)?;
    let output = execute(args.command, &ctx).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
