//! # meshback CLI
//!
//! The command-line interface for meshback, the tiered backup and retention
//! rotation tool for the meshtracking deployment.
//!
//! ## Commands
//!
//! - **run**: Scheduled entry point - archive one tier, then rotate it
//! - **rotate**: Enforce a tier's keep count without creating a backup
//! - **status**: Report artifact counts against keep limits for all tiers
//!
//! ## Quick Start
//!
//! From cron, one line per tier:
//!
//! ```bash
//! meshback run daily
//! meshback run weekly
//! meshback run monthly
//! meshback run yearly
//! ```
//!
//! ## Environment Variables
//!
//! - `MESHBACK_SOURCE_DIR`: Project tree to snapshot (default: .)
//! - `MESHBACK_BACKUP_DIR`: Backup root directory (default: ./backups)
//! - `MESHBACK_PREFIX`: Archive name prefix (default: meshtracking)
//! - `MESHBACK_EXCLUDE`: Extra exclusion patterns, comma-separated
//! - `MESHBACK_VERBOSE` / `MESHBACK_QUIET`: Output control
//!
//! ## Exit Status
//!
//! Nonzero only for an unrecognized tier or a failed archive. Individual
//! deletion failures during rotation are logged and do not affect the exit
//! code; the next scheduled run retries them.

use std::io::IsTerminal;

use meshback::cli::Cli;

fn main() -> miette::Result<()> {
    // Install miette's fancy panic and error report handler
    miette::set_panic_hook();

    // Nicely formatted reports on a TTY, plain ones in cron mail and logs
    if std::io::stderr().is_terminal() {
        miette::set_hook(Box::new(|_| {
            Box::new(
                miette::GraphicalReportHandler::new()
                    .with_theme(miette::GraphicalTheme::unicode_nocolor())
                    .with_context_lines(3),
            )
        }))?;
    } else {
        miette::set_hook(Box::new(|_| {
            Box::new(
                miette::GraphicalReportHandler::new()
                    .with_theme(miette::GraphicalTheme::none())
                    .with_context_lines(0),
            )
        }))?;
    }

    let cli = Cli::parse_args();

    let result = meshback::commands::execute(&cli);

    result.map_err(Into::into)
}
