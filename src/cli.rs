//! Helpers shared by the command line binaries.

use crate::cli_style::print_error;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Resolves a path argument to an absolute path. Paths that do not exist yet
/// are joined to the current directory instead of being canonicalized.
pub fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let resolved = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => path_buf,
        Err(e) => return Err(e).with_context(|| format!("Error resolving path: {}", s)),
    };
    if resolved.is_absolute() {
        return Ok(resolved);
    }
    Ok(std::env::current_dir()?.join(resolved))
}

/// Installs the fmt subscriber, filtered by `LOG_LEVEL` (INFO when unset).
pub fn init_tracing() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;
    Ok(())
}

/// Prints the error chain once and maps the result to a process exit code.
pub fn exit_code(result: Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            print_error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}
