use clap::Parser;

mod commands;

#[derive(Parser, Debug)]
#[command(
    name = "repograph",
    version,
    about = "Index mined git history into a queryable property graph"
)]
struct Cli {
    #[command(subcommand)]
    command: commands::Command,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,
}

/// Classify an error into an exit code.
///
/// Exit codes:
///   0 — success
///   1 — general/unknown error
///   2 — configuration or payload error
///   3 — project not found / not initialized
///   4 — database error
fn classify_exit_code(err: &anyhow::Error) -> i32 {
    let msg = format!("{err:#}");
    let lower = msg.to_lowercase();

    if lower.contains("not initialized") || lower.contains("cannot resolve path") {
        3 // project not found
    } else if lower.contains("config") || lower.contains("payload") {
        2 // config/payload error
    } else if lower.contains("database") || lower.contains("sqlite") {
        4 // database error
    } else {
        1 // general error
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    let filter = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (_, 0) => "warn",
        (_, 1) => "info",
        (_, 2) => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: Failed to create runtime: {e}");
            std::process::exit(1);
        }
    };

    match runtime.block_on(commands::run(cli.command)) {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(classify_exit_code(&e));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_code_not_initialized() {
        let err =
            anyhow::anyhow!("Repograph is not initialized in /foo. Run `repograph init` first.");
        assert_eq!(classify_exit_code(&err), 3);
    }

    #[test]
    fn exit_code_cannot_resolve() {
        let err = anyhow::anyhow!("Cannot resolve path: /nonexistent");
        assert_eq!(classify_exit_code(&err), 3);
    }

    #[test]
    fn exit_code_config() {
        let err = anyhow::anyhow!("Cannot parse config: bad toml");
        assert_eq!(classify_exit_code(&err), 2);
    }

    #[test]
    fn exit_code_payload() {
        let err = anyhow::anyhow!("Cannot parse payload: expected a map");
        assert_eq!(classify_exit_code(&err), 2);
    }

    #[test]
    fn exit_code_database() {
        let err = anyhow::anyhow!("Cannot open database: /foo/.repograph/repograph.db");
        assert_eq!(classify_exit_code(&err), 4);
    }

    #[test]
    fn exit_code_general() {
        let err = anyhow::anyhow!("Something unexpected happened");
        assert_eq!(classify_exit_code(&err), 1);
    }
}
