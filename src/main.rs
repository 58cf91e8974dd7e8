use anyhow::Result;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use gnu_elpa_mirror::cli::Cli;
use gnu_elpa_mirror::credentials::ACCESS_TOKEN_VAR;
use gnu_elpa_mirror::{AccessToken, Config, GitHubClient, Mirror, SystemRunner};

#[tokio::main]
async fn main() -> ExitCode {
    let (cli, ignored) = Cli::parse_lenient(std::env::args_os());

    match run(cli, ignored).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("gnu-elpa-mirror: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, ignored: Vec<String>) -> Result<()> {
    // Nothing touches the network or disk before the token is known
    let token = AccessToken::from_env(ACCESS_TOKEN_VAR)?;

    let config = load_config(cli.config.clone())?;
    init_logging(cli.verbose, &config);
    info!("Starting gnu-elpa-mirror v{}", env!("CARGO_PKG_VERSION"));

    if !ignored.is_empty() {
        warn!("Ignoring unrecognized arguments: {}", ignored.join(" "));
    }

    let hosting = Arc::new(GitHubClient::new(&token)?);
    let mirror = Mirror::new(
        config,
        token,
        Arc::new(SystemRunner),
        hosting,
        cli.options(),
    );

    let summary = mirror.run().await?;

    println!("\n🎉 Mirror Complete!");
    println!("   📦 Packages: {}", summary.packages.len());
    println!("   🆕 Repositories created: {}", summary.created_repositories.len());
    println!("   ✅ Packages updated: {}", summary.committed_packages.len());
    println!("   ⏭️  Packages unchanged: {}", summary.unchanged_packages);
    println!("   🚀 Repositories pushed: {}", summary.pushed_repositories);
    println!("   ⏱️  Duration: {:.2}s", summary.duration.as_secs_f64());

    if cli.skip_push {
        println!("\n📝 Note: --skip-push given, nothing was pushed");
    }

    Ok(())
}

/// Initialize logging to stderr; `RUST_LOG` overrides `--verbose` and the config
fn init_logging(verbose: bool, config: &Config) {
    let default_level = if verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(config.logging.color),
        )
        .with(filter)
        .init();
}

/// Load configuration from specified path or default location
fn load_config(config_path: Option<std::path::PathBuf>) -> Result<Config> {
    match config_path {
        Some(path) => Config::load(&path),
        None => Config::load_or_default(),
    }
}
