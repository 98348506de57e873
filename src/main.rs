use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use hrsync::config::Config;
use hrsync::db;
use hrsync::task::{ImportJob, LocalDirSource};

/// Value following `flag`, if any
fn arg_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .skip_while(|arg| arg.as_str() != flag)
        .nth(1)
        .map(|s| s.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    if args.iter().any(|arg| arg == "-help" || arg == "--help") {
        println!("Usage: hrsync [OPTIONS]");
        println!("Options:");
        println!("  -config <path>  Path to configuration file (default: ./etc/hrsync.toml)");
        println!("  -once           Import pending files once and exit");
        println!("  -file <path>    Import a single file and exit");
        println!("  -help, --help   Print this help message");
        return Ok(());
    }

    let config_path =
        arg_value(&args, "-config").unwrap_or_else(|| "./etc/hrsync.toml".to_string());
    let run_once = args.iter().any(|arg| arg == "-once");
    let single_file = arg_value(&args, "-file").map(PathBuf::from);

    // Load configuration first (before logging init)
    let config = Config::load(&config_path).unwrap_or_else(|e| {
        eprintln!("Could not load config file: {}, using defaults", e);
        Config::default()
    });

    // Initialize logging
    // Priority: RUST_LOG env var > config file > default "info"
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log.level));

    fmt::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    info!("Starting hrsync...");
    info!("Loading configuration from: {}", config_path);

    let db_conn = db::init_database(&config.database).await.map_err(|e| {
        tracing::error!("Database initialization failed: {}", e);
        anyhow::anyhow!("Database initialization failed: {}", e)
    })?;

    let config = Arc::new(config);
    let job = ImportJob::new(db_conn, config.clone());

    if let Some(path) = single_file {
        let summary = job.process_file(&path).await?;
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let source = LocalDirSource::new(&config.import.local_path, &config.import.file_extension);

    if run_once {
        let summaries = job.run_once(&source).await?;
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    tokio::select! {
        _ = job.run(&source) => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received, stopping scheduler");
        }
    }

    Ok(())
}
