mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use webpforge::config::Config;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "webpforge=trace,tower_http=debug".to_string()
        } else {
            "webpforge=debug,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let mut config = Config::from_env();

            // Override host/port from CLI if specified
            config.server.host = host;
            config.server.port = port;

            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(webpforge::server::start_server(config))?;
            Ok(())
        }
        Commands::Validate => {
            let config = Config::from_env();
            println!("Effective configuration:");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Max files per request: {}", config.limits.max_files);
            println!(
                "  Max bytes per file: {}",
                config.limits.max_file_size_bytes
            );
            println!("  Default quality: {}", config.conversion.default_quality);
            println!("  Default effort: {}", config.conversion.default_effort);
            println!("  Concurrency: {}", config.conversion.concurrency);

            let warnings = config.validate();
            if warnings.is_empty() {
                println!("✓ Configuration is valid");
            } else {
                for warning in warnings {
                    println!("  warning: {warning}");
                }
            }
            Ok(())
        }
        Commands::Version => {
            println!("webpforge {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
