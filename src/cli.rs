use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "webpforge")]
#[command(author, version, about = "Batch image to WebP conversion service")]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the conversion server
    Start {
        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Print the effective environment-derived configuration
    Validate,

    /// Display version information
    Version,
}
