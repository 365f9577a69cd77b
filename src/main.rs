use clap::Parser;
use clap::Subcommand;
use ragchat::config::AppConfig;
use ragchat::Result;
use tracing::info;

#[derive(Parser)]
#[command(name = "ragchat")]
#[command(about = "Conversational RAG API service with bounded chat history")]
#[command(version)]
struct Cli {
    /// Path to the configuration file (defaults to config.toml)
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Host to bind (overrides the config file)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides the config file)
        #[arg(short, long)]
        port: Option<u16>,
        /// Disable permissive CORS
        #[arg(long)]
        no_cors: bool,
    },
    /// Validate the configuration file and print the resolved values
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::load()?,
    };

    match cli.command {
        Commands::Serve {
            host,
            port,
            no_cors,
        } => {
            ragchat::logging::init_logging_with_config(Some(&config))?;

            if config.verbose() {
                info!("Chat model: {}", config.llm_model());
                info!("Embedding model: {}", config.embedding_model());
                info!(
                    "Vector store collection: {} (top_k = {})",
                    config.collection(),
                    config.top_k()
                );
            }

            let host = host.unwrap_or_else(|| config.api_host().to_string());
            let port = port.unwrap_or_else(|| config.api_port());

            ragchat::api::serve_api(&config, host, port, !no_cors).await
        }
        Commands::CheckConfig => {
            println!("Configuration OK");
            println!("  API:          {}:{}", config.api_host(), config.api_port());
            println!("  Chat model:   {} @ {}", config.llm_model(), config.llm_endpoint());
            println!(
                "  Embeddings:   {} ({} dims) @ {}",
                config.embedding_model(),
                config.embedding_dimension(),
                config.embedding_endpoint()
            );
            println!(
                "  Vector store: collection '{}', top_k {}",
                config.collection(),
                config.top_k()
            );
            println!("  Chat history: {} messages max per conversation", config.conv_max_msgs());
            Ok(())
        }
    }
}
