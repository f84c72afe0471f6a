use clap::Parser;
use clap::Subcommand;
use crystalpath::config::AppConfig;
use crystalpath::database::Database;
use crystalpath::Result;
use tracing::info;

#[derive(Parser)]
#[command(name = "crystalpath")]
#[command(about = "BaZi fortune analysis and crystal recommendation API service")]
#[command(version)]
struct Cli {
    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema
    Init,
    /// Reset and seed the crystal catalog
    Seed,
    /// Start the API server
    Serve {
        /// Host to bind
        #[arg(long)]
        host: Option<String>,
        /// Port to bind
        #[arg(long)]
        port: Option<u16>,
        /// Disable CORS
        #[arg(long)]
        no_cors: bool,
    },
    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        crystalpath::logging::init_logging_with_level("debug")?;
    } else {
        crystalpath::logging::init_logging()?;
    }

    // Load configuration
    let config = AppConfig::load()?;
    info!("Configuration loaded successfully");

    match cli.command {
        Commands::Init => {
            let db = Database::from_config(&config).await?;
            db.init_schema().await?;
            println!("✅ Database schema initialized");
        }
        Commands::Seed => {
            let db = Database::from_config(&config).await?;
            db.init_schema().await?;
            let count = db.seed_crystals().await?;
            println!("✅ Seeded {count} crystals");
        }
        Commands::Serve {
            host,
            port,
            no_cors,
        } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            let enable_cors = if no_cors {
                false
            } else {
                config.server.enable_cors
            };

            crystalpath::api::serve_api(&config, host, port, enable_cors).await?;
        }
        Commands::Config => {
            println!("📋 CrystalPath Configuration:");
            println!();
            println!("🗄️  Database:");
            println!("  URL: {}", config.database_url());
            println!("  Max connections: {}", config.max_connections());
            println!("  Connection timeout: {}s", config.connection_timeout());
            println!();
            println!("📝 Logging:");
            println!("  Level: {}", config.logging.level);
            println!();
            println!("🌐 Server:");
            println!("  Host: {}", config.server.host);
            println!("  Port: {}", config.server.port);
            println!("  CORS: {}", config.server.enable_cors);
            println!("  Base URL: {}", config.server.base_url);
            println!("  Frontend URL: {}", config.server.frontend_url);
            println!();
            println!("🧠 Narrative LLM:");
            println!("  Endpoint: {}", config.llm_endpoint());
            println!("  Model: {}", config.llm_model());
            println!("  Timeout: {}s", config.llm.timeout_secs);
            println!();
            println!("💰 Payment gateway:");
            println!("  Gateway: {}", config.alipay.gateway);
            println!("  Enabled: {}", config.alipay.enabled);
        }
    }

    Ok(())
}
