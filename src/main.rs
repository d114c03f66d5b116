use std::sync::Arc;

use clap::Parser;

use ai_chatbot_lib::config::{self, UpstreamConfig};
use ai_chatbot_lib::mediator::ChatMediator;
use ai_chatbot_lib::server::{self, ServerAppState};
use ai_chatbot_lib::upstream::GroqClient;

/// AI chatbot backend: proxies chat messages to the Groq LLM API and serves
/// rule-based fallback replies when the API is unavailable
#[derive(Parser, Debug)]
#[command(name = "ai-chatbot-server")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Port to bind the server to
    #[arg(long, default_value = "5000", env = "PORT")]
    port: u16,

    /// Address to bind the server to
    #[arg(long, default_value = "0.0.0.0")]
    bind: String,

    /// Groq API key; without one the server starts in fallback-only mode
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Groq chat-completions endpoint URL
    #[arg(long, env = "GROQ_API_URL", default_value = config::DEFAULT_API_URL)]
    api_url: String,

    /// Upstream request timeout in seconds
    #[arg(long, default_value = "30", env = "GROQ_TIMEOUT_SECS")]
    timeout_secs: u64,

    /// Include error details in internal-error responses (development only)
    #[arg(long)]
    dev: bool,

    /// Restrict CORS to these origins; repeatable (default: allow any)
    #[arg(long = "cors-origin")]
    cors_origins: Vec<String>,
}

fn main() {
    // Load .env before clap resolves env-backed arguments
    dotenvy::dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();

    let upstream_config = UpstreamConfig::new(cli.api_url, cli.api_key, cli.timeout_secs);

    let mediator = if upstream_config.has_api_key() {
        match GroqClient::new(&upstream_config) {
            Ok(client) => {
                log::info!("Groq API key configured - AI responses enabled");
                ChatMediator::new(Arc::new(client))
            }
            Err(e) => {
                log::warn!(
                    "Failed to build Groq client ({}); serving fallback responses only",
                    e
                );
                ChatMediator::without_upstream()
            }
        }
    } else {
        log::warn!("GROQ_API_KEY not configured");
        log::warn!("The chatbot will serve fallback responses until a key is provided");
        ChatMediator::without_upstream()
    };

    let state = ServerAppState::new(mediator, cli.dev);
    let cors_origins = if cli.cors_origins.is_empty() {
        None
    } else {
        Some(cli.cors_origins)
    };

    // Create the tokio runtime
    let rt = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");

    if let Err(e) = rt.block_on(server::run_server(cli.port, &cli.bind, state, cors_origins)) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
