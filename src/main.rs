use clap::Parser;
use llm_proxy_fixtures::{
    ChatServerConfig, chat,
    constants::{CHAT_COMPLETIONS_PATH, DEFAULT_CHAT_PORT},
    logging,
};
use tracing::info;

/// Mock OpenAI-style streaming server for exercising proxy streaming.
#[derive(Parser, Debug)]
#[command(name = "mock-openai-stream", version, about)]
struct Args {
    /// Port to listen on
    #[arg(default_value_t = DEFAULT_CHAT_PORT)]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init();

    let config = ChatServerConfig::new().with_port(args.port);
    let server = chat::start(&config).await?;

    let port = server.local_addr().port();
    info!("Endpoint: http://localhost:{port}{CHAT_COMPLETIONS_PATH}");
    info!(
        "Test with: curl -X POST http://localhost:{port}{CHAT_COMPLETIONS_PATH} \
         -H 'Content-Type: application/json' \
         -d '{{\"stream\": true, \"messages\": [{{\"role\": \"user\", \"content\": \"Hello\"}}]}}'"
    );
    info!("Press Ctrl+C to stop");

    server.run_until_signal().await
}
