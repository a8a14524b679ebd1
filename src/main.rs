use kalenteri::startup;
use tracing::info;

#[tokio::main(flavor = "current_thread")]
async fn main() -> miette::Result<()> {
    // Initialize logging
    startup::init_logging()?;

    info!("Starting kalenteri");

    // Load configuration
    let config = startup::load_config()?;

    // Start the client
    startup::start_client(config).await
}
