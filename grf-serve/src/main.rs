//! Binary entry point.

use tracing::error;
use tracing_subscriber::EnvFilter;

use grf_serve::{Server, ServerConfig};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_args();

    let server = match Server::new(config) {
        Ok(server) => server,
        Err(e) => {
            error!("startup failed: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run().await {
        error!("server failed: {e}");
        std::process::exit(1);
    }
}
