use anyhow::Result;
use clap::Parser;
use dirfill_whoamid::server::{self, ListenInfo};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "dirfill-whoamid",
    version,
    about = "Loopback whoami JSON service"
)]
struct Args {
    /// Address to bind.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 7777)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logging to stderr; stdout stays clean.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let listen = ListenInfo {
        host: args.host.clone(),
        port: args.port,
    };
    let app = server::router(listen);

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("whoami service listening on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
