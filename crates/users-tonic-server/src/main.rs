use clap::Parser;
use users_tonic_server::server::{
    config::{CliArgs, ServerConfig},
    lifecycle,
    telemetry::init_telemetry,
};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = ServerConfig::try_from(args)?;

    let providers = init_telemetry()?;

    let err = match lifecycle::run(config).await {
        Ok(never) => match never {},
        Err(err) => err,
    };

    tracing::error!("Fatal server error: {err:#}");
    providers.shutdown();
    Err(err)
}
