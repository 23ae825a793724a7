use anyhow::Result;
use fracscraper::pipeline::{self, SOURCE_URL};
use reqwest::Client;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,fracscraper=info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    // ─── 2) fetch, classify, aggregate, write ────────────────────────
    // outputs land in the working directory, replacing earlier runs
    let client = Client::new();
    pipeline::run(&client, SOURCE_URL, Path::new(".")).await?;

    Ok(())
}
