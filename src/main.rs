use anyhow::Result;
use relay::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}
