use anyhow::Result;
use clap::Parser;
use distinta::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine; real environment variables still apply.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    cli.run().await
}
