use clap::Parser;
use marquee_relay::{RelayArgs, cli};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = RelayArgs::parse();
    cli::run(args).await
}
