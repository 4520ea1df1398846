use clap::Parser;
use reddit_cli::cli::{self, Config};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let config = Config::parse();
    env_logger::Builder::new()
        .filter_level(config.verbosity().log_level_filter())
        .init();

    if let Err(err) = cli::run(config).await {
        cli::die(err.exit_code(), &err.to_string());
    }
}
