use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;

mod config;
mod download;
mod entry;
mod feed;
mod init;
mod pipeline;
mod publish;
mod run;
mod scheduler;
mod source;
mod stats;
mod store;
mod telemetry;
mod util;

#[cfg(test)]
mod testutil;

use config::Settings;

#[derive(Parser)]
#[command(name = "castfeed", about = "Republish video channels as podcast feeds")]
struct Cli {
    /// Feed configuration file
    #[arg(global = true, short, long, env = "CASTFEED_CONFIG", default_value = "castfeed.yml")]
    config: PathBuf,
    #[arg(global = true, short, long, env = "DATABASE_URL", hide_env_values = true)]
    dsn: Option<String>,
    /// Emit a single JSON envelope to stdout; logs go to stderr
    #[arg(global = true, long, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Run(run::RunCmd),
    Init(init::InitCmd),
    Feed(feed::FeedCmd),
    Stats(stats::StatsCmd),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    telemetry::config::set_json_mode(cli.json);

    // logs on stderr; RUST_LOG and CASTFEED_LOG_FORMAT apply
    telemetry::config::init_tracing();

    // the dsn is only required by commands that touch the database
    let dsn = cli.dsn.as_deref();
    match cli.command {
        Commands::Run(args) => run::run(&store::connect_lazy(dsn)?, &Settings::load(&cli.config)?, args).await?,
        Commands::Init(args) => init::run(&store::connect_lazy(dsn)?, args).await?,
        Commands::Feed(args) => feed::run(dsn, &Settings::load(&cli.config)?, args).await?,
        Commands::Stats(args) => stats::run(&store::connect_lazy(dsn)?, args).await?,
    }

    Ok(())
}
