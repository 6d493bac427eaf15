use clap::Parser;
use env_logger::Env;
use sam_error_metrics::{cli, commands};

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = cli::Args::parse();

    let result = match args.command {
        cli::Commands::Collect(collect) => commands::error_metrics::run(collect),
        cli::Commands::Covariates => commands::covariates::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
