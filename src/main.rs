mod cli;
mod commands;
mod config;
mod datasource;
mod progress;
mod provider;
mod resource;
#[cfg(test)]
mod testing;
mod ui;

use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use config::ProviderBlock;
use std::io;
use std::process::ExitCode;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    /// `--host` / `--token` given on the command line
    pub provider_flags: ProviderBlock,
    /// Explicit desired-state file
    pub file: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        provider_flags: cli.provider_flags(),
        file: cli.file.clone(),
    };

    let result = match cli.command {
        Command::Site => commands::site::run(&ctx),
        Command::Strategies { key } => commands::strategies::run(&ctx, key.as_deref()),
        Command::Group(cmd) => commands::group::run(&ctx, cmd),
        Command::Plan(args) => commands::declarative::plan(&ctx, args.target.as_deref()),
        Command::Apply(args) => commands::declarative::apply(&ctx, &args),
        Command::Destroy(args) => commands::declarative::destroy(&ctx, &args),
        Command::Completions { shell } => {
            generate(shell, &mut Cli::command(), "wikijs-sync", &mut io::stdout());
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err);
            ExitCode::FAILURE
        }
    }
}

/// Print an error with the category advice when it came from the client
fn report_error(err: &anyhow::Error) {
    ui::error(&format!("{err:#}"));

    if let Some(category) = err
        .chain()
        .find_map(|e| e.downcast_ref::<wikijs::Error>())
        .map(wikijs::Error::category)
    {
        eprintln!("  {} {}", category.description(), category.advice());
    }
}
