use std::path::Path;

use clap::Parser;
use cppfacts::cli::commands::extract::ExtractCommand;
use cppfacts::cli::commands::{dump, extract, init};
use cppfacts::cli::{Cli, Commands};
use cppfacts::config::Settings;
use cppfacts::io::ExitCode;
use cppfacts::logging;

fn load_settings(config: Option<&Path>) -> Result<Settings, Box<figment::Error>> {
    match config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
}

fn run(command: Commands, settings: &Settings) -> anyhow::Result<ExitCode> {
    match command {
        Commands::Extract {
            file,
            action,
            snapshot,
            output,
            compact,
            include_warnings,
            compile_args,
        } => extract::run(
            &ExtractCommand {
                file,
                action,
                snapshot,
                output,
                compact,
                include_warnings,
                compile_args,
            },
            settings,
        ),
        Commands::Dump {
            file,
            output,
            compact,
            compile_args,
        } => dump::run(&file, output.as_deref(), compact, &compile_args, settings),
        Commands::Init { force } => init::run_init(&std::env::current_dir()?, force),
        Commands::Config => init::run_config(settings),
    }
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let settings = match load_settings(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::UsageError.into();
        }
    };
    logging::init_with_config(&settings.logging);

    match run(cli.command, &settings) {
        Ok(code) => code.into(),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::UsageError.into()
        }
    }
}
