//! nodectl CLI Binary
//!
//! Command-line client for a running node agent.

use anyhow::Context;
use clap::error::ErrorKind;
use clap::Parser;
use nodectl::cli::{report_error, write_output, Cli, RunContext};
use nodectl::config::{ConfigLoader, ConfigOverrides};
use nodectl::error::ExitCode;
use nodectl::logging::init_logging;
use nodectl::render::OutputFormat;
use std::process;
use tracing::{error, info};

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::Ok,
                _ => ExitCode::Usage,
            };
            let _ = e.print();
            process::exit(code.code());
        }
    };

    match run(&cli) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("{:#}", e);
            process::exit(ExitCode::Unknown.code());
        }
    }
}

/// Run the parsed command. `Err` is reserved for failures outside the
/// command's own error taxonomy.
fn run(cli: &Cli) -> anyhow::Result<i32> {
    let overrides = build_overrides(cli);
    let config = match ConfigLoader::load(cli.global.config.as_deref(), &overrides) {
        Ok(config) => config,
        Err(e) => {
            let format = cli.global.format.unwrap_or_default();
            return Ok(report_error(&e, format, &mut std::io::stderr()));
        }
    };

    init_logging(&config.logging).context("Failed to initialize logging")?;
    info!("nodectl starting");

    let format = config.format;
    let context = match RunContext::new(config, &cli.global) {
        Ok(context) => context,
        Err(e) => return Ok(fail(&e, format)),
    };

    match context.execute(&cli.command) {
        Ok(output) => {
            info!("Command completed successfully");
            write_output(&mut std::io::stdout().lock(), &output)
                .context("Failed to write command output")?;
            Ok(ExitCode::Ok.code())
        }
        Err(e) => Ok(fail(&e, format)),
    }
}

fn fail(e: &nodectl::error::CliError, format: OutputFormat) -> i32 {
    error!(error = %e, "Command failed");
    report_error(e, format, &mut std::io::stderr().lock())
}

/// Command-line values layered over the config files.
fn build_overrides(cli: &Cli) -> ConfigOverrides {
    ConfigOverrides {
        node_path: cli.global.node_path.clone(),
        format: cli.global.format,
        verbose: cli.global.verbose,
        log_level: cli.global.log_level.clone(),
        log_format: cli.global.log_format.clone(),
        log_output: cli.global.log_output.clone(),
        log_file: cli.global.log_file.clone(),
    }
}
