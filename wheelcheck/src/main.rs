mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use wheelcheck_core::observability;

fn main() -> Result<()> {
    wheelcheck_core::config::load_dotenv();
    observability::init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            source,
            out,
            sdist,
            installer,
            config_settings,
        } => {
            commands::build::cmd_build(&source, &out, sdist, installer, &config_settings)?;
        }
        Commands::Install {
            wheel,
            python,
            venv,
            overwrite,
        } => {
            commands::install::cmd_install(&wheel, python.as_deref(), venv.as_deref(), overwrite)?;
        }
        Commands::Venv {
            path,
            copies,
            with_pip,
        } => {
            commands::venv::cmd_venv(&path, copies, with_pip)?;
        }
        Commands::Verify {
            module,
            version,
            distribution,
            python,
            absent,
        } => {
            commands::verify::cmd_verify(
                &module,
                version.as_deref(),
                distribution.as_deref(),
                python.as_deref(),
                absent,
            )?;
        }
        Commands::Uninstall {
            distribution,
            python,
        } => {
            commands::uninstall::cmd_uninstall(&distribution, python.as_deref())?;
        }
        Commands::Scheme { python } => {
            commands::scheme::cmd_scheme(python.as_deref())?;
        }
        Commands::Check {
            source,
            module,
            version,
            distribution,
            python_target,
            teardown,
            installer,
            config_settings,
            run_scripts,
            keep,
        } => {
            commands::check::cmd_check(commands::check::CheckArgs {
                source,
                module,
                version,
                distribution,
                python_target,
                teardown,
                installer,
                config_settings,
                run_scripts,
                keep,
            })?;
        }
    }

    Ok(())
}
