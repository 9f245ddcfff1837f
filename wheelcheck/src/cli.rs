use std::path::PathBuf;

use clap::{Parser, Subcommand};
use wheelcheck::TeardownMode;
use wheelcheck_core::InstallerKind;

/// wheelcheck - build, install and verify Python distributions
#[derive(Parser, Debug)]
#[command(name = "wheelcheck")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a wheel (or sdist) from a source tree in an isolated environment
    Build {
        /// Source tree containing pyproject.toml or setup.py
        #[arg(value_name = "SRC")]
        source: PathBuf,

        /// Output directory (created if missing)
        #[arg(long, value_name = "DIR", default_value = "dist")]
        out: PathBuf,

        /// Build a source distribution instead of a wheel
        #[arg(long)]
        sdist: bool,

        /// Installer for build requirements: uv or pip (default: from env or uv)
        #[arg(long)]
        installer: Option<InstallerKind>,

        /// Backend config setting, repeatable
        #[arg(short = 'C', long = "config-setting", value_name = "KEY=VALUE")]
        config_settings: Vec<String>,
    },

    /// Install a wheel into an interpreter or virtual environment
    Install {
        /// Wheel file
        #[arg(value_name = "WHEEL")]
        wheel: PathBuf,

        /// Target interpreter (default: discovered base interpreter)
        #[arg(long, value_name = "PY", conflicts_with = "venv")]
        python: Option<PathBuf>,

        /// Target virtual environment directory
        #[arg(long, value_name = "DIR")]
        venv: Option<PathBuf>,

        /// Replace files that already exist
        #[arg(long)]
        overwrite: bool,
    },

    /// Create a virtual environment
    Venv {
        #[arg(value_name = "PATH")]
        path: PathBuf,

        /// Copy interpreter binaries instead of symlinking them
        #[arg(long)]
        copies: bool,

        /// Seed pip into the environment
        #[arg(long)]
        with_pip: bool,
    },

    /// Check a module imports with the expected distribution version
    Verify {
        /// Import name
        #[arg(value_name = "MODULE")]
        module: String,

        /// Expected distribution version
        #[arg(long, required_unless_present = "absent")]
        version: Option<String>,

        /// Distribution name (default: the module name)
        #[arg(long = "dist", value_name = "NAME")]
        distribution: Option<String>,

        /// Interpreter to check in
        #[arg(long, value_name = "PY")]
        python: Option<PathBuf>,

        /// Require the module NOT to be importable
        #[arg(long)]
        absent: bool,
    },

    /// Remove an installed distribution using its RECORD
    Uninstall {
        #[arg(value_name = "DIST")]
        distribution: String,

        #[arg(long, value_name = "PY")]
        python: Option<PathBuf>,
    },

    /// Print an interpreter's install scheme as JSON
    Scheme {
        #[arg(long, value_name = "PY")]
        python: Option<PathBuf>,
    },

    /// Build, install, verify and tear down in one run
    Check {
        #[arg(value_name = "SRC")]
        source: PathBuf,

        /// Import name to check
        #[arg(long)]
        module: String,

        /// Expected distribution version
        #[arg(long)]
        version: String,

        /// Distribution name (default: from the built metadata)
        #[arg(long = "dist", value_name = "NAME")]
        distribution: Option<String>,

        /// Install into this interpreter instead of a disposable venv.
        /// The interpreter's site-packages is modified and restored by teardown.
        #[arg(long, value_name = "PY")]
        python_target: Option<PathBuf>,

        /// Teardown for --python-target: installer or record
        #[arg(long, default_value = "installer")]
        teardown: TeardownMode,

        /// Installer for build requirements and teardown: uv or pip (default: from env or uv)
        #[arg(long)]
        installer: Option<InstallerKind>,

        /// Backend config setting, repeatable
        #[arg(short = 'C', long = "config-setting", value_name = "KEY=VALUE")]
        config_settings: Vec<String>,

        /// Run each installed console script once
        #[arg(long)]
        run_scripts: bool,

        /// Keep the run directory (also WHEELCHECK_KEEP_WORKDIR)
        #[arg(long)]
        keep: bool,
    },
}
