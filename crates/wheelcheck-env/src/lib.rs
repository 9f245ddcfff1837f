//! Python environments for building and installing distributions.
//!
//! Environments are explicit values: an [`Interpreter`] handle plus the
//! [`Scheme`](wheelcheck_core::Scheme) it installs into. Nothing here mutates
//! ambient interpreter state.

pub mod command;
pub mod error;
pub mod installer;
pub mod interpreter;
pub mod isolated;
pub mod venv;

pub use error::{EnvError, Result};
pub use installer::{installer_for, PackageInstaller, PipInstaller, UvInstaller};
pub use interpreter::{Interpreter, InterpreterInfo};
pub use isolated::IsolatedEnv;
pub use venv::{VenvOptions, VirtualEnv};
