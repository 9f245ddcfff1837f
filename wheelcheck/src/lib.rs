//! Build, install and verify a Python distribution end to end.
//!
//! A run builds the source tree into a wheel through its PEP 517 backend,
//! installs the wheel into a target interpreter or a freshly provisioned
//! virtual environment, checks the package imports with the expected version,
//! and tears the installation down again.

pub mod harness;
pub mod target;
pub mod verify;

pub use harness::{Harness, HarnessError, HarnessOptions, RunReport, TeardownMode, TeardownReport};
pub use target::{TargetEnvironment, TargetKind};
pub use verify::{ImportProbe, Verifier, VerifyError};
