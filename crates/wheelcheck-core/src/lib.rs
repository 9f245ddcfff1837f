pub mod config;
pub mod core_metadata;
pub mod name;
pub mod observability;
pub mod scheme;
pub mod types;

pub use scheme::{Category, Scheme};
pub use types::{ConfigSettings, DistributionKind, InstallerKind};
