//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → SubmitterConfig (validated, immutable)
//!     → Submitter::connect builds the session from it
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Secrets never live in the file; the signer key comes from the environment

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    FeeConfig, FeeSetting, LedgerConfig, ObservabilityConfig, RetryConfig, SignerConfig,
    SubmitterConfig,
};
