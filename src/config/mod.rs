//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) or defaults
//!     → loader.rs (parse & deserialize, apply API_BASE override)
//!     → validation.rs (semantic checks)
//!     → ClientConfig (validated, immutable)
//!     → shared by value with ApiClient at startup
//! ```
//!
//! # Design Decisions
//! - One backend, one base URL; everything else is a tunable constant
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError, API_BASE_ENV};
pub use schema::ApiConfig;
pub use schema::BackoffConfig;
pub use schema::ClientConfig;
pub use schema::NavigationConfig;
pub use schema::ObservabilityConfig;
pub use validation::{validate_config, ValidationError};
