//! Error handling module for clusterm.
//!
//! Errors fall into a few families:
//! - History persistence failures, which callers recover from locally
//! - Live resource fetch failures, which only ever reach the log
//! - Configuration problems surfaced at startup
//!
//! Validation problems are not errors; see [`crate::repl::Validation`].
//!
//! # Example
//!
//! ```rust
//! use clusterm::error::{ClustermError, ConfigError, Result};
//!
//! fn check_ttl(ttl: u64) -> Result<()> {
//!     if ttl == 0 {
//!         return Err(ConfigError::InvalidValue {
//!             field: "cache.ttl_secs".to_string(),
//!             value: ttl.to_string(),
//!         }
//!         .into());
//!     }
//!     Ok(())
//! }
//!
//! assert!(matches!(check_ttl(0), Err(ClustermError::Config(_))));
//! ```

pub mod kinds;

// Re-export commonly used types
pub use kinds::{ClustermError, ConfigError, FetchError, Result, StoreError};
