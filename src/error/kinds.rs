use std::{fmt, io};

/// Crate-wide `Result` type using [`ClustermError`] as the error.
///
/// This alias is re-exported by the parent `error` module and is intended
/// to be used throughout the crate for fallible operations.
pub type Result<T> = std::result::Result<T, ClustermError>;

/// Top-level error type for clusterm operations.
///
/// This type wraps more specific error kinds and provides a single
/// error type that can be used throughout the crate.
#[derive(Debug)]
pub enum ClustermError {
    /// Command history persistence errors.
    Store(StoreError),

    /// Live resource fetch errors.
    Fetch(FetchError),

    /// Configuration errors.
    Config(ConfigError),

    /// I/O errors.
    Io(io::Error),

    /// JSON encoding or decoding errors.
    Json(serde_json::Error),

    /// Generic error with a free-form message.
    Generic(String),
}

/// History store errors.
#[derive(Debug)]
pub enum StoreError {
    /// Backing file could not be read.
    ReadFailed { path: String, source: io::Error },

    /// Backing file could not be written.
    WriteFailed { path: String, source: io::Error },

    /// Backing file contents are not a recognised history document.
    Corrupt { path: String, reason: String },
}

/// Errors raised while fetching live resource names.
#[derive(Debug)]
pub enum FetchError {
    /// External tool could not be started.
    Spawn { command: String, source: io::Error },

    /// External tool did not finish within the allotted time.
    Timeout { command: String, seconds: u64 },

    /// External tool exited unsuccessfully.
    Status {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    /// Output of the external tool could not be decoded.
    Decode { command: String, reason: String },

    /// Resource provider reported a failure.
    Provider(String),
}

/// Configuration-specific errors.
#[derive(Debug)]
pub enum ConfigError {
    /// Config file not found.
    FileNotFound(String),

    /// Invalid config format.
    InvalidFormat(String),

    /// Invalid field value.
    InvalidValue { field: String, value: String },

    /// Generic configuration error.
    Generic(String),
}

/* ========================= Display & Error impls ========================= */

impl fmt::Display for ClustermError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClustermError::Store(e) => write!(f, "History error: {e}"),
            ClustermError::Fetch(e) => write!(f, "Fetch error: {e}"),
            ClustermError::Config(e) => write!(f, "Configuration error: {e}"),
            ClustermError::Io(e) => write!(f, "I/O error: {e}"),
            ClustermError::Json(e) => write!(f, "JSON error: {e}"),
            ClustermError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::ReadFailed { path, source } => {
                write!(f, "Failed to read {path}: {source}")
            }
            StoreError::WriteFailed { path, source } => {
                write!(f, "Failed to write {path}: {source}")
            }
            StoreError::Corrupt { path, reason } => {
                write!(f, "Unrecognised history file {path}: {reason}")
            }
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Spawn { command, source } => {
                write!(f, "Failed to run '{command}': {source}")
            }
            FetchError::Timeout { command, seconds } => {
                write!(f, "'{command}' timed out after {seconds}s")
            }
            FetchError::Status {
                command,
                code,
                stderr,
            } => match code {
                Some(code) => write!(f, "'{command}' exited with status {code}: {stderr}"),
                None => write!(f, "'{command}' was terminated by a signal: {stderr}"),
            },
            FetchError::Decode { command, reason } => {
                write!(f, "Unexpected output from '{command}': {reason}")
            }
            FetchError::Provider(msg) => write!(f, "Resource provider failed: {msg}"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {path}"),
            ConfigError::InvalidFormat(msg) => write!(f, "Invalid config format: {msg}"),
            ConfigError::InvalidValue { field, value } => {
                write!(f, "Invalid value '{value}' for field '{field}'")
            }
            ConfigError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ClustermError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClustermError::Store(e) => Some(e),
            ClustermError::Fetch(e) => Some(e),
            ClustermError::Config(e) => Some(e),
            ClustermError::Io(e) => Some(e),
            ClustermError::Json(e) => Some(e),
            ClustermError::Generic(_) => None,
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::ReadFailed { source, .. } | StoreError::WriteFailed { source, .. } => {
                Some(source)
            }
            StoreError::Corrupt { .. } => None,
        }
    }
}

impl std::error::Error for FetchError {}
impl std::error::Error for ConfigError {}

/* ========================= Conversions to ClustermError ========================= */

impl From<io::Error> for ClustermError {
    fn from(err: io::Error) -> Self {
        ClustermError::Io(err)
    }
}

impl From<serde_json::Error> for ClustermError {
    fn from(err: serde_json::Error) -> Self {
        ClustermError::Json(err)
    }
}

impl From<StoreError> for ClustermError {
    fn from(err: StoreError) -> Self {
        ClustermError::Store(err)
    }
}

impl From<FetchError> for ClustermError {
    fn from(err: FetchError) -> Self {
        ClustermError::Fetch(err)
    }
}

impl From<ConfigError> for ClustermError {
    fn from(err: ConfigError) -> Self {
        ClustermError::Config(err)
    }
}

impl From<String> for ClustermError {
    fn from(msg: String) -> Self {
        ClustermError::Generic(msg)
    }
}

impl From<&str> for ClustermError {
    fn from(msg: &str) -> Self {
        ClustermError::Generic(msg.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_timeout_display() {
        let err = ClustermError::from(FetchError::Timeout {
            command: "kubectl get pods -o json".to_string(),
            seconds: 10,
        });
        assert_eq!(
            err.to_string(),
            "Fetch error: 'kubectl get pods -o json' timed out after 10s"
        );
    }

    #[test]
    fn test_status_without_code() {
        let err = FetchError::Status {
            command: "helm list -o json".to_string(),
            code: None,
            stderr: String::new(),
        };
        assert!(err.to_string().contains("terminated by a signal"));
    }

    #[test]
    fn test_store_error_source() {
        use std::error::Error;

        let err = StoreError::WriteFailed {
            path: "/tmp/x.json".to_string(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.source().is_some());
        assert!(err.to_string().starts_with("Failed to write /tmp/x.json"));
    }

    #[test]
    fn test_generic_from_str() {
        let err: ClustermError = "boom".into();
        assert_eq!(err.to_string(), "boom");
    }
}
