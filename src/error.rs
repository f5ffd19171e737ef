//! Error types for the push commands.
//!
//! Every step of a push returns `Result<T, PushError>`. The first error
//! stops the push and is reported to the user by `main`.

use std::path::PathBuf;

/// Errors that can occur while pushing an image to a cloud provider.
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    /// A required flag was not given and has no environment fallback set.
    ///
    /// The String is the full message, naming the flag and the variable.
    #[error("{0}")]
    MissingOption(String),

    /// A flag was given but its value is unusable.
    #[error("Invalid value for {flag}: {reason}")]
    InvalidOption { flag: &'static str, reason: String },

    /// The local image could not be opened or inspected.
    #[error("error opening file {}: {source}", .path.display())]
    FileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The image exceeds what a single PutObject request accepts.
    #[error("{size} bytes exceeds the single upload limit of {limit} bytes")]
    ObjectTooLarge { size: u64, limit: u64 },

    /// A configured endpoint is not a valid base URL.
    #[error("Invalid endpoint {endpoint}: {source}")]
    InvalidEndpoint {
        endpoint: String,
        #[source]
        source: url::ParseError,
    },

    /// Transport level failure (connection refused, timeout, TLS).
    ///
    /// This wraps any reqwest::Error using the `#[from]` attribute.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The cloud service answered with an error document.
    #[error("{service} error {code}: {message} (request id: {request_id})")]
    Api {
        service: &'static str,
        code: String,
        message: String,
        request_id: String,
    },

    /// A successful response body did not have the expected shape.
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Another error annotated with the operation that failed.
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<PushError>,
    },
}

impl PushError {
    /// Error code returned by the cloud service, looking through context.
    pub fn api_code(&self) -> Option<&str> {
        match self {
            PushError::Api { code, .. } => Some(code),
            PushError::Context { source, .. } => source.api_code(),
            _ => None,
        }
    }
}

/// Attach operation context to a failed step.
pub trait ResultExt<T> {
    fn context(self, context: &str) -> Result<T, PushError>;
}

impl<T, E: Into<PushError>> ResultExt<T> for Result<T, E> {
    fn context(self, context: &str) -> Result<T, PushError> {
        self.map_err(|e| PushError::Context {
            context: context.to_string(),
            source: Box::new(e.into()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_keeps_the_api_code() {
        let result: Result<(), PushError> = Err(PushError::Api {
            service: "RAM",
            code: "EntityNotExist.Role".to_string(),
            message: "The role not exists".to_string(),
            request_id: "req-1".to_string(),
        });

        let err = result.context("Failed to get RAM role").unwrap_err();
        assert_eq!(err.api_code(), Some("EntityNotExist.Role"));
        assert_eq!(
            err.to_string(),
            "Failed to get RAM role: RAM error EntityNotExist.Role: The role not exists (request id: req-1)"
        );
    }

    #[test]
    fn file_errors_name_the_path() {
        let err = PushError::FileOpen {
            path: PathBuf::from("/tmp/missing.raw"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert_eq!(err.to_string(), "error opening file /tmp/missing.raw: not found");
        assert_eq!(err.api_code(), None);
    }
}
