use thiserror::Error;

pub const NETWORK_MESSAGE: &str =
    "Unable to connect to the server. Please check your internet connection.";
pub const FALLBACK_MESSAGE: &str = "Something went wrong. Please try again.";

#[derive(Error, Debug)]
pub enum Error {
    /// No response was received (DNS, refused connection, timeout).
    #[error("{}", NETWORK_MESSAGE)]
    Network(String),

    /// The server answered with a non-success HTTP status.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// HTTP 200 with `status: false` in the envelope.
    #[error("{0}")]
    Rejected(String),

    #[error("Session expired. Please login again.")]
    Unauthorized,

    #[error("Not logged in. Run `agency-console login` first.")]
    NotLoggedIn,

    #[error("{0}")]
    Validation(String),

    #[error("Invalid response from server: {0}")]
    Decode(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Workflow error: {0}")]
    Workflow(String),

    /// Terminal input or output failed.
    #[error("I/O error: {0}")]
    Io(String),
}

impl Error {
    /// Network, HTTP and logical failures share one display path; everything
    /// else is a local problem.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Error::Network(_) | Error::Http { .. } | Error::Rejected(_) | Error::Unauthorized
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_error_displays_connectivity_message() {
        let err = Error::Network("connection refused".to_string());
        assert_eq!(err.to_string(), NETWORK_MESSAGE);
        assert!(err.is_remote());
    }

    #[test]
    fn test_http_and_rejected_display_server_message() {
        let http = Error::Http {
            status: 500,
            message: "Database unavailable".to_string(),
        };
        let rejected = Error::Rejected("Agency not found".to_string());
        assert_eq!(http.to_string(), "Database unavailable");
        assert_eq!(rejected.to_string(), "Agency not found");
    }

    #[test]
    fn test_validation_is_local() {
        assert!(!Error::Validation("bad".to_string()).is_remote());
    }
}
