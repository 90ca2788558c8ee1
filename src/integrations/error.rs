use thiserror::Error;

/// Failure of a call to a third-party HTTP service
#[derive(Error, Debug)]
pub enum IntegrationError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Rate limit error: {0}")]
    RateLimit(String),

    #[error("Parse error: {0}")]
    Parse(String),

    /// The service has no credentials configured
    #[error("{0} is not configured")]
    NotConfigured(String),
}

impl IntegrationError {
    /// Map a non-success status to the matching variant
    pub fn from_status(service: &str, status: u16, body: String) -> Self {
        match status {
            401 | 403 => Self::Authentication(format!("Invalid or missing {service} API key")),
            429 => Self::RateLimit(format!("{service} API rate limit exceeded")),
            _ => Self::Api {
                status,
                message: format!("{service}: {body}"),
            },
        }
    }
}

impl From<reqwest_middleware::Error> for IntegrationError {
    fn from(err: reqwest_middleware::Error) -> Self {
        IntegrationError::Network(err.to_string())
    }
}

impl From<reqwest::Error> for IntegrationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            IntegrationError::Parse(err.to_string())
        } else {
            IntegrationError::Network(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, IntegrationError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(401, "Authentication")]
    #[case(403, "Authentication")]
    #[case(429, "RateLimit")]
    #[case(500, "Api")]
    fn test_from_status(#[case] status: u16, #[case] expected: &str) {
        let err = IntegrationError::from_status("SerpApi", status, "boom".to_string());
        let name = match err {
            IntegrationError::Authentication(_) => "Authentication",
            IntegrationError::RateLimit(_) => "RateLimit",
            IntegrationError::Api { .. } => "Api",
            _ => "other",
        };
        assert_eq!(name, expected);
    }
}
