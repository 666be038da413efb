use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("invalid database id: {0:?}")]
    InvalidDatabaseId(String),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SourceError {
    /// Whether retrying the same request later may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::InvalidUrl(_) | Self::InvalidDatabaseId(_) | Self::Json(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_statuses() {
        let rate_limited = SourceError::Status {
            status: 429,
            body: String::new(),
        };
        let unavailable = SourceError::Status {
            status: 503,
            body: String::new(),
        };
        let unauthorized = SourceError::Status {
            status: 401,
            body: "unauthorized".to_string(),
        };

        assert!(rate_limited.is_transient());
        assert!(unavailable.is_transient());
        assert!(!unauthorized.is_transient());
        assert!(!SourceError::InvalidDatabaseId(String::new()).is_transient());
    }
}
