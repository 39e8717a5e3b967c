use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Unexpected response: {0}")]
    Response(StatusCode),

    #[error("Not authenticated")]
    Authentication,

    #[error("Could not decode response body")]
    Decoding,

    #[error("Sign in failed")]
    Login,

    #[error("Registration failed")]
    Registration,

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Mirror writer has shut down")]
    WriterClosed,
}

impl ClientError {
    /// A 401 from any recipe endpoint. Always ends the session.
    pub fn is_authentication(&self) -> bool {
        matches!(self, ClientError::Authentication)
    }

    /// Errors the user can sensibly retry with a button press.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ClientError::Response(_) | ClientError::Decoding | ClientError::Transport(_)
        )
    }
}

impl From<url::ParseError> for ClientError {
    fn from(e: url::ParseError) -> Self {
        ClientError::InvalidUrl(e.to_string())
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authentication_is_flagged() {
        assert!(ClientError::Authentication.is_authentication());
        assert!(!ClientError::Response(StatusCode::UNAUTHORIZED).is_authentication());
        assert!(!ClientError::Decoding.is_authentication());
    }

    #[test]
    fn response_and_decoding_are_retryable() {
        assert!(ClientError::Response(StatusCode::INTERNAL_SERVER_ERROR).is_retryable());
        assert!(ClientError::Decoding.is_retryable());
        assert!(!ClientError::Authentication.is_retryable());
        assert!(!ClientError::WriterClosed.is_retryable());
    }

    #[test]
    fn url_parse_errors_convert() {
        let err: ClientError = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, ClientError::InvalidUrl(_)));
    }

    #[test]
    fn display_includes_status() {
        let msg = ClientError::Response(StatusCode::BAD_GATEWAY).to_string();
        assert!(msg.contains("502"));
    }
}
