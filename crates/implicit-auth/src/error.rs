//! Error types for implicit-grant session operations

/// Errors from session and collaborator operations.
///
/// `NoStoredToken` and `ExpiredToken` are normal "needs authorization"
/// signals rather than faults; the boolean session API logs them at `debug`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("callback state does not match the pending authorization request")]
    StateMismatch,

    #[error("authorization provider returned an error: {0}")]
    Provider(String),

    #[error("malformed callback: {0}")]
    MalformedCallback(String),

    #[error("no stored access token")]
    NoStoredToken,

    #[error("stored access token has expired")]
    ExpiredToken,

    #[error("storage error: {0}")]
    Storage(String),
}

impl Error {
    /// Whether this error only means "authorize again" (nothing went wrong).
    pub fn is_reauth_signal(&self) -> bool {
        matches!(self, Error::NoStoredToken | Error::ExpiredToken)
    }
}

/// Result alias for session operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_surfaces_detail() {
        let err = Error::Provider("access_denied".into());
        assert_eq!(
            err.to_string(),
            "authorization provider returned an error: access_denied"
        );
    }

    #[test]
    fn reauth_signals_are_not_faults() {
        assert!(Error::NoStoredToken.is_reauth_signal());
        assert!(Error::ExpiredToken.is_reauth_signal());
        assert!(!Error::StateMismatch.is_reauth_signal());
        assert!(!Error::MalformedCallback("x".into()).is_reauth_signal());
    }
}
