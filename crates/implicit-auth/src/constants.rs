//! Implicit-grant constants
//!
//! Wire names for the authorization request and the callback fragment, plus
//! the storage key names the session persists under. None of these are
//! secrets.

/// Default authorization endpoint (Spotify accounts service)
pub const AUTHORIZE_ENDPOINT: &str = "https://accounts.spotify.com/authorize";

/// `response_type` value that selects the implicit grant
pub const RESPONSE_TYPE: &str = "token";

/// Prefix shared by every persisted key
pub const DEFAULT_KEY_PREFIX: &str = "igca_";

/// Length of a generated state value
pub const STATE_LENGTH: usize = 16;

/// Alphabet state values are drawn from.
/// 26 symbols gives ~4.7 bits per character (~75 bits for 16 characters).
pub const STATE_ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Token type assumed when the provider omits `token_type`
pub const DEFAULT_TOKEN_TYPE: &str = "Bearer";

/// Callback fragment field names
pub mod fragment {
    pub const ACCESS_TOKEN: &str = "access_token";
    pub const TOKEN_TYPE: &str = "token_type";
    pub const EXPIRES_IN: &str = "expires_in";
    pub const STATE: &str = "state";
    pub const ERROR: &str = "error";
}

/// Persisted key names for a given prefix.
///
/// With the default prefix these are `igca_state_key`, `igca_access_token`,
/// `igca_token_type` and `igca_expires_on`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub state_key: String,
    pub access_token: String,
    pub token_type: String,
    pub expires_on: String,
}

impl StorageKeys {
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            state_key: format!("{prefix}state_key"),
            access_token: format!("{prefix}access_token"),
            token_type: format!("{prefix}token_type"),
            expires_on: format!("{prefix}expires_on"),
        }
    }
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self::with_prefix(DEFAULT_KEY_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_keys_match_persisted_names() {
        let keys = StorageKeys::default();
        assert_eq!(keys.state_key, "igca_state_key");
        assert_eq!(keys.access_token, "igca_access_token");
        assert_eq!(keys.token_type, "igca_token_type");
        assert_eq!(keys.expires_on, "igca_expires_on");
    }

    #[test]
    fn custom_prefix_applies_to_every_key() {
        let keys = StorageKeys::with_prefix("app_");
        assert_eq!(keys.state_key, "app_state_key");
        assert_eq!(keys.expires_on, "app_expires_on");
    }

    #[test]
    fn state_alphabet_is_uppercase_ascii() {
        assert_eq!(STATE_ALPHABET.len(), 26);
        assert!(STATE_ALPHABET.chars().all(|c| c.is_ascii_uppercase()));
    }
}
