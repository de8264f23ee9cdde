//! Implicit-grant session state machine
//!
//! An `AuthSession` moves through three situations on every page load:
//!
//! 1. The page was just opened by the provider's redirect: the fragment
//!    carries `access_token`/`state`, which are validated and persisted.
//! 2. A token saved on an earlier load is still unexpired: it is reused.
//! 3. Neither: the caller invokes `re_auth()`, which sends the page to the
//!    authorization endpoint and ends the current load.
//!
//! The state value is persisted before redirecting so it survives the round
//! trip; a callback whose `state` differs is treated as forged or stale and
//! rejects the in-flight flow by regenerating the state.
//!
//! Public operations report failures as `false` plus a log line. The `try_*`
//! variants return the typed error instead.

use std::sync::Arc;

use common::Secret;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::AuthConfig;
use crate::constants::{
    DEFAULT_TOKEN_TYPE, RESPONSE_TYPE, STATE_ALPHABET, STATE_LENGTH, StorageKeys, fragment,
};
use crate::error::{Error, Result};
use crate::navigator::{Navigator, split_fragment};
use crate::query::{build_query, parse_fragment_pairs};
use crate::random::{RandomSource, ThreadRandom};
use crate::store::PersistentStore;

/// External capabilities a session depends on.
///
/// Store and navigator have no sensible default; clock and randomness default
/// to system time and the thread-local CSPRNG.
#[derive(Clone)]
pub struct Collaborators {
    pub store: Arc<dyn PersistentStore>,
    pub navigator: Arc<dyn Navigator>,
    pub clock: Arc<dyn Clock>,
    pub random: Arc<dyn RandomSource>,
}

impl Collaborators {
    pub fn new(store: Arc<dyn PersistentStore>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            store,
            navigator,
            clock: Arc::new(SystemClock),
            random: Arc::new(ThreadRandom),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_random(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }
}

/// Client-side implicit-grant session for one client integration.
///
/// Sessions built on the same store share one state slot and one token slot,
/// so only one authorization flow can be in flight per store.
pub struct AuthSession {
    client_id: String,
    scopes: Vec<String>,
    authorize_endpoint: String,
    state_length: usize,
    keys: StorageKeys,
    state_key: String,
    access_token: Option<Secret<String>>,
    ready: bool,
    env: Collaborators,
}

impl AuthSession {
    /// Session with the default endpoint and storage keys.
    pub fn new(client_id: impl Into<String>, scopes: Vec<String>, env: Collaborators) -> Self {
        Self::from_config(AuthConfig::new(client_id).with_scopes(scopes), env)
    }

    /// Session from a loaded configuration.
    ///
    /// Loads the persisted state value, generating and persisting a fresh one
    /// if none exists yet.
    pub fn from_config(config: AuthConfig, env: Collaborators) -> Self {
        let keys = config.storage_keys();
        let mut session = Self {
            client_id: config.client_id,
            scopes: config.scopes,
            authorize_endpoint: config.authorize_endpoint,
            state_length: config.state_length.max(STATE_LENGTH),
            keys,
            state_key: String::new(),
            access_token: None,
            ready: false,
            env,
        };

        match session
            .env
            .store
            .get(&session.keys.state_key)
            .filter(|s| !s.is_empty())
        {
            Some(state) => session.state_key = state,
            None => {
                debug!("no persisted state value, generating one");
                session.invalidate_state();
            }
        }

        session
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    /// State value the next callback must echo back.
    pub fn state_key(&self) -> &str {
        &self.state_key
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Pick up a token from the callback fragment or from storage.
    ///
    /// Returns false when the caller must `re_auth()`. Never redirects.
    pub fn init(&mut self) -> bool {
        let hash = self.env.navigator.current_fragment();
        let body = hash.strip_prefix('#').unwrap_or(&hash);

        if body.starts_with(fragment::ACCESS_TOKEN) {
            match self.try_parse_fragment(body) {
                Ok(()) => {
                    info!(client_id = %self.client_id, "access token accepted from callback");
                    return true;
                }
                Err(e) => log_failure("callback fragment rejected", &e),
            }
        }

        if self.stored_token().is_some() {
            match self.try_load_stored_token() {
                Ok(()) => {
                    self.ready = true;
                    info!(client_id = %self.client_id, "reusing stored access token");
                    return true;
                }
                Err(e) => log_failure("stored access token unusable", &e),
            }
        }

        debug!(client_id = %self.client_id, "no usable access token, authorization required");
        false
    }

    /// Regenerate the state value and send the page to the authorization
    /// endpoint. Must be the last thing a handler does.
    pub fn re_auth(&mut self) {
        self.invalidate_state();
        let url = self.authorization_url();
        info!(
            client_id = %self.client_id,
            endpoint = %self.authorize_endpoint,
            "redirecting to authorization endpoint"
        );
        self.env.navigator.redirect_to(&url);
    }

    /// The URL `re_auth` navigates to, built from the current state value.
    ///
    /// The redirect URI is the current page URL without its fragment.
    pub fn authorization_url(&self) -> String {
        let current = self.env.navigator.current_url();
        let redirect_uri = split_fragment(&current).0;
        let scope = self.scopes.join(" ");
        build_query(
            &self.authorize_endpoint,
            &[
                ("client_id", self.client_id.as_str()),
                ("response_type", RESPONSE_TYPE),
                ("redirect_uri", redirect_uri),
                ("state", self.state_key.as_str()),
                ("scope", scope.as_str()),
            ],
        )
    }

    /// Validate a callback fragment (without the leading `#`) and persist the
    /// token it carries.
    pub fn parse_fragment(&mut self, callback: &str) -> bool {
        match self.try_parse_fragment(callback) {
            Ok(()) => true,
            Err(e) => {
                log_failure("callback fragment rejected", &e);
                false
            }
        }
    }

    /// Checks run in order: state, provider error, token presence.
    pub fn try_parse_fragment(&mut self, callback: &str) -> Result<()> {
        let pairs = parse_fragment_pairs(callback);

        if pairs.get(fragment::STATE).map(String::as_str) != Some(self.state_key.as_str()) {
            self.invalidate_state();
            return Err(Error::StateMismatch);
        }

        if let Some(error) = pairs.get(fragment::ERROR) {
            return Err(Error::Provider(error.clone()));
        }

        let Some(token) = pairs.get(fragment::ACCESS_TOKEN) else {
            return Err(Error::MalformedCallback(
                "unknown error: neither access_token nor error present".into(),
            ));
        };

        let expires_in: u64 = pairs
            .get(fragment::EXPIRES_IN)
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| Error::MalformedCallback("missing or invalid expires_in".into()))?;
        let expires_on = self
            .env
            .clock
            .now_millis()
            .saturating_add(expires_in.saturating_mul(1000));
        let token_type = pairs
            .get(fragment::TOKEN_TYPE)
            .map(String::as_str)
            .unwrap_or(DEFAULT_TOKEN_TYPE);

        if let Err(e) = self.persist_token(token, token_type, expires_on) {
            self.discard_stored_token();
            return Err(e);
        }
        debug!(expires_on, token_type, "persisted access token from callback");

        self.env.navigator.set_fragment("");

        self.try_load_stored_token()?;
        self.ready = true;
        Ok(())
    }

    /// True if no token is stored or the stored one has reached `expires_on`.
    pub fn is_expired(&self) -> bool {
        if self.stored_token().is_none() {
            return true;
        }
        match self.expires_on() {
            Some(expires_on) => expires_on <= self.env.clock.now_millis(),
            None => true,
        }
    }

    /// Load an unexpired stored token into memory. Leaves `ready` alone.
    pub fn load_stored_token(&mut self) -> bool {
        match self.try_load_stored_token() {
            Ok(()) => true,
            Err(e) => {
                log_failure("stored access token unusable", &e);
                false
            }
        }
    }

    pub fn try_load_stored_token(&mut self) -> Result<()> {
        let Some(token) = self.stored_token() else {
            return Err(Error::NoStoredToken);
        };
        if self.is_expired() {
            return Err(Error::ExpiredToken);
        }
        self.access_token = Some(Secret::new(token));
        Ok(())
    }

    /// Replace the state value, failing any callback still in flight.
    pub fn invalidate_state(&mut self) {
        let state = self
            .env
            .random
            .random_string(self.state_length, STATE_ALPHABET);
        if let Err(e) = self.env.store.set(&self.keys.state_key, &state) {
            warn!(error = %e, "failed to persist state value");
        }
        self.state_key = state;
    }

    /// Forget the stored token and force the next `init()` to fail.
    pub fn invalidate_auth(&mut self) {
        if let Err(e) = self.env.store.remove(&self.keys.access_token) {
            warn!(error = %e, "failed to remove stored access token");
        }
        self.access_token = None;
        self.ready = false;
        info!(client_id = %self.client_id, "authorization invalidated");
    }

    /// The access token, only once the session is ready.
    pub fn get_access_token(&self) -> Option<&str> {
        if !self.ready {
            return None;
        }
        self.access_token.as_ref().map(|t| t.expose().as_str())
    }

    /// Token type persisted with the last accepted token.
    pub fn token_type(&self) -> Option<String> {
        self.env.store.get(&self.keys.token_type)
    }

    /// Absolute expiry (unix milliseconds) of the stored token.
    pub fn expires_on(&self) -> Option<u64> {
        self.env
            .store
            .get(&self.keys.expires_on)
            .and_then(|v| v.trim().parse().ok())
    }

    /// `Authorization` header value for downstream API calls.
    pub fn authorization_header(&self) -> Option<String> {
        let token = self.get_access_token()?;
        let token_type = self
            .token_type()
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_TOKEN_TYPE.to_owned());
        Some(format!("{token_type} {token}"))
    }

    /// Metadata goes first so a stored token never sits beside another
    /// token's expiry.
    fn persist_token(&self, token: &str, token_type: &str, expires_on: u64) -> Result<()> {
        let store = &self.env.store;
        store.set(&self.keys.expires_on, &expires_on.to_string())?;
        store.set(&self.keys.token_type, token_type)?;
        store.set(&self.keys.access_token, token)
    }

    /// Drop whatever token is stored after a partial write.
    fn discard_stored_token(&mut self) {
        if let Err(e) = self.env.store.remove(&self.keys.access_token) {
            warn!(error = %e, "failed to remove access token after partial write");
        }
        self.access_token = None;
        self.ready = false;
    }

    fn stored_token(&self) -> Option<String> {
        self.env
            .store
            .get(&self.keys.access_token)
            .filter(|t| !t.is_empty())
    }
}

fn log_failure(context: &str, err: &Error) {
    if err.is_reauth_signal() {
        debug!(error = %err, "{context}");
    } else {
        warn!(error = %err, "{context}");
    }
}
