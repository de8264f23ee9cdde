//! OAuth 2.0 implicit-grant client session
//!
//! Obtains, validates, persists and expires an access token for a page that
//! has no backend of its own. Page location, persistent storage, time and
//! randomness are injected through traits so the session runs the same way
//! against a browser binding or the in-memory stand-ins shipped here.
//!
//! Flow on each page load:
//! 1. Build an `AuthSession` (loads or creates the persisted state value)
//! 2. `init()` picks up a token from the callback fragment or from storage
//! 3. If `init()` returned false, `re_auth()` sends the page to the provider
//! 4. The provider redirects back with `#access_token=…&state=…` and step 2
//!    accepts it on the next load
//! 5. `http_get_authorized()` calls the provider's API with the token

pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod http;
pub mod navigator;
pub mod query;
pub mod random;
pub mod session;
pub mod store;

#[cfg(test)]
mod test_support;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::AuthConfig;
pub use constants::*;
pub use error::{Error, Result};
pub use http::{http_get, http_get_authorized};
pub use navigator::{MemoryNavigator, Navigator};
pub use query::build_query;
pub use random::{RandomSource, ThreadRandom};
pub use session::{AuthSession, Collaborators};
pub use store::{FileStore, MemoryStore, PersistentStore};
