//! Page navigation capability
//!
//! The session reads the current page URL and its fragment, clears the
//! fragment once a token has been taken out of it, and sends the page to the
//! authorization endpoint. In a browser these map onto the location object;
//! `MemoryNavigator` is a stand-in that records what it was asked to do.

use std::sync::{Mutex, MutexGuard};

use tracing::debug;

/// Read and change the location of the current page.
pub trait Navigator: Send + Sync {
    /// Full URL of the current page, fragment included.
    fn current_url(&self) -> String;

    /// Fragment of the current URL including its leading `#`, or `""`.
    fn current_fragment(&self) -> String;

    /// Navigate away. Nothing after this call is guaranteed to run in a
    /// browser, so callers make it their last action.
    fn redirect_to(&self, url: &str);

    /// Replace the fragment; `""` removes it.
    fn set_fragment(&self, fragment: &str);
}

/// Split `url` into the part before `#` and the fragment (with `#`).
pub fn split_fragment(url: &str) -> (&str, &str) {
    match url.find('#') {
        Some(idx) => url.split_at(idx),
        None => (url, ""),
    }
}

#[derive(Debug, Default)]
struct NavState {
    url: String,
    redirects: Vec<String>,
}

/// In-memory navigator.
///
/// `redirect_to` records the target and makes it the current URL.
#[derive(Debug, Default)]
pub struct MemoryNavigator {
    state: Mutex<NavState>,
}

impl MemoryNavigator {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(NavState {
                url: url.into(),
                redirects: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, NavState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Simulate arriving at `url` (e.g. the provider's callback).
    pub fn load(&self, url: impl Into<String>) {
        self.lock().url = url.into();
    }

    /// Every URL passed to `redirect_to`, oldest first.
    pub fn redirects(&self) -> Vec<String> {
        self.lock().redirects.clone()
    }

    pub fn last_redirect(&self) -> Option<String> {
        self.lock().redirects.last().cloned()
    }
}

impl Navigator for MemoryNavigator {
    fn current_url(&self) -> String {
        self.lock().url.clone()
    }

    fn current_fragment(&self) -> String {
        let state = self.lock();
        split_fragment(&state.url).1.to_owned()
    }

    fn redirect_to(&self, url: &str) {
        debug!(url, "redirecting page");
        let mut state = self.lock();
        state.redirects.push(url.to_owned());
        state.url = url.to_owned();
    }

    fn set_fragment(&self, fragment: &str) {
        let mut state = self.lock();
        let base = split_fragment(&state.url).0.to_owned();
        let fragment = fragment.strip_prefix('#').unwrap_or(fragment);
        state.url = if fragment.is_empty() {
            base
        } else {
            format!("{base}#{fragment}")
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_fragment_keeps_hash_with_fragment() {
        assert_eq!(
            split_fragment("https://app.test/cb#a=1"),
            ("https://app.test/cb", "#a=1")
        );
        assert_eq!(split_fragment("https://app.test/"), ("https://app.test/", ""));
    }

    #[test]
    fn fragment_reads_like_location_hash() {
        let nav = MemoryNavigator::new("https://app.test/page#access_token=x");
        assert_eq!(nav.current_fragment(), "#access_token=x");

        let nav = MemoryNavigator::new("https://app.test/page");
        assert_eq!(nav.current_fragment(), "");
    }

    #[test]
    fn set_fragment_clears_and_replaces() {
        let nav = MemoryNavigator::new("https://app.test/page#old");
        nav.set_fragment("");
        assert_eq!(nav.current_url(), "https://app.test/page");

        nav.set_fragment("#new");
        assert_eq!(nav.current_url(), "https://app.test/page#new");
    }

    #[test]
    fn redirects_are_recorded_in_order() {
        let nav = MemoryNavigator::new("https://app.test/");
        nav.redirect_to("https://provider.test/a");
        nav.redirect_to("https://provider.test/b");

        assert_eq!(
            nav.redirects(),
            vec!["https://provider.test/a", "https://provider.test/b"]
        );
        assert_eq!(nav.current_url(), "https://provider.test/b");
        assert_eq!(nav.last_redirect().as_deref(), Some("https://provider.test/b"));
    }
}
