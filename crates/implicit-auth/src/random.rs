//! Random state generation
//!
//! State values only need to be unguessable for the lifetime of one
//! authorization round-trip. The default source draws from `rand`'s
//! thread-local CSPRNG, uniformly per character.

use rand::RngExt;

pub trait RandomSource: Send + Sync {
    /// `length` characters drawn from `alphabet`.
    fn random_string(&self, length: usize, alphabet: &str) -> String;
}

/// Thread-local CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn random_string(&self, length: usize, alphabet: &str) -> String {
        let symbols: Vec<char> = alphabet.chars().collect();
        if symbols.is_empty() {
            return String::new();
        }
        let mut rng = rand::rng();
        (0..length)
            .map(|_| symbols[rng.random_range(0..symbols.len())])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::STATE_ALPHABET;

    #[test]
    fn output_has_requested_length_and_alphabet() {
        let value = ThreadRandom.random_string(16, STATE_ALPHABET);
        assert_eq!(value.len(), 16);
        assert!(value.chars().all(|c| STATE_ALPHABET.contains(c)), "{value}");
    }

    #[test]
    fn values_do_not_collide() {
        let a = ThreadRandom.random_string(16, STATE_ALPHABET);
        let b = ThreadRandom.random_string(16, STATE_ALPHABET);
        assert_ne!(a, b, "two state values must not collide");
    }

    #[test]
    fn empty_alphabet_yields_empty_string() {
        assert_eq!(ThreadRandom.random_string(16, ""), "");
    }

    #[test]
    fn every_symbol_is_reachable() {
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            seen.extend(ThreadRandom.random_string(16, "AB").chars());
        }
        assert_eq!(seen.len(), 2);
    }
}
