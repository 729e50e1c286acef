// src/cachebust.rs

//! Cache-bust filename tokens.
//!
//! A token is `length` characters from `[A-Za-z0-9]`. Tokens are not
//! memoized and not guaranteed unique across builds; callers that need the
//! same name in several tasks store it in the `Environment` once.

use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};

use crate::errors::{AssetdagError, Result};

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Suffix appended to tokens used as script artifact names.
pub const SCRIPT_EXTENSION: &str = ".js";

#[derive(Debug)]
enum Entropy {
    Thread,
    Seeded(StdRng),
}

/// Generator for cache-bust tokens.
#[derive(Debug)]
pub struct CacheBuster {
    entropy: Entropy,
}

impl CacheBuster {
    /// Generator backed by the thread-local RNG.
    pub fn new() -> Self {
        Self {
            entropy: Entropy::Thread,
        }
    }

    /// Deterministic generator: the same seed yields the same token sequence.
    pub fn seeded(seed: u64) -> Self {
        Self {
            entropy: Entropy::Seeded(StdRng::seed_from_u64(seed)),
        }
    }

    /// Produce a fresh token of exactly `length` characters.
    pub fn token(&mut self, length: usize) -> Result<String> {
        if length == 0 {
            return Err(AssetdagError::ConfigError(
                "cache-bust token length must be >= 1 (got 0)".to_string(),
            ));
        }

        let token = match &mut self.entropy {
            Entropy::Thread => draw(&mut rand::rng(), length),
            Entropy::Seeded(rng) => draw(rng, length),
        };
        Ok(token)
    }

    /// Token plus the script extension, e.g. `"aZ3kP0q.js"`.
    pub fn artifact_name(&mut self, length: usize) -> Result<String> {
        Ok(format!("{}{}", self.token(length)?, SCRIPT_EXTENSION))
    }
}

impl Default for CacheBuster {
    fn default() -> Self {
        Self::new()
    }
}

fn draw<R: RngExt + ?Sized>(rng: &mut R, length: usize) -> String {
    (0..length)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}
