//! Deterministic stand-in for a token-level embedding model.
//!
//! Each whitespace token becomes a pseudo-random vector seeded by a hash of
//! the token, so equal tokens always map to equal vectors and shared words
//! between a query and a document produce exact MaxSim matches. Useful for
//! exercising the index end to end without a real encoder.

use std::hash::BuildHasher;

pub const DEFAULT_MAX_TOKENS: usize = 30;

#[derive(Debug, Clone)]
pub struct HashEncoder {
    dim: usize,
    max_tokens: usize,
    hasher: ahash::RandomState,
}

impl HashEncoder {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            max_tokens: DEFAULT_MAX_TOKENS,
            hasher: ahash::RandomState::with_seeds(
                0x243F_6A88_85A3_08D3,
                0x1319_8A2E_0370_7344,
                0xA409_3822_299F_31D0,
                0x082E_FA98_EC4E_6C89,
            ),
        }
    }

    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens.max(1);
        self
    }

    pub const fn dim(&self) -> usize {
        self.dim
    }

    /// One vector per lowercased whitespace token, at most `max_tokens`.
    /// Empty text encodes as the single empty token.
    pub fn encode(&self, text: &str) -> Vec<Vec<f32>> {
        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = lowered.split_whitespace().take(self.max_tokens).collect();
        if tokens.is_empty() {
            return vec![self.token_vector("")];
        }
        tokens.into_iter().map(|t| self.token_vector(t)).collect()
    }

    fn token_vector(&self, token: &str) -> Vec<f32> {
        let mut state = self.hasher.hash_one(token);
        (0..self.dim)
            .map(|_| {
                state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
                unit_interval(splitmix64(state)).mul_add(2.0, -1.0)
            })
            .collect()
    }
}

#[inline]
const fn splitmix64(mut x: u64) -> u64 {
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^ (x >> 31)
}

/// Top 24 bits of `x` as a float in [0, 1).
#[inline]
fn unit_interval(x: u64) -> f32 {
    (x >> 40) as f32 / (1u64 << 24) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_token_same_vector() {
        let enc = HashEncoder::new(16);
        let a = enc.encode("Rust rust");
        assert_eq!(a.len(), 2);
        assert_eq!(a[0], a[1]);
        assert_eq!(a[0].len(), 16);
    }

    #[test]
    fn different_tokens_differ() {
        let enc = HashEncoder::new(16);
        let v = enc.encode("alpha beta");
        assert_ne!(v[0], v[1]);
        assert!(v[0].iter().all(|x| (-1.0..1.0).contains(x)));
    }

    #[test]
    fn caps_token_count_and_handles_empty() {
        let enc = HashEncoder::new(8).with_max_tokens(3);
        assert_eq!(enc.encode("a b c d e").len(), 3);
        assert_eq!(enc.encode("   ").len(), 1);
    }
}
