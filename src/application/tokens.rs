//! Bearer token generation

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;

/// Random bytes per token (256 bits).
const TOKEN_BYTES: usize = 32;

/// Produces unguessable, URL-safe bearer tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenGenerator;

impl TokenGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn generate(&self) -> String {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }

    /// A fresh token for which `taken` returns false.
    pub fn generate_unique(&self, taken: impl Fn(&str) -> bool) -> String {
        loop {
            let token = self.generate();
            if !taken(&token) {
                return token;
            }
        }
    }
}

/// Token shortened for logs and listings (`…abcd`).
pub fn mask_token(token: &str) -> String {
    let visible: String = token
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("…{}", visible)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn tokens_are_url_safe_and_distinct() {
        let generator = TokenGenerator::new();
        let tokens: HashSet<String> = (0..100).map(|_| generator.generate()).collect();
        assert_eq!(tokens.len(), 100);
        for t in &tokens {
            assert_eq!(t.len(), 43);
            assert!(t.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        }
    }

    #[test]
    fn generate_unique_skips_taken_values() {
        let generator = TokenGenerator::new();
        let attempts = std::cell::Cell::new(0);
        let token = generator.generate_unique(|_| {
            attempts.set(attempts.get() + 1);
            attempts.get() < 3
        });
        assert_eq!(attempts.get(), 3);
        assert!(!token.is_empty());
    }

    #[test]
    fn masks_all_but_last_four() {
        assert_eq!(mask_token("abcdefgh"), "…efgh");
        assert_eq!(mask_token("ab"), "…ab");
    }
}
