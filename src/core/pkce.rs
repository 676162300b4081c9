//! PKCE
//!
//! RFC 7636 Proof Key for Code Exchange: a random code verifier and its
//! S256 challenge, generated once per authorization.

use base64::Engine;
use rand::Rng;
use sha2::{Digest, Sha256};

/// Verifier alphabet used by the tenant flows.
const VERIFIER_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz123456789";

/// Verifier length (RFC 7636 maximum).
const VERIFIER_LENGTH: usize = 128;

/// A code verifier and its derived S256 challenge.
#[derive(Clone)]
pub struct PkcePair {
    pub code_verifier: String,
    pub code_challenge: String,
}

impl PkcePair {
    /// Generate a fresh verifier/challenge pair.
    pub fn generate() -> Self {
        let code_verifier = generate_verifier();
        let code_challenge = compute_challenge(&code_verifier);
        Self {
            code_verifier,
            code_challenge,
        }
    }
}

impl std::fmt::Debug for PkcePair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PkcePair")
            .field("code_verifier", &"[REDACTED]")
            .field("code_challenge", &self.code_challenge)
            .finish()
    }
}

/// Generate a 128-character verifier drawn uniformly from the alphabet.
pub fn generate_verifier() -> String {
    let mut rng = rand::thread_rng();
    (0..VERIFIER_LENGTH)
        .map(|_| {
            let idx = rng.gen_range(0..VERIFIER_ALPHABET.len());
            VERIFIER_ALPHABET[idx] as char
        })
        .collect()
}

/// Compute the S256 challenge: BASE64URL-without-padding(SHA256(verifier)).
pub fn compute_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verifier_length_and_alphabet() {
        let verifier = generate_verifier();
        assert_eq!(verifier.len(), VERIFIER_LENGTH);
        assert!(verifier.bytes().all(|b| VERIFIER_ALPHABET.contains(&b)));
    }

    #[test]
    fn test_verifiers_differ_across_calls() {
        // 128 characters over a 35-symbol alphabet; a collision here would
        // indicate a broken random source.
        assert_ne!(generate_verifier(), generate_verifier());
    }

    #[test]
    fn test_challenge_known_vector() {
        // RFC 7636 Appendix B test vector.
        let challenge = compute_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk");
        assert_eq!(challenge, "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM");
    }

    #[test]
    fn test_challenge_is_deterministic_and_url_safe() {
        let verifier = generate_verifier();
        let challenge = compute_challenge(&verifier);
        assert_eq!(challenge, compute_challenge(&verifier));
        assert!(!challenge.contains('+'));
        assert!(!challenge.contains('/'));
        assert!(!challenge.contains('='));
    }

    #[test]
    fn test_pair_is_consistent() {
        let pair = PkcePair::generate();
        assert_eq!(pair.code_challenge, compute_challenge(&pair.code_verifier));
    }

    #[test]
    fn test_pair_debug_redacts_verifier() {
        let pair = PkcePair::generate();
        let printed = format!("{:?}", pair);
        assert!(!printed.contains(&pair.code_verifier));
    }
}
