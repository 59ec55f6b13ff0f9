//! PKCE verifier/challenge helpers (S256).

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::Rng;
use sha2::{Digest, Sha256};

const VERIFIER_BYTES: usize = 32;

/// Random 32-byte verifier, base64url without padding (43 chars).
pub fn generate_code_verifier() -> String {
    let mut buf = [0u8; VERIFIER_BYTES];
    rand::rng().fill(&mut buf);
    code_verifier_from_bytes(&buf)
}

pub fn code_verifier_from_bytes(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// `base64url(SHA256(verifier))`, no padding.
pub fn compute_code_challenge(verifier: &str) -> String {
    let digest = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}
