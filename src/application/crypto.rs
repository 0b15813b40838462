// src/application/crypto.rs
use base64::{
    Engine as _,
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
};
use rand::{Rng, distributions::Alphanumeric};
use sha2::{Digest, Sha256};

/// One-way hash used to store and look up authorization codes.
pub fn hash_string(value: &str) -> String {
    STANDARD.encode(Sha256::digest(value.as_bytes()))
}

pub fn generate_secure_random_string(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// PKCE S256: `BASE64URL(SHA256(verifier))` without padding.
pub fn code_challenge_s256(code_verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(code_verifier.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s256_matches_rfc7636_appendix_b() {
        assert_eq!(
            code_challenge_s256("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn hash_is_stable_and_random_strings_differ() {
        assert_eq!(hash_string("abc"), hash_string("abc"));
        assert_ne!(hash_string("abc"), hash_string("abd"));
        let a = generate_secure_random_string(96);
        assert_eq!(a.len(), 96);
        assert_ne!(a, generate_secure_random_string(96));
    }
}
