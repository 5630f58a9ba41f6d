use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Generate the raw single-use secret embedded in emailed links.
///
/// 32 random bytes, URL-safe base64. The raw value is only ever sent to the
/// user; the database sees nothing but its hash.
pub fn generate_raw_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Hash a raw token for storage and lookup.
///
/// Plain SHA-256 is enough here: the input already carries 256 bits of
/// entropy, so no slow KDF is needed (unlike passwords).
pub fn hash_token(raw: &str) -> String {
    let digest = Sha256::digest(raw.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;

    #[test]
    fn raw_token_decodes_to_32_bytes() {
        let token = generate_raw_token();
        let bytes = URL_SAFE_NO_PAD.decode(token.as_bytes()).expect("decode");
        assert_eq!(bytes.len(), 32);
    }

    #[test]
    fn raw_tokens_are_unique() {
        assert_ne!(generate_raw_token(), generate_raw_token());
    }

    #[test]
    fn hash_is_deterministic() {
        let raw = generate_raw_token();
        assert_eq!(hash_token(&raw), hash_token(&raw));
    }

    #[test]
    fn hash_differs_per_input_and_from_raw() {
        let a = generate_raw_token();
        let b = generate_raw_token();
        assert_ne!(hash_token(&a), hash_token(&b));
        assert_ne!(hash_token(&a), a);
    }
}
