//! Random tokens for the login flow. The anti-forgery `state` parameter sent
//! to identity providers is one of these.
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::RngCore;

/// 256 bits of entropy
const TOKEN_BYTES: usize = 32;

/// A fresh random token, base64url without padding
pub fn generate_secure_token() -> String {
    let mut buffer = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut buffer);
    URL_SAFE_NO_PAD.encode(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_are_unique_and_url_safe() {
        let token1 = generate_secure_token();
        let token2 = generate_secure_token();

        assert_ne!(token1, token2);

        // 32 bytes encode to 43 characters without padding
        assert_eq!(token1.len(), 43);
        assert!(token1
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_token_decodes_to_full_entropy() {
        let bytes = URL_SAFE_NO_PAD.decode(generate_secure_token()).unwrap();
        assert_eq!(bytes.len(), TOKEN_BYTES);
    }
}
