//! Session token generation
//!
//! Tokens double as the public identifier and the storage key of an upload,
//! so they must be unguessable: 128 bits from the OS-seeded RNG, hex-encoded.

use rand::RngCore;

/// Raw entropy per token. Hex-encoding doubles the printable length.
pub const TOKEN_BYTES: usize = 16;

/// Printable token length.
pub const TOKEN_LEN: usize = TOKEN_BYTES * 2;

/// Generate a fresh session token.
pub fn generate() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Shape check for tokens arriving in request paths.
///
/// Rejecting malformed tokens before the registry lookup also keeps them out
/// of filesystem paths.
pub fn is_valid(token: &str) -> bool {
    token.len() == TOKEN_LEN && token.bytes().all(|b| b.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_shape() {
        let token = generate();
        assert_eq!(token.len(), TOKEN_LEN);
        assert!(is_valid(&token));
    }

    #[test]
    fn test_tokens_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for _ in 0..1000 {
            assert!(seen.insert(generate()));
        }
    }

    #[test]
    fn test_is_valid_rejects_bad_shapes() {
        assert!(!is_valid(""));
        assert!(!is_valid("abc123"));
        assert!(!is_valid(&"g".repeat(TOKEN_LEN)));
        assert!(!is_valid(&format!("{}/", &generate()[..TOKEN_LEN - 1])));
    }
}
