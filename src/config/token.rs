//! HTTP token generation

/// Generate a random token for authenticating API requests.
///
/// The token is hex-encoded and safe to embed in `config.toml`.
pub fn generate_http_token() -> String {
    let mut bytes = Vec::with_capacity(32);
    bytes.extend_from_slice(uuid::Uuid::new_v4().as_bytes());
    bytes.extend_from_slice(uuid::Uuid::new_v4().as_bytes());
    hex::encode(bytes)
}
