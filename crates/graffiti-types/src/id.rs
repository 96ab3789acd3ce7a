use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;

/// Bytes of entropy behind every minted object id.
pub const ID_ENTROPY_BYTES: usize = 24;

/// Mint a fresh object identifier: 24 bytes from the OS RNG, URL-safe
/// base64, no padding. The result contains only `[A-Za-z0-9_-]`.
pub fn mint_object_id() -> String {
    let mut buf = [0u8; ID_ENTROPY_BYTES];
    OsRng.fill_bytes(&mut buf);
    URL_SAFE_NO_PAD.encode(buf)
}
