//! Shared key generation for storage backends.
//!
//! Key format: `<orientation>/<random>.<ext>`.

use base64::Engine;
use rand::RngCore;
use vidkeep_core::constants::STORAGE_KEY_RANDOM_BYTES;
use vidkeep_core::Orientation;

/// Derive a fresh, collision-resistant key for a video.
///
/// The random part is drawn from the thread-local CSPRNG; nothing in the key
/// comes from the uploaded file name or the request.
pub fn derive_video_key(orientation: Orientation, extension: &str) -> String {
    let mut bytes = [0u8; STORAGE_KEY_RANDOM_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    let random = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes);
    format!("{}/{}.{}", orientation.as_str(), random, extension)
}

/// File extension for a validated content type: its subtype with parameters stripped.
///
/// Returns `None` unless the subtype is plain ASCII alphanumerics.
pub fn extension_for_content_type(content_type: &str) -> Option<String> {
    let essence = content_type.split(';').next()?.trim();
    let (_, subtype) = essence.split_once('/')?;
    if subtype.is_empty() || !subtype.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(subtype.to_ascii_lowercase())
}
