//! # Composite Identifier
//!
//! A key version is addressed remotely by the pair `(key_id,
//! key_version_id)` but stored locally under a single id. The codec joins
//! the two server-assigned ids into
//! `keys/{keyId}/keyVersions/{keyVersionId}` with each segment
//! percent-escaped, and parses that shape back.
//!
//! ## Usage
//!
//! ```rust
//! use key_version_reconciler::sync::composite_id;
//!
//! let id = composite_id::encode("key-1", "version-1");
//! assert_eq!(id, "keys/key-1/keyVersions/version-1");
//! let (key_id, key_version_id) = composite_id::decode(&id).unwrap();
//! assert_eq!((key_id.as_str(), key_version_id.as_str()), ("key-1", "version-1"));
//! ```

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

use crate::error::SyncError;

/// Characters escaped inside a composite id segment.
///
/// `/` would break the part count and `%` the unescaping; the rest keeps a
/// segment printable wherever the id is logged or persisted.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Join two server-assigned ids into the stable composite form.
#[must_use]
pub fn encode(key_id: &str, key_version_id: &str) -> String {
    format!(
        "keys/{}/keyVersions/{}",
        utf8_percent_encode(key_id, SEGMENT),
        utf8_percent_encode(key_version_id, SEGMENT)
    )
}

/// Split a composite id back into `(key_id, key_version_id)`.
///
/// Fails with [`SyncError::MalformedIdentifier`] unless the id has exactly
/// four `/`-delimited parts with the literal `keys` and `keyVersions`
/// labels; it never partially succeeds. Unescaping is lenient: stray `%`
/// sequences pass through untouched.
pub fn decode(composite_id: &str) -> Result<(String, String), SyncError> {
    let parts: Vec<&str> = composite_id.split('/').collect();
    let [keys_label, key_id, versions_label, key_version_id] = parts[..] else {
        return Err(SyncError::MalformedIdentifier {
            id: composite_id.to_string(),
        });
    };
    if keys_label != "keys" || versions_label != "keyVersions" {
        return Err(SyncError::MalformedIdentifier {
            id: composite_id.to_string(),
        });
    }
    Ok((unescape(key_id), unescape(key_version_id)))
}

fn unescape(segment: &str) -> String {
    percent_decode_str(segment).decode_utf8_lossy().into_owned()
}
