//! Deterministic content digest stored in the silo header.
//!
//! Two builds of byte-identical source XML must produce the same guid, so
//! `Builder::ensure` can tell "unchanged since last build" apart from
//! "needs a rebuild" without re-parsing.

use crate::format::{Guid, GUID_LEN};
use siphasher::sip128::{Hasher128, SipHasher13};

const KEY1: u64 = 0x7869_6c6f_7369_6c6f; // "xilosilo"
const KEY2: u64 = 0x7869_6c6f_6775_6964; // "xiloguid"

/// Hashes `source` into a 128-bit content guid.
pub fn content_guid(source: &[u8]) -> Guid {
    let mut hasher = SipHasher13::new_with_keys(KEY1, KEY2);
    hasher.write(source);
    let hash = hasher.finish128();
    let mut guid = [0u8; GUID_LEN];
    guid[0..8].copy_from_slice(&hash.h1.to_le_bytes());
    guid[8..16].copy_from_slice(&hash.h2.to_le_bytes());
    guid
}

/// Renders a guid as a lowercase hex string, e.g. for `Silo::guid()`.
pub fn to_hex(guid: &Guid) -> String {
    let mut s = String::with_capacity(GUID_LEN * 2);
    for b in guid {
        s.push_str(&format!("{b:02x}"));
    }
    s
}
