use std::io::Write;

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::entry::Entry;

// Hex chars kept from the digest; same width as a sha1 hex string.
const TOKEN_LEN: usize = 40;

/// Stable download file name token for an entry's identity.
///
/// Falls back to a random token if the identity cannot be fed to the hasher.
pub fn file_token(entry: &Entry) -> String {
    token_for(&entry.identity())
}

pub fn token_for(identity: &str) -> String {
    let mut h = Sha256::new();
    if h.write_all(identity.as_bytes()).is_err() {
        return Uuid::new_v4().simple().to_string();
    }
    let mut token = hex::encode(h.finalize());
    token.truncate(TOKEN_LEN);
    token
}
