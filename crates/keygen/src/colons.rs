//! Parsing of gpg's `--with-colons` key listings.
//!
//! Each record is one line of `:`-separated fields; field 1 is the record type.
//! A primary key record (`sec` or `pub`) is followed by an `fpr` record whose
//! field 10 holds the fingerprint. Subkey fingerprints follow `ssb`/`sub`
//! records and are ignored.

use pipeline::{KeyFingerprint, KeyGenerationError};

const FINGERPRINT_FIELD: usize = 9;

/// Returns the fingerprint of the single primary key in `listing`.
pub fn primary_fingerprint(listing: &str) -> Result<KeyFingerprint, KeyGenerationError> {
    let mut primaries: Vec<Option<KeyFingerprint>> = Vec::new();
    let mut awaiting_primary_fpr = false;

    for line in listing.lines() {
        let mut fields = line.split(':');
        match fields.next() {
            Some("sec" | "pub") => {
                primaries.push(None);
                awaiting_primary_fpr = true;
            }
            Some("ssb" | "sub") => awaiting_primary_fpr = false,
            Some("fpr") if awaiting_primary_fpr => {
                awaiting_primary_fpr = false;
                let fingerprint = line
                    .split(':')
                    .nth(FINGERPRINT_FIELD)
                    .map(str::trim)
                    .and_then(KeyFingerprint::new);
                if let Some(slot) = primaries.last_mut() {
                    *slot = fingerprint;
                }
            }
            _ => {}
        }
    }

    match primaries.len() {
        0 => Err(KeyGenerationError::FingerprintNotFound),
        1 => primaries
            .pop()
            .flatten()
            .ok_or(KeyGenerationError::FingerprintNotFound),
        count => Err(KeyGenerationError::AmbiguousKeyring { count }),
    }
}
