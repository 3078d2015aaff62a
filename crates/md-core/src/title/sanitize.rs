//! Lossy narrowing of user text into the device's title character set.
//!
//! The title field only stores a 7-bit character set; full character
//! encoding support is out of scope, so this is explicitly best-effort.
//! Canonical decomposition first means accented letters degrade to their
//! base letter ("Café" → "Cafe") instead of disappearing entirely.

use unicode_normalization::UnicodeNormalization;

/// Returns `title` reduced to printable 7-bit ASCII (U+0020..=U+007E).
///
/// Applies Unicode canonical decomposition (NFD), then drops every
/// character outside the printable ASCII range. Never fails, only
/// narrows; idempotent.
pub fn sanitize_title(title: &str) -> String {
    title.nfd().filter(|c| (' '..='~').contains(c)).collect()
}
