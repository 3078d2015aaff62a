//! Codec for the group-aware raw disc-title format.
//!
//! # The mini-format (for beginners)
//!
//! MiniDisc recorders store the disc's group table *inside* the disc title
//! field. A disc whose title is "Mix" with two groups "Rock" and "Jazz"
//! has the raw title:
//!
//! ```text
//! 0;Mix//Rock//Jazz
//! ```
//!
//! - `//` separates groups (and terminates the disc title).
//! - A leading `0;` marks "the text up to the first `//` is the disc
//!   title". Without it, a raw title containing `//` is a title-less
//!   grouped disc: `Rock//Jazz`.
//! - No `//` at all means a plain, ungrouped disc title.
//!
//! The codec splits a raw title into the user-facing display title and an
//! opaque *group tail*, and reassembles a new raw title around an edited
//! display title without touching the tail. Group membership is encoded
//! inside the tail by the device library; this codec never interprets it.
//!
//! `//` is a reserved sequence: a new title containing it is rejected
//! rather than silently corrupting the group table.

use thiserror::Error;

/// Separator between groups (and after the disc title) in a raw title.
pub const GROUP_DELIMITER: &str = "//";

/// Prefix marking that the raw title starts with a disc title.
pub const TITLE_MARKER: &str = "0;";

/// Error type for disc-title encoding.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TitleError {
    /// The new title contains the reserved `//` sequence, which would be
    /// indistinguishable from a group separator on the device.
    #[error("title contains the reserved group separator \"//\"")]
    ReservedSequence,
}

/// Decomposition of a raw on-device disc title.
///
/// Produced by [`decode_disc_title`] and consumed by [`encode_disc_title`];
/// round-tripping with an unchanged display title reproduces the original
/// raw string exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedDiscTitle {
    /// User-facing disc title with group markup stripped. Empty for a
    /// title-less grouped disc.
    pub display_title: String,
    /// Whether the raw title embeds a group table at all.
    pub has_groups: bool,
    /// Whether the raw title starts with the `0;` disc-title marker.
    pub has_title_marker: bool,
    /// Everything after the first delimiter (or the whole raw string for a
    /// title-less grouped disc). Opaque; preserved verbatim on re-encode.
    pub group_tail: String,
}

/// Splits a raw disc title into display title and group tail.
pub fn decode_disc_title(raw: &str) -> DecodedDiscTitle {
    match raw.find(GROUP_DELIMITER) {
        None => DecodedDiscTitle {
            display_title: raw.to_string(),
            has_groups: false,
            has_title_marker: false,
            group_tail: String::new(),
        },
        Some(first) if raw.starts_with(TITLE_MARKER) => DecodedDiscTitle {
            display_title: raw[TITLE_MARKER.len()..first].to_string(),
            has_groups: true,
            has_title_marker: true,
            group_tail: raw[first + GROUP_DELIMITER.len()..].to_string(),
        },
        Some(_) => DecodedDiscTitle {
            // Delimiter present but no marker: the disc has groups and no
            // title. The entire raw string is the tail.
            display_title: String::new(),
            has_groups: true,
            has_title_marker: false,
            group_tail: raw.to_string(),
        },
    }
}

/// Rebuilds a raw disc title around `new_title`, preserving the group tail.
///
/// - No groups: the new title verbatim.
/// - Groups, non-empty title: `0;<new_title>//<tail>` — replaces an
///   existing titled prefix or promotes a title-less grouped disc.
/// - Groups, empty title: the bare tail — demotes to a title-less grouped
///   disc (or leaves one unchanged). A disc whose marker already carried
///   an empty title (`0;//...`) keeps its marker: the title was empty
///   before and after, so the raw string must not change.
///
/// # Errors
///
/// Returns [`TitleError::ReservedSequence`] if `new_title` contains `//`.
pub fn encode_disc_title(new_title: &str, decoded: &DecodedDiscTitle) -> Result<String, TitleError> {
    if new_title.contains(GROUP_DELIMITER) {
        return Err(TitleError::ReservedSequence);
    }

    if !decoded.has_groups {
        return Ok(new_title.to_string());
    }

    if new_title.is_empty() {
        if decoded.has_title_marker && decoded.display_title.is_empty() {
            // An empty title under a marker ("0;//...") is a distinct
            // on-device state from a title-less grouped disc; keep the
            // marker so an unchanged decode re-encodes byte-identically.
            Ok(format!(
                "{TITLE_MARKER}{GROUP_DELIMITER}{}",
                decoded.group_tail
            ))
        } else {
            Ok(decoded.group_tail.clone())
        }
    } else {
        Ok(format!(
            "{TITLE_MARKER}{new_title}{GROUP_DELIMITER}{}",
            decoded.group_tail
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Decode ────────────────────────────────────────────────────────────────

    #[test]
    fn test_decode_plain_title() {
        let d = decode_disc_title("Greatest Hits");
        assert_eq!(d.display_title, "Greatest Hits");
        assert!(!d.has_groups);
        assert!(!d.has_title_marker);
        assert_eq!(d.group_tail, "");
    }

    #[test]
    fn test_decode_titled_grouped_disc() {
        let d = decode_disc_title("0;Mix//Rock//Jazz");
        assert_eq!(d.display_title, "Mix");
        assert!(d.has_groups);
        assert!(d.has_title_marker);
        assert_eq!(d.group_tail, "Rock//Jazz");
    }

    #[test]
    fn test_decode_titleless_grouped_disc() {
        let d = decode_disc_title("Rock//Jazz");
        assert_eq!(d.display_title, "");
        assert!(d.has_groups);
        assert!(!d.has_title_marker);
        assert_eq!(d.group_tail, "Rock//Jazz");
    }

    #[test]
    fn test_decode_empty_string() {
        let d = decode_disc_title("");
        assert_eq!(d.display_title, "");
        assert!(!d.has_groups);
    }

    #[test]
    fn test_decode_marker_without_delimiter_is_plain() {
        // "0;" with no "//" anywhere is just a weird plain title.
        let d = decode_disc_title("0;Oddball");
        assert_eq!(d.display_title, "0;Oddball");
        assert!(!d.has_groups);
    }

    #[test]
    fn test_decode_empty_titled_group_prefix() {
        let d = decode_disc_title("0;//Rock");
        assert_eq!(d.display_title, "");
        assert!(d.has_title_marker);
        assert_eq!(d.group_tail, "Rock");
    }

    // ── Encode ────────────────────────────────────────────────────────────────

    #[test]
    fn test_encode_plain_title() {
        let d = decode_disc_title("Old");
        assert_eq!(encode_disc_title("New", &d).unwrap(), "New");
    }

    #[test]
    fn test_encode_replaces_titled_prefix() {
        let d = decode_disc_title("0;Old//Rock//Jazz");
        assert_eq!(encode_disc_title("New", &d).unwrap(), "0;New//Rock//Jazz");
    }

    #[test]
    fn test_encode_promotion_to_titled_grouped_disc() {
        let d = decode_disc_title("GroupA//GroupB");
        assert_eq!(encode_disc_title("Mix", &d).unwrap(), "0;Mix//GroupA//GroupB");
    }

    #[test]
    fn test_encode_demotion_to_titleless_grouped_disc() {
        let d = decode_disc_title("0;Mix//GroupA//GroupB");
        assert_eq!(encode_disc_title("", &d).unwrap(), "GroupA//GroupB");
    }

    #[test]
    fn test_encode_keeps_marker_with_already_empty_title() {
        // "0;//Rock" has a marker and an empty title; re-encoding the
        // (empty) display title must not strip the marker.
        let d = decode_disc_title("0;//Rock");
        assert_eq!(encode_disc_title("", &d).unwrap(), "0;//Rock");

        // Demotion from a non-empty title still drops the prefix.
        let d = decode_disc_title("0;Mix//Rock");
        assert_eq!(encode_disc_title("", &d).unwrap(), "Rock");
    }

    #[test]
    fn test_encode_rejects_reserved_sequence() {
        let d = decode_disc_title("0;Mix//Rock");
        assert_eq!(
            encode_disc_title("a//b", &d),
            Err(TitleError::ReservedSequence)
        );
    }

    // ── Round-trip law ────────────────────────────────────────────────────────

    #[test]
    fn test_roundtrip_with_unchanged_title_is_identity() {
        for raw in [
            "",
            "Plain",
            "0;Mix//Rock//Jazz",
            "Rock//Jazz",
            "0;//Rock",
            "0;Title//",
            "a//b//c//d",
        ] {
            let d = decode_disc_title(raw);
            assert_eq!(
                encode_disc_title(&d.display_title, &d).unwrap(),
                raw,
                "round-trip failed for {raw:?}"
            );
        }
    }
}
