//! Integration tests for the title sanitizer and group-aware disc-title
//! codec, exercised together through the public API the way the service
//! layer uses them: sanitize user input, then splice it into the raw
//! on-device title without disturbing the group table.

use md_core::{decode_disc_title, encode_disc_title, sanitize_title, TitleError};

/// Raw titles covering every shape the format can take.
const RAW_TITLE_CORPUS: &[&str] = &[
    "",
    "Plain Title",
    "0;Mix//Rock//Jazz",
    "Rock//Jazz",
    "0;//Orphan Group",
    "0;Titled//",
    "solo-group//",
    "a//b//c//d//e",
    "0;Spaces in title//Group One//Group Two",
];

#[test]
fn test_roundtrip_is_identity_across_corpus() {
    for raw in RAW_TITLE_CORPUS {
        let decoded = decode_disc_title(raw);
        let re_encoded =
            encode_disc_title(&decoded.display_title, &decoded).expect("corpus titles are legal");
        assert_eq!(&re_encoded, raw, "round-trip must be identity for {raw:?}");
    }
}

#[test]
fn test_display_title_is_always_derivable() {
    // Whatever the raw shape, decode never fails and the display title
    // never leaks group markup.
    for raw in RAW_TITLE_CORPUS {
        let decoded = decode_disc_title(raw);
        assert!(
            !decoded.display_title.contains("//"),
            "display title must not contain the delimiter: {raw:?}"
        );
    }
}

#[test]
fn test_rename_preserves_group_tail() {
    let decoded = decode_disc_title("0;Old Name//Rock//Jazz//Ambient");

    let renamed = encode_disc_title("New Name", &decoded).unwrap();

    let re_decoded = decode_disc_title(&renamed);
    assert_eq!(re_decoded.display_title, "New Name");
    assert_eq!(re_decoded.group_tail, "Rock//Jazz//Ambient");
}

#[test]
fn test_promotion_and_demotion() {
    // Title-less grouped disc gains a title...
    let untitled = decode_disc_title("GroupA//GroupB");
    assert_eq!(
        encode_disc_title("Mix", &untitled).unwrap(),
        "0;Mix//GroupA//GroupB"
    );

    // ...and a titled grouped disc loses it again.
    let titled = decode_disc_title("0;Mix//GroupA//GroupB");
    assert_eq!(encode_disc_title("", &titled).unwrap(), "GroupA//GroupB");
}

#[test]
fn test_sanitized_input_splices_cleanly() {
    let decoded = decode_disc_title("0;Old//Rock");

    let new_title = sanitize_title("Café Del Mar — Vol. 2");
    let raw = encode_disc_title(&new_title, &decoded).unwrap();

    assert_eq!(raw, "0;Cafe Del Mar  Vol. 2//Rock");
}

#[test]
fn test_reserved_sequence_is_rejected_not_corrupted() {
    let decoded = decode_disc_title("0;Mix//Rock");
    assert_eq!(
        encode_disc_title("AC//DC", &decoded),
        Err(TitleError::ReservedSequence)
    );
}

#[test]
fn test_sanitizer_idempotence_over_corpus() {
    for s in [
        "Café del Mar",
        "東京 Nights",
        "plain ascii",
        "",
        "Ærø – øst ☃",
    ] {
        let once = sanitize_title(s);
        assert_eq!(sanitize_title(&once), once);
        assert!(once.chars().all(|c| (' '..='~').contains(&c)));
    }
}
