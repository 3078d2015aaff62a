//! # md-core
//!
//! Shared library for the MiniDisc companion service containing the domain
//! entities (discs, tracks, device status, transfer progress) and the two
//! title codecs: the lossy title sanitizer and the group-aware disc-title
//! codec.
//!
//! This crate is used by the service layer and by any UI bridge built on
//! top of it. It has zero dependencies on USB transports, async runtimes,
//! or the device-interface library.
//!
//! # Architecture overview (for beginners)
//!
//! A NetMD recorder is a stateful USB device that executes exactly one
//! command at a time. The companion service (in `md-service`) mediates
//! between a UI and that device. This crate is the service's foundation:
//!
//! - **`domain`** – Pure entities describing what is on a disc: titles,
//!   tracks, encodings, playback state, and the byte counters reported
//!   while a track is being transferred.
//!
//! - **`title`** – Everything about the device's quirky title field.
//!   Titles are stored in a 7-bit character set, and the *disc* title may
//!   additionally embed a "group table" (named sub-ranges of tracks) inside
//!   the same string using an ad-hoc `0;name//group//group` mini-format.

// Rust will look for each module in a subdirectory with the same name
// (e.g., src/domain/mod.rs).
pub mod domain;
pub mod title;

// Re-export the most-used types at the crate root so callers can write
// `md_core::Disc` instead of `md_core::domain::disc::Disc`.
pub use domain::disc::{
    DeviceStatus, Disc, PlaybackPosition, PlaybackState, Track, TrackEncoding, TransferProgress,
    Wireformat,
};
pub use title::group::{decode_disc_title, encode_disc_title, DecodedDiscTitle, TitleError};
pub use title::sanitize::sanitize_title;
