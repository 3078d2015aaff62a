//! Entities describing a MiniDisc and the state of the recorder.
//!
//! The values here are snapshots: the device owns the truth, and every
//! entity in this module is re-derived from a fresh content listing after
//! a mutation. Nothing in this module talks to the device.

use serde::{Deserialize, Serialize};

/// Audio encoding of a track already recorded on the disc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackEncoding {
    /// Standard play — full ATRAC bitrate.
    Sp,
    /// Long play 2x.
    Lp2,
    /// Long play 4x.
    Lp4,
}

/// Wire format requested for an upload, with the on-wire discriminant the
/// device-interface library expects.
///
/// The frame size is the number of payload bytes per audio block for that
/// format; the upload pipeline uses it only for documentation and sizing,
/// never for math — the encryption stage is format-agnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Wireformat {
    /// Uncompressed PCM (0x00).
    Pcm,
    /// 105 kbps mono (0x90).
    L105kbps,
    /// LP2 stereo (0x94).
    Lp2,
    /// LP4 stereo (0xA8).
    Lp4,
}

impl Wireformat {
    /// On-wire discriminant byte used by the device protocol.
    pub fn discriminant(self) -> u8 {
        match self {
            Wireformat::Pcm => 0x00,
            Wireformat::L105kbps => 0x90,
            Wireformat::Lp2 => 0x94,
            Wireformat::Lp4 => 0xA8,
        }
    }

    /// Payload bytes per audio block for this format.
    pub fn frame_size(self) -> usize {
        match self {
            Wireformat::Pcm => 2048,
            Wireformat::L105kbps => 192,
            Wireformat::Lp2 => 152,
            Wireformat::Lp4 => 96,
        }
    }
}

/// One track as reported by a content listing.
///
/// Indices are 0-based, dense, and contiguous on a non-erased disc.
/// Deleting index `i` shifts every later track down by one; a move is
/// remove-then-reinsert. The service never caches indices across
/// mutations — it re-lists instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub index: u16,
    pub title: String,
    pub encoding: TrackEncoding,
    pub duration_seconds: u32,
}

/// Snapshot of a disc's metadata and contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disc {
    /// User-facing title with any group markup stripped.
    pub title: String,
    /// Exact on-device title string, possibly embedding a group table.
    /// The display `title` is always derivable from this via the codec in
    /// [`crate::title::group`].
    pub raw_title: String,
    pub writable: bool,
    pub write_protected: bool,
    /// Recorded capacity in seconds.
    pub used: u32,
    /// Remaining capacity in seconds.
    pub left: u32,
    /// Total capacity in seconds.
    pub total: u32,
    pub track_count: u16,
    pub tracks: Vec<Track>,
}

/// Transport state of the recorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    Playing,
    Paused,
    /// Stopped / idle; no track is being played.
    Standby,
}

/// Status snapshot from the recorder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceStatus {
    pub disc_present: bool,
    pub state: PlaybackState,
    /// Currently selected track, if any.
    pub track: Option<u16>,
}

/// Playback position as reported by the recorder.
///
/// The device addresses time as minute/second/frame within the current
/// track. A position query yields `None` when the device reports no
/// current position (e.g., stopped with no track selected).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackPosition {
    pub track: u16,
    pub minute: u8,
    pub second: u8,
    pub frame: u8,
}

/// Byte counters for one upload job, delivered to the progress callback.
///
/// `written` and `encrypted` are monotonically non-decreasing over the
/// lifetime of a job and never exceed `total`; `total` is fixed at job
/// start to the payload length. On success the final callback reports
/// `written == total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferProgress {
    pub written: u64,
    pub encrypted: u64,
    pub total: u64,
}
