//! Device-interface seam for the external NetMD library.
//!
//! The USB framing, SCSI/vendor command encoding, and ATRAC/encryption
//! math are *not* implemented in this crate. They are provided by an
//! external device-interface library, and this module pins down exactly
//! the behavioral contract the service depends on, as traits:
//!
//! - [`DeviceConnector`] – pairing/discovery: hands out an opaque,
//!   already-initialized device handle, or nothing if no compatible
//!   device is present.
//! - [`DeviceInterface`] – one live handle to one physical recorder.
//!   The device executes exactly one command at a time; callers go
//!   through the command serializer in the application layer.
//! - [`PacketEncryptor`] – the CPU-bound chunk-to-packet transform used
//!   by the upload pipeline.
//!
//! # Testability
//!
//! The traits allow unit tests to run against [`mock::InMemoryDevice`]
//! without any USB hardware attached.

use std::sync::Arc;

use async_trait::async_trait;
use md_core::{DeviceStatus, Disc, PlaybackPosition, TitleError, Wireformat};
use thiserror::Error;
use tokio::sync::mpsc;

pub mod mock;

/// Error type for device operations.
///
/// Failures are propagated unchanged to the caller — never retried,
/// never swallowed.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// The device rejected or failed a protocol command.
    #[error("device protocol error: {0}")]
    Protocol(String),

    /// The USB transport failed (unplugged, stalled, timed out).
    #[error("usb transport error: {0}")]
    Transport(String),

    /// A transfer aborted mid-job. Partially written device state is left
    /// as-is; re-list content to reconcile.
    #[error("transfer failed: {0}")]
    Transfer(String),

    /// A title was refused before any device call was made.
    #[error("rejected title: {0}")]
    RejectedTitle(#[from] TitleError),
}

/// One encrypted payload packet produced by a [`PacketEncryptor`].
///
/// Opaque to this crate: the initialization vector and data layout are
/// whatever the device library's DES session expects on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedPacket {
    pub iv: [u8; 8],
    pub data: Vec<u8>,
}

impl EncryptedPacket {
    /// Number of payload bytes this packet accounts for.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Descriptor for one track transfer, handed to [`DeviceInterface::download`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferUnit {
    /// Already-sanitized track title.
    pub title: String,
    pub format: Wireformat,
    /// Total payload bytes the packet stream will carry.
    pub total_bytes: u64,
}

/// Callback reporting cumulative written bytes during a download.
pub type WriteProgress = Box<dyn Fn(u64) + Send>;

/// CPU-bound transform of one payload chunk into an encrypted packet.
///
/// Provided by the external device library. The upload pipeline runs it on
/// the blocking pool so encryption never stalls the write path.
#[cfg_attr(test, mockall::automock)]
pub trait PacketEncryptor: Send + Sync {
    fn encrypt_chunk(&self, chunk: &[u8]) -> EncryptedPacket;
}

/// Opens device handles.
///
/// `None` means "no compatible device found" — an expected outcome the
/// facade reports as a boolean, never as an error.
#[async_trait]
pub trait DeviceConnector: Send + Sync {
    /// Prompts for / opens a device not seen before.
    async fn open_new(&self) -> Option<Arc<dyn DeviceInterface>>;

    /// Re-opens a previously paired device without prompting.
    async fn open_paired(&self) -> Option<Arc<dyn DeviceInterface>>;
}

/// A live, exclusive connection to one physical recorder.
///
/// The handle is owned by the service facade for its lifetime and is never
/// exposed to callers. Every method maps 1:1 onto a device library call;
/// the serialization guarantee lives a layer up.
#[async_trait]
pub trait DeviceInterface: Send + Sync {
    async fn device_name(&self) -> Result<String, DeviceError>;

    async fn device_status(&self) -> Result<DeviceStatus, DeviceError>;

    /// Full disc metadata: titles plus the track list with indices,
    /// titles, encodings, and durations.
    async fn list_content(&self) -> Result<Disc, DeviceError>;

    /// Display disc title (group markup stripped by the device library).
    async fn disc_title(&self) -> Result<String, DeviceError>;

    /// Exact on-device disc title string, group table included.
    async fn raw_disc_title(&self) -> Result<String, DeviceError>;

    /// Stages the table of contents for editing. Every metadata write is
    /// bracketed by `cache_toc` / `sync_toc`.
    async fn cache_toc(&self) -> Result<(), DeviceError>;

    /// Commits the staged table of contents to the medium.
    async fn sync_toc(&self) -> Result<(), DeviceError>;

    async fn set_disc_title(&self, title: &str) -> Result<(), DeviceError>;

    async fn set_track_title(&self, index: u16, title: &str) -> Result<(), DeviceError>;

    async fn erase_track(&self, index: u16) -> Result<(), DeviceError>;

    /// Erases the entire medium. Irreversible.
    async fn erase_disc(&self) -> Result<(), DeviceError>;

    async fn move_track(&self, src: u16, dst: u16) -> Result<(), DeviceError>;

    /// Releases the device. The handle is invalid afterwards.
    async fn finalize(&self) -> Result<(), DeviceError>;

    // ── Playback transport ────────────────────────────────────────────────────

    async fn play(&self) -> Result<(), DeviceError>;
    async fn pause(&self) -> Result<(), DeviceError>;
    async fn stop(&self) -> Result<(), DeviceError>;
    async fn next_track(&self) -> Result<(), DeviceError>;
    async fn previous_track(&self) -> Result<(), DeviceError>;
    async fn goto_track(&self, index: u16) -> Result<(), DeviceError>;

    /// `None` when the device reports no current position.
    async fn position(&self) -> Result<Option<PlaybackPosition>, DeviceError>;

    // ── Transfer ──────────────────────────────────────────────────────────────

    /// Writes one track from a pull-based packet stream.
    ///
    /// Consumes packets as the encryption stage produces them and invokes
    /// `on_write` with the cumulative written byte count after each device
    /// write. Needs uninterrupted device access for the whole job, which is
    /// why upload bypasses the command serializer.
    async fn download(
        &self,
        unit: TransferUnit,
        packets: mpsc::Receiver<EncryptedPacket>,
        on_write: WriteProgress,
    ) -> Result<(), DeviceError>;
}
