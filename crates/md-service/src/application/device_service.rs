//! DeviceService: the facade the UI layer talks to.
//!
//! Combines the command serializer, the upload pipeline, and the title
//! codecs into one high-level contract over a single device handle.
//!
//! # Attachment state machine
//!
//! ```text
//! Unattached ──(pair / connect succeeds)──► Attached ──(finalize)──► Unattached
//! ```
//!
//! `pair` and `connect` report failure as `false` — "no compatible device
//! found" is an expected outcome, not an error. Every other operation
//! requires the Attached state; invoking one while Unattached is a
//! programming error and panics. The facade trusts its caller to gate on
//! the pair/connect return values, and exactly one handle is live per
//! service instance.
//!
//! # Exclusivity
//!
//! All stateful operations pass through the [`CommandSerializer`]. The one
//! exception is `upload`: the write stage needs uninterrupted device access
//! for the whole job, so it runs outside the serializer and the caller must
//! not issue other operations while an upload is in flight.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use md_core::{
    decode_disc_title, encode_disc_title, sanitize_title, DeviceStatus, Disc, PlaybackPosition,
    Wireformat,
};
use tracing::debug;

use crate::application::serializer::CommandSerializer;
use crate::application::upload::{ProgressCallback, UploadPipeline};
use crate::infrastructure::device::{
    DeviceConnector, DeviceError, DeviceInterface, PacketEncryptor,
};
use crate::infrastructure::storage::config::ServiceConfig;

/// High-level, serialized command API over one NetMD recorder.
pub struct DeviceService {
    connector: Arc<dyn DeviceConnector>,
    encryptor: Arc<dyn PacketEncryptor>,
    serializer: CommandSerializer,
    pipeline: UploadPipeline,
    /// The attached handle. `None` = Unattached. Exclusively owned; never
    /// handed out to callers.
    device: RwLock<Option<Arc<dyn DeviceInterface>>>,
    debug: bool,
    erase_settle: Duration,
}

impl DeviceService {
    /// Creates an unattached service. Infrastructure is injected so tests
    /// run against the in-memory device fake.
    pub fn new(
        connector: Arc<dyn DeviceConnector>,
        encryptor: Arc<dyn PacketEncryptor>,
        config: &ServiceConfig,
    ) -> Self {
        Self {
            connector,
            encryptor,
            serializer: CommandSerializer::new(),
            pipeline: UploadPipeline::new(config.chunk_size, config.channel_depth),
            device: RwLock::new(None),
            debug: config.debug,
            erase_settle: Duration::from_millis(config.erase_settle_ms),
        }
    }

    /// Whether a device is currently attached.
    pub fn is_attached(&self) -> bool {
        self.device.read().expect("lock poisoned").is_some()
    }

    /// Returns the attached handle.
    ///
    /// Panics when Unattached: calling a device operation before a
    /// successful `pair`/`connect` is a caller bug, not a recoverable
    /// device condition.
    fn attached(&self) -> Arc<dyn DeviceInterface> {
        self.device
            .read()
            .expect("lock poisoned")
            .clone()
            .expect("no device attached: pair() or connect() must succeed first")
    }

    /// Per-instance conditional logging: emits a debug event carrying the
    /// method name when the `debug` config option is set.
    fn trace(&self, method: &'static str) {
        if self.debug {
            debug!(method, "device command");
        }
    }

    // ── Attachment ────────────────────────────────────────────────────────────

    /// Prompts for a new device. Returns `false` when none is found.
    /// Not serialized: nothing is attached yet.
    pub async fn pair(&self) -> bool {
        self.trace("pair");
        match self.connector.open_new().await {
            Some(handle) => {
                *self.device.write().expect("lock poisoned") = Some(handle);
                true
            }
            None => false,
        }
    }

    /// Re-opens a previously paired device. Same contract as [`pair`].
    ///
    /// [`pair`]: DeviceService::pair
    pub async fn connect(&self) -> bool {
        self.trace("connect");
        match self.connector.open_paired().await {
            Some(handle) => {
                *self.device.write().expect("lock poisoned") = Some(handle);
                true
            }
            None => false,
        }
    }

    /// Releases the device and returns to Unattached. The handle is
    /// invalidated even if the device-side finalize fails.
    pub async fn finalize(&self) -> Result<(), DeviceError> {
        self.trace("finalize");
        let _permit = self.serializer.acquire().await;
        let device = self.attached();
        let result = device.finalize().await;
        *self.device.write().expect("lock poisoned") = None;
        result
    }

    // ── Content and status ────────────────────────────────────────────────────

    pub async fn list_content(&self) -> Result<Disc, DeviceError> {
        self.trace("list_content");
        let _permit = self.serializer.acquire().await;
        self.attached().list_content().await
    }

    pub async fn device_status(&self) -> Result<DeviceStatus, DeviceError> {
        self.trace("device_status");
        let _permit = self.serializer.acquire().await;
        self.attached().device_status().await
    }

    pub async fn device_name(&self) -> Result<String, DeviceError> {
        self.trace("device_name");
        let _permit = self.serializer.acquire().await;
        self.attached().device_name().await
    }

    // ── Metadata mutation ─────────────────────────────────────────────────────

    /// Renames one track. The title is sanitized to the device character
    /// set; the write is bracketed by the TOC cache/sync sequence.
    pub async fn rename_track(&self, index: u16, new_title: &str) -> Result<(), DeviceError> {
        self.trace("rename_track");
        let _permit = self.serializer.acquire().await;
        let device = self.attached();
        let title = sanitize_title(new_title);
        device.cache_toc().await?;
        device.set_track_title(index, &title).await?;
        device.sync_toc().await?;
        Ok(())
    }

    /// Renames the disc, preserving any embedded group table.
    ///
    /// Renaming to the current display title is a no-op: no TOC staging,
    /// no write. Otherwise the new title is spliced into the raw title via
    /// the group codec and written under the TOC cache/sync bracket.
    pub async fn rename_disc(&self, new_name: &str) -> Result<(), DeviceError> {
        self.trace("rename_disc");
        let _permit = self.serializer.acquire().await;
        let device = self.attached();

        let current = device.disc_title().await?;
        if new_name == current {
            return Ok(());
        }

        let raw = device.raw_disc_title().await?;
        let decoded = decode_disc_title(&raw);
        let new_raw = encode_disc_title(new_name, &decoded)?;

        device.cache_toc().await?;
        device.set_disc_title(&new_raw).await?;
        device.sync_toc().await?;
        Ok(())
    }

    // ── Track management ──────────────────────────────────────────────────────

    /// Erases one track, then waits a fixed settle delay: some units report
    /// completion before the erase is physically finished.
    pub async fn delete_track(&self, index: u16) -> Result<(), DeviceError> {
        self.trace("delete_track");
        let _permit = self.serializer.acquire().await;
        let device = self.attached();
        device.erase_track(index).await?;
        tokio::time::sleep(self.erase_settle).await;
        Ok(())
    }

    /// Moves a track. Index semantics are defined by the device library;
    /// no additional validation here.
    pub async fn move_track(&self, src: u16, dst: u16) -> Result<(), DeviceError> {
        self.trace("move_track");
        let _permit = self.serializer.acquire().await;
        self.attached().move_track(src, dst).await
    }

    /// Erases the entire medium. Irreversible.
    pub async fn wipe_disc(&self) -> Result<(), DeviceError> {
        self.trace("wipe_disc");
        let _permit = self.serializer.acquire().await;
        self.attached().erase_disc().await
    }

    // ── Playback transport ────────────────────────────────────────────────────

    pub async fn play(&self) -> Result<(), DeviceError> {
        self.trace("play");
        let _permit = self.serializer.acquire().await;
        self.attached().play().await
    }

    pub async fn pause(&self) -> Result<(), DeviceError> {
        self.trace("pause");
        let _permit = self.serializer.acquire().await;
        self.attached().pause().await
    }

    pub async fn stop(&self) -> Result<(), DeviceError> {
        self.trace("stop");
        let _permit = self.serializer.acquire().await;
        self.attached().stop().await
    }

    pub async fn next(&self) -> Result<(), DeviceError> {
        self.trace("next");
        let _permit = self.serializer.acquire().await;
        self.attached().next_track().await
    }

    pub async fn prev(&self) -> Result<(), DeviceError> {
        self.trace("prev");
        let _permit = self.serializer.acquire().await;
        self.attached().previous_track().await
    }

    pub async fn goto_track(&self, index: u16) -> Result<(), DeviceError> {
        self.trace("goto_track");
        let _permit = self.serializer.acquire().await;
        self.attached().goto_track(index).await
    }

    /// `None` when the device reports no current position.
    pub async fn position(&self) -> Result<Option<PlaybackPosition>, DeviceError> {
        self.trace("position");
        let _permit = self.serializer.acquire().await;
        self.attached().position().await
    }

    // ── Upload ────────────────────────────────────────────────────────────────

    /// Uploads one track. At most one upload may run per device, and the
    /// caller must not issue serialized operations while it is in flight —
    /// the pipeline needs the device to itself for the whole job.
    pub async fn upload(
        &self,
        title: &str,
        payload: Vec<u8>,
        format: Wireformat,
        on_progress: ProgressCallback,
    ) -> Result<(), DeviceError> {
        self.trace("upload");
        let device = self.attached();
        self.pipeline
            .run(
                device,
                Arc::clone(&self.encryptor),
                title,
                payload,
                format,
                on_progress,
            )
            .await
    }
}
