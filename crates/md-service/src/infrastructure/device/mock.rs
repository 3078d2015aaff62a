//! In-memory device fake for unit and integration testing.
//!
//! Simulates a recorder with a disc loaded, recording every call so tests
//! can assert on call order and on the mutual-exclusion guarantee, without
//! any USB hardware attached.

use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc, Mutex,
};
use std::time::Duration;

use async_trait::async_trait;
use md_core::{
    decode_disc_title, DeviceStatus, Disc, PlaybackPosition, PlaybackState, Track, TrackEncoding,
    TransferProgress, Wireformat,
};
use tokio::sync::mpsc;

use super::{
    DeviceConnector, DeviceError, DeviceInterface, EncryptedPacket, PacketEncryptor, TransferUnit,
    WriteProgress,
};

/// Pass-through [`PacketEncryptor`] for tests: copies the chunk into a
/// packet with a zero IV.
#[derive(Debug, Default)]
pub struct PlaintextEncryptor;

impl PacketEncryptor for PlaintextEncryptor {
    fn encrypt_chunk(&self, chunk: &[u8]) -> EncryptedPacket {
        EncryptedPacket {
            iv: [0u8; 8],
            data: chunk.to_vec(),
        }
    }
}

/// Mutable disc/transport state behind the fake.
#[derive(Debug, Clone)]
struct DiscState {
    raw_title: String,
    tracks: Vec<Track>,
    staged_toc: bool,
    playback: PlaybackState,
    current_track: Option<u16>,
}

/// An in-memory implementation of [`DeviceInterface`].
///
/// Every method appends its name to an observable call log. Overlapping
/// calls (two device commands in flight at once) are latched into
/// `overlap_detected`, which well-behaved callers must never trip.
pub struct InMemoryDevice {
    state: Mutex<DiscState>,
    call_log: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    overlap_detected: AtomicBool,
    /// Artificial per-command latency, to widen race windows in
    /// concurrency tests.
    op_delay: Duration,
    /// When set, the named method fails once with a protocol error.
    fail_next: Mutex<Option<String>>,
    /// When set, `download` fails after consuming this many packets.
    fail_download_after: Mutex<Option<usize>>,
}

impl InMemoryDevice {
    /// Creates a device with the given raw disc title and tracks.
    pub fn new(raw_title: &str, tracks: Vec<Track>) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(DiscState {
                raw_title: raw_title.to_string(),
                tracks,
                staged_toc: false,
                playback: PlaybackState::Standby,
                current_track: None,
            }),
            call_log: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            overlap_detected: AtomicBool::new(false),
            op_delay: Duration::from_millis(1),
            fail_next: Mutex::new(None),
            fail_download_after: Mutex::new(None),
        })
    }

    /// Convenience constructor for a disc with simple SP tracks.
    pub fn with_titles(raw_title: &str, titles: &[&str]) -> Arc<Self> {
        let tracks = titles
            .iter()
            .enumerate()
            .map(|(i, t)| Track {
                index: i as u16,
                title: t.to_string(),
                encoding: TrackEncoding::Sp,
                duration_seconds: 240,
            })
            .collect();
        Self::new(raw_title, tracks)
    }

    /// Arms a one-shot failure for the named method.
    pub fn fail_next(&self, method: &str) {
        *self.fail_next.lock().expect("lock poisoned") = Some(method.to_string());
    }

    /// Arms `download` to fail after consuming `packets` packets.
    pub fn fail_download_after(&self, packets: usize) {
        *self.fail_download_after.lock().expect("lock poisoned") = Some(packets);
    }

    /// Snapshot of the recorded call order.
    pub fn call_log(&self) -> Vec<String> {
        self.call_log.lock().expect("lock poisoned").clone()
    }

    /// Whether two device commands ever overlapped in execution.
    pub fn overlap_detected(&self) -> bool {
        self.overlap_detected.load(Ordering::SeqCst)
    }

    /// Current raw disc title.
    pub fn raw_title(&self) -> String {
        self.state.lock().expect("lock poisoned").raw_title.clone()
    }

    /// Titles of all tracks, in index order.
    pub fn track_titles(&self) -> Vec<String> {
        self.state
            .lock()
            .expect("lock poisoned")
            .tracks
            .iter()
            .map(|t| t.title.clone())
            .collect()
    }

    /// Records a call, simulates command latency, and applies any armed
    /// one-shot failure. Overlap with another in-flight command is latched.
    async fn command(&self, method: &str) -> Result<(), DeviceError> {
        self.call_log
            .lock()
            .expect("lock poisoned")
            .push(method.to_string());

        if self.in_flight.fetch_add(1, Ordering::SeqCst) > 0 {
            self.overlap_detected.store(true, Ordering::SeqCst);
        }
        tokio::time::sleep(self.op_delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let armed = {
            let mut slot = self.fail_next.lock().expect("lock poisoned");
            if slot.as_deref() == Some(method) {
                slot.take()
            } else {
                None
            }
        };
        if let Some(m) = armed {
            return Err(DeviceError::Protocol(format!("injected failure in {m}")));
        }
        Ok(())
    }
}

#[async_trait]
impl DeviceInterface for InMemoryDevice {
    async fn device_name(&self) -> Result<String, DeviceError> {
        self.command("device_name").await?;
        Ok("InMemory MZ-N1".to_string())
    }

    async fn device_status(&self) -> Result<DeviceStatus, DeviceError> {
        self.command("device_status").await?;
        let state = self.state.lock().expect("lock poisoned");
        Ok(DeviceStatus {
            disc_present: true,
            state: state.playback,
            track: state.current_track,
        })
    }

    async fn list_content(&self) -> Result<Disc, DeviceError> {
        self.command("list_content").await?;
        let state = self.state.lock().expect("lock poisoned");
        let used: u32 = state.tracks.iter().map(|t| t.duration_seconds).sum();
        let total: u32 = 80 * 60;
        Ok(Disc {
            title: decode_disc_title(&state.raw_title).display_title,
            raw_title: state.raw_title.clone(),
            writable: true,
            write_protected: false,
            used,
            left: total.saturating_sub(used),
            total,
            track_count: state.tracks.len() as u16,
            tracks: state.tracks.clone(),
        })
    }

    async fn disc_title(&self) -> Result<String, DeviceError> {
        self.command("disc_title").await?;
        let state = self.state.lock().expect("lock poisoned");
        Ok(decode_disc_title(&state.raw_title).display_title)
    }

    async fn raw_disc_title(&self) -> Result<String, DeviceError> {
        self.command("raw_disc_title").await?;
        Ok(self.state.lock().expect("lock poisoned").raw_title.clone())
    }

    async fn cache_toc(&self) -> Result<(), DeviceError> {
        self.command("cache_toc").await?;
        self.state.lock().expect("lock poisoned").staged_toc = true;
        Ok(())
    }

    async fn sync_toc(&self) -> Result<(), DeviceError> {
        self.command("sync_toc").await?;
        self.state.lock().expect("lock poisoned").staged_toc = false;
        Ok(())
    }

    async fn set_disc_title(&self, title: &str) -> Result<(), DeviceError> {
        self.command("set_disc_title").await?;
        self.state.lock().expect("lock poisoned").raw_title = title.to_string();
        Ok(())
    }

    async fn set_track_title(&self, index: u16, title: &str) -> Result<(), DeviceError> {
        self.command("set_track_title").await?;
        let mut state = self.state.lock().expect("lock poisoned");
        match state.tracks.get_mut(index as usize) {
            Some(track) => {
                track.title = title.to_string();
                Ok(())
            }
            None => Err(DeviceError::Protocol(format!("no track at index {index}"))),
        }
    }

    async fn erase_track(&self, index: u16) -> Result<(), DeviceError> {
        self.command("erase_track").await?;
        let mut state = self.state.lock().expect("lock poisoned");
        if index as usize >= state.tracks.len() {
            return Err(DeviceError::Protocol(format!("no track at index {index}")));
        }
        state.tracks.remove(index as usize);
        // Later tracks shift down by one.
        for (i, track) in state.tracks.iter_mut().enumerate() {
            track.index = i as u16;
        }
        Ok(())
    }

    async fn erase_disc(&self) -> Result<(), DeviceError> {
        self.command("erase_disc").await?;
        let mut state = self.state.lock().expect("lock poisoned");
        state.tracks.clear();
        state.raw_title.clear();
        Ok(())
    }

    async fn move_track(&self, src: u16, dst: u16) -> Result<(), DeviceError> {
        self.command("move_track").await?;
        let mut state = self.state.lock().expect("lock poisoned");
        if src as usize >= state.tracks.len() || dst as usize >= state.tracks.len() {
            return Err(DeviceError::Protocol(format!(
                "move {src} -> {dst} out of range"
            )));
        }
        let track = state.tracks.remove(src as usize);
        state.tracks.insert(dst as usize, track);
        for (i, track) in state.tracks.iter_mut().enumerate() {
            track.index = i as u16;
        }
        Ok(())
    }

    async fn finalize(&self) -> Result<(), DeviceError> {
        self.command("finalize").await
    }

    async fn play(&self) -> Result<(), DeviceError> {
        self.command("play").await?;
        let mut state = self.state.lock().expect("lock poisoned");
        state.playback = PlaybackState::Playing;
        if state.current_track.is_none() && !state.tracks.is_empty() {
            state.current_track = Some(0);
        }
        Ok(())
    }

    async fn pause(&self) -> Result<(), DeviceError> {
        self.command("pause").await?;
        self.state.lock().expect("lock poisoned").playback = PlaybackState::Paused;
        Ok(())
    }

    async fn stop(&self) -> Result<(), DeviceError> {
        self.command("stop").await?;
        let mut state = self.state.lock().expect("lock poisoned");
        state.playback = PlaybackState::Standby;
        state.current_track = None;
        Ok(())
    }

    async fn next_track(&self) -> Result<(), DeviceError> {
        self.command("next_track").await?;
        let mut state = self.state.lock().expect("lock poisoned");
        let last = state.tracks.len().saturating_sub(1) as u16;
        state.current_track = state.current_track.map(|t| (t + 1).min(last));
        Ok(())
    }

    async fn previous_track(&self) -> Result<(), DeviceError> {
        self.command("previous_track").await?;
        let mut state = self.state.lock().expect("lock poisoned");
        state.current_track = state.current_track.map(|t| t.saturating_sub(1));
        Ok(())
    }

    async fn goto_track(&self, index: u16) -> Result<(), DeviceError> {
        self.command("goto_track").await?;
        self.state.lock().expect("lock poisoned").current_track = Some(index);
        Ok(())
    }

    async fn position(&self) -> Result<Option<PlaybackPosition>, DeviceError> {
        self.command("position").await?;
        let state = self.state.lock().expect("lock poisoned");
        Ok(state.current_track.map(|track| PlaybackPosition {
            track,
            minute: 0,
            second: 12,
            frame: 0,
        }))
    }

    async fn download(
        &self,
        unit: TransferUnit,
        mut packets: mpsc::Receiver<EncryptedPacket>,
        on_write: WriteProgress,
    ) -> Result<(), DeviceError> {
        self.command("download").await?;

        let fail_after = *self.fail_download_after.lock().expect("lock poisoned");
        let mut written: u64 = 0;
        let mut consumed = 0usize;

        while let Some(packet) = packets.recv().await {
            if fail_after.is_some_and(|n| consumed >= n) {
                return Err(DeviceError::Transfer(
                    "device write failed mid-track".to_string(),
                ));
            }
            // Writing one packet takes one command round-trip on the wire.
            tokio::time::sleep(self.op_delay).await;
            written += packet.len() as u64;
            consumed += 1;
            on_write(written);
        }

        if written != unit.total_bytes {
            return Err(DeviceError::Transfer(format!(
                "packet stream ended early: {written} of {} bytes",
                unit.total_bytes
            )));
        }

        let mut state = self.state.lock().expect("lock poisoned");
        let index = state.tracks.len() as u16;
        let encoding = match unit.format {
            Wireformat::Pcm => TrackEncoding::Sp,
            Wireformat::L105kbps | Wireformat::Lp2 => TrackEncoding::Lp2,
            Wireformat::Lp4 => TrackEncoding::Lp4,
        };
        state.tracks.push(Track {
            index,
            title: unit.title,
            encoding,
            duration_seconds: (unit.total_bytes / 1024) as u32,
        });
        Ok(())
    }
}

/// [`DeviceConnector`] handing out a pre-built [`InMemoryDevice`].
pub struct InMemoryConnector {
    device: Mutex<Option<Arc<InMemoryDevice>>>,
}

impl InMemoryConnector {
    /// A connector that will successfully open `device`.
    pub fn new(device: Arc<InMemoryDevice>) -> Self {
        Self {
            device: Mutex::new(Some(device)),
        }
    }

    /// A connector with no device attached; `open_*` returns `None`.
    pub fn empty() -> Self {
        Self {
            device: Mutex::new(None),
        }
    }
}

#[async_trait]
impl DeviceConnector for InMemoryConnector {
    async fn open_new(&self) -> Option<Arc<dyn DeviceInterface>> {
        self.device
            .lock()
            .expect("lock poisoned")
            .clone()
            .map(|d| d as Arc<dyn DeviceInterface>)
    }

    async fn open_paired(&self) -> Option<Arc<dyn DeviceInterface>> {
        self.open_new().await
    }
}

/// Progress recorder shared by upload tests.
///
/// Collects every [`TransferProgress`] callback for later assertions on
/// monotonicity and final totals.
#[derive(Debug, Default)]
pub struct ProgressRecorder {
    snapshots: Mutex<Vec<TransferProgress>>,
}

impl ProgressRecorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn record(&self, progress: TransferProgress) {
        self.snapshots.lock().expect("lock poisoned").push(progress);
    }

    pub fn snapshots(&self) -> Vec<TransferProgress> {
        self.snapshots.lock().expect("lock poisoned").clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_erase_track_reindexes_later_tracks() {
        // Arrange
        let device = InMemoryDevice::with_titles("Disc", &["one", "two", "three"]);

        // Act
        device.erase_track(0).await.unwrap();

        // Assert
        let disc = device.list_content().await.unwrap();
        assert_eq!(disc.track_count, 2);
        assert_eq!(disc.tracks[0].index, 0);
        assert_eq!(disc.tracks[0].title, "two");
        assert_eq!(disc.tracks[1].index, 1);
    }

    #[tokio::test]
    async fn test_list_content_reports_capacity() {
        // Arrange – two 240-second tracks on an 80-minute disc
        let device = InMemoryDevice::with_titles("Disc", &["a", "b"]);

        // Act
        let disc = device.list_content().await.unwrap();

        // Assert
        assert_eq!(disc.total, 80 * 60);
        assert_eq!(disc.used, 480);
        assert_eq!(disc.left, disc.total - disc.used);
    }

    #[tokio::test]
    async fn test_move_track_is_remove_then_reinsert() {
        // Arrange
        let device = InMemoryDevice::with_titles("Disc", &["a", "b", "c"]);

        // Act
        device.move_track(0, 2).await.unwrap();

        // Assert
        assert_eq!(device.track_titles(), vec!["b", "c", "a"]);
    }

    #[tokio::test]
    async fn test_fail_next_is_one_shot() {
        // Arrange
        let device = InMemoryDevice::with_titles("Disc", &["a"]);
        device.fail_next("play");

        // Act + Assert
        assert!(device.play().await.is_err());
        assert!(device.play().await.is_ok());
    }

    #[tokio::test]
    async fn test_position_none_when_stopped() {
        // Arrange
        let device = InMemoryDevice::with_titles("Disc", &["a"]);

        // Act
        device.play().await.unwrap();
        assert!(device.position().await.unwrap().is_some());
        device.stop().await.unwrap();

        // Assert
        assert_eq!(device.position().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_empty_connector_opens_nothing() {
        let connector = InMemoryConnector::empty();
        assert!(connector.open_new().await.is_none());
        assert!(connector.open_paired().await.is_none());
    }
}
