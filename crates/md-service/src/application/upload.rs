//! UploadPipeline: two-stage encrypt-and-write transfer of one track.
//!
//! An upload splits into an **encryption stage** (CPU-bound, runs on the
//! blocking pool so it never stalls the async write path) and a **write
//! stage** (the device download pulling encrypted packets). The stages run
//! concurrently and are coupled by a bounded channel:
//!
//! ```text
//! payload chunks ──► spawn_blocking worker ──► bounded mpsc ──► download
//!                    (PacketEncryptor)          depth = N        (device)
//!         encrypted bytes ─┘                                       └─ written bytes
//!                           └──────── unified progress ────────────┘
//! ```
//!
//! The channel bound caps how far encryption may run ahead of the device,
//! which caps memory use for large payloads. Both stages report cumulative
//! byte counters that merge into one `{written, encrypted, total}` progress
//! callback.
//!
//! The pipeline must not run concurrently with serialized device commands;
//! the write stage needs uninterrupted device access for the whole job, so
//! upload deliberately does not pass through the command serializer and the
//! UI layer is responsible for not overlapping the two.

use std::sync::{Arc, Mutex};

use md_core::{sanitize_title, TransferProgress, Wireformat};
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use crate::infrastructure::device::{
    DeviceError, DeviceInterface, PacketEncryptor, TransferUnit,
};

/// Callback invoked with a progress snapshot after every counter update.
pub type ProgressCallback = Arc<dyn Fn(TransferProgress) + Send + Sync>;

/// Unified progress state for one job.
///
/// Updates and callback invocation happen under one lock so the sequence
/// observed by the callback is monotone in both counters even though the
/// two stages run on different threads.
struct ProgressSink {
    state: Mutex<TransferProgress>,
    callback: ProgressCallback,
}

impl ProgressSink {
    fn new(total: u64, callback: ProgressCallback) -> Self {
        Self {
            state: Mutex::new(TransferProgress {
                written: 0,
                encrypted: 0,
                total,
            }),
            callback,
        }
    }

    fn report_encrypted(&self, cumulative: u64) {
        let mut state = self.state.lock().expect("lock poisoned");
        state.encrypted = state.encrypted.max(cumulative);
        (self.callback)(*state);
    }

    fn report_written(&self, cumulative: u64) {
        let mut state = self.state.lock().expect("lock poisoned");
        state.written = state.written.max(cumulative);
        (self.callback)(*state);
    }
}

/// Orchestrates the encrypt + write stages of one upload job.
#[derive(Debug, Clone, Copy)]
pub struct UploadPipeline {
    chunk_size: usize,
    channel_depth: usize,
}

impl UploadPipeline {
    /// `chunk_size` is the payload bytes handed to the encryptor per
    /// packet; `channel_depth` is the packet read-ahead bound.
    pub fn new(chunk_size: usize, channel_depth: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            channel_depth: channel_depth.max(1),
        }
    }

    /// Runs one complete upload job to `device`.
    ///
    /// Sanitizes `title`, encrypts `payload` chunk by chunk off the async
    /// runtime, streams the packets to the device, and reports unified
    /// progress. The encryption worker is torn down unconditionally before
    /// this returns, on success and on failure alike.
    ///
    /// # Errors
    ///
    /// Any failure in either stage aborts the whole job. Partial
    /// device-side writes are not rolled back; callers should re-list
    /// content to reconcile.
    pub async fn run(
        &self,
        device: Arc<dyn DeviceInterface>,
        encryptor: Arc<dyn PacketEncryptor>,
        title: &str,
        payload: Vec<u8>,
        format: Wireformat,
        on_progress: ProgressCallback,
    ) -> Result<(), DeviceError> {
        let job = Uuid::new_v4();
        let title = sanitize_title(title);
        let total = payload.len() as u64;
        debug!(%job, %title, total, "upload starting");

        let sink = Arc::new(ProgressSink::new(total, on_progress));
        let (tx, rx) = mpsc::channel(self.channel_depth);

        // ── Encryption stage ──────────────────────────────────────────────────
        let chunk_size = self.chunk_size;
        let worker_sink = Arc::clone(&sink);
        let worker = tokio::task::spawn_blocking(move || {
            let mut encrypted: u64 = 0;
            for chunk in payload.chunks(chunk_size) {
                let packet = encryptor.encrypt_chunk(chunk);
                encrypted += chunk.len() as u64;
                worker_sink.report_encrypted(encrypted);
                if tx.blocking_send(packet).is_err() {
                    // The write stage dropped the receiver (download ended,
                    // successfully or not). Stop encrypting.
                    break;
                }
            }
        });

        // ── Write stage ───────────────────────────────────────────────────────
        let unit = TransferUnit {
            title,
            format,
            total_bytes: total,
        };
        let write_sink = Arc::clone(&sink);
        let result = device
            .download(
                unit,
                rx,
                Box::new(move |written| write_sink.report_written(written)),
            )
            .await;

        // Tear down the encryption worker unconditionally. `download` has
        // dropped the receiver by now, so a worker blocked on a full
        // channel unblocks and exits; this join happens exactly once per
        // job, success or failure.
        let joined = worker.await;

        match result {
            Ok(()) => debug!(%job, "upload complete"),
            Err(ref e) => debug!(%job, error = %e, "upload failed"),
        }
        result?;
        joined.map_err(|e| DeviceError::Transfer(format!("encryption worker panicked: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::device::mock::{InMemoryDevice, ProgressRecorder};
    use crate::infrastructure::device::{EncryptedPacket, MockPacketEncryptor};

    fn recording_callback(recorder: &Arc<ProgressRecorder>) -> ProgressCallback {
        let recorder = Arc::clone(recorder);
        Arc::new(move |p| recorder.record(p))
    }

    #[tokio::test]
    async fn test_every_chunk_is_encrypted_exactly_once() {
        // Arrange – 4 chunks of 8 bytes
        let device = InMemoryDevice::with_titles("Disc", &[]);
        let mut mock = MockPacketEncryptor::new();
        mock.expect_encrypt_chunk()
            .times(4)
            .returning(|chunk| EncryptedPacket {
                iv: [0u8; 8],
                data: chunk.to_vec(),
            });
        let pipeline = UploadPipeline::new(8, 2);

        // Act
        pipeline
            .run(
                device.clone(),
                Arc::new(mock),
                "Uploaded",
                vec![0u8; 32],
                Wireformat::Lp2,
                Arc::new(|_| {}),
            )
            .await
            .unwrap();

        // Assert – the track landed on the disc
        assert_eq!(device.track_titles(), vec!["Uploaded"]);
    }

    #[tokio::test]
    async fn test_title_is_sanitized_before_transfer() {
        // Arrange
        let device = InMemoryDevice::with_titles("Disc", &[]);
        let mut mock = MockPacketEncryptor::new();
        mock.expect_encrypt_chunk().returning(|chunk| EncryptedPacket {
            iv: [0u8; 8],
            data: chunk.to_vec(),
        });
        let pipeline = UploadPipeline::new(16, 2);

        // Act
        pipeline
            .run(
                device.clone(),
                Arc::new(mock),
                "Café",
                vec![0u8; 16],
                Wireformat::Pcm,
                Arc::new(|_| {}),
            )
            .await
            .unwrap();

        // Assert
        assert_eq!(device.track_titles(), vec!["Cafe"]);
    }

    #[tokio::test]
    async fn test_progress_counters_are_monotone_and_complete() {
        // Arrange
        let device = InMemoryDevice::with_titles("Disc", &[]);
        let mut mock = MockPacketEncryptor::new();
        mock.expect_encrypt_chunk().returning(|chunk| EncryptedPacket {
            iv: [0u8; 8],
            data: chunk.to_vec(),
        });
        let recorder = ProgressRecorder::new();
        let pipeline = UploadPipeline::new(8, 2);

        // Act
        pipeline
            .run(
                device,
                Arc::new(mock),
                "t",
                vec![0u8; 64],
                Wireformat::Lp2,
                recording_callback(&recorder),
            )
            .await
            .unwrap();

        // Assert
        let snapshots = recorder.snapshots();
        assert!(!snapshots.is_empty());
        for pair in snapshots.windows(2) {
            assert!(pair[1].written >= pair[0].written);
            assert!(pair[1].encrypted >= pair[0].encrypted);
        }
        for p in &snapshots {
            assert!(p.written <= p.total);
            assert!(p.encrypted <= p.total);
            assert_eq!(p.total, 64);
        }
        assert_eq!(snapshots.last().unwrap().written, 64);
    }

    #[tokio::test]
    async fn test_empty_payload_completes_with_no_packets() {
        // Arrange
        let device = InMemoryDevice::with_titles("Disc", &[]);
        let mock = MockPacketEncryptor::new(); // zero expected calls
        let pipeline = UploadPipeline::new(8, 2);

        // Act + Assert
        pipeline
            .run(
                device,
                Arc::new(mock),
                "empty",
                Vec::new(),
                Wireformat::Pcm,
                Arc::new(|_| {}),
            )
            .await
            .unwrap();
    }
}
