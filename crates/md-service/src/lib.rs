//! md-service library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and any UI bridge built on top share the same module tree.
//!
//! # Architecture
//!
//! ```text
//! UI layer
//!  └─ DeviceService (application::device_service)
//!       ├─ CommandSerializer   -- one command in flight at a time
//!       ├─ UploadPipeline      -- encrypt + write stages, unified progress
//!       └─ dyn DeviceInterface -- external NetMD library behind a trait
//! ```

pub mod application;
pub mod infrastructure;

pub use application::device_service::DeviceService;
pub use infrastructure::device::{
    DeviceConnector, DeviceError, DeviceInterface, EncryptedPacket, PacketEncryptor, TransferUnit,
};
pub use infrastructure::storage::config::ServiceConfig;
