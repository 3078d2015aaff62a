//! Domain entities for the MiniDisc companion service.
//!
//! This module contains pure data types with no infrastructure dependencies:
//! no USB, no async runtime, no file system. Everything here can be
//! constructed and inspected in a plain unit test.
//!
//! The shapes mirror what the external device-interface library reports
//! when listing a disc, so the service layer can hand them to a UI without
//! another translation step.

/// Disc, track, status, and transfer-progress entities.
///
/// See [`disc::Disc`] for the main type.
pub mod disc;
