//! Infrastructure layer: the seams to everything outside this crate.
//!
//! - **`device`** – Traits modelling the external NetMD device-interface
//!   library (USB framing, vendor commands, and ATRAC encryption live
//!   there, not here), plus an in-memory fake for tests.
//!
//! - **`storage`** – TOML configuration persistence.

pub mod device;
pub mod storage;
