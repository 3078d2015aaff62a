//! Title handling for the device's 7-bit title fields.
//!
//! Two independent concerns live here:
//!
//! - **`sanitize`** – Narrowing arbitrary user text into the character
//!   subset the device can actually store. Lossy by design.
//!
//! - **`group`** – The disc title is a single string field, but devices
//!   overload it to also carry the disc's group table (named sub-ranges of
//!   tracks). Rewriting the disc title without understanding that encoding
//!   would silently destroy every group on the disc, so all disc-title
//!   writes go through this codec.

pub mod group;
pub mod sanitize;
