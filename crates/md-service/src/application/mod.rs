//! Application layer use cases for the companion service.
//!
//! Use cases in this layer orchestrate domain types from `md-core` and
//! depend on the infrastructure only through traits, so everything here is
//! unit-testable against the in-memory device fake.
//!
//! # Sub-modules
//!
//! - **`serializer`** – The command serializer: a recorder executes one
//!   command at a time, so every stateful device operation funnels through
//!   a single fair lock regardless of caller concurrency.
//!
//! - **`upload`** – The two-stage upload pipeline: a CPU-bound encryption
//!   stage and a device-write stage running concurrently, coupled by a
//!   bounded packet channel and reporting unified byte progress.
//!
//! - **`device_service`** – The facade the UI talks to: attachment state
//!   machine, content listing, metadata mutation, track management,
//!   playback transport, and upload.

pub mod device_service;
pub mod serializer;
pub mod upload;
