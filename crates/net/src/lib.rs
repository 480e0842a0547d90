#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Network operations for sandbuild
//!
//! A single pooled HTTP client with bounded retries. Used to fetch the
//! packaging tool when no local one is expected.

mod client;

pub use client::{NetClient, NetConfig};
pub use tokio_util::sync::CancellationToken;

