#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Build orchestration for sandbuild
//!
//! [`BuildOrchestrator`] owns a workspace, the descriptor builders
//! registered against it and an optional local package builder. A build
//! writes every descriptor, runs the toolchain's restore and build phases
//! with their output captured, then reads the structured report the
//! toolchain wrote and adds the diagnostics that only appeared in the
//! captured output.

mod orchestrator;
mod process;

pub use orchestrator::BuildOrchestrator;
pub use sandbuild_diagnostics::{DiagnosticReport, Level, ResultEntry, Run};
pub use tokio_util::sync::CancellationToken;
