#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Declarative build descriptors
//!
//! A descriptor is an in-memory model that knows the one file it writes
//! under a workspace. Three kinds exist:
//!
//! - [`ProjectDescriptor`]: root attributes plus a [`PropertyGroup`] and an
//!   [`ItemGroup`], serialized as project markup
//! - [`SdkPinDescriptor`]: the SDK version pin, serialized as JSON
//! - [`SourceFile`]: verbatim text such as a compilation unit
//!
//! All of them implement [`DescriptorBuilder`], which is what the build
//! orchestrator registers and materializes.

mod builder;
mod item;
mod project;
mod property;
mod sdk;
mod source;
mod xml;

pub use builder::DescriptorBuilder;
pub use item::{Assets, Item, ItemGroup, ItemKind, Reference};
pub use project::{Nullable, OutputType, ProjectDescriptor};
pub use property::{Property, PropertyGroup, PropertyKey};
pub use sdk::{RollForward, SdkPinDescriptor};
pub use source::SourceFile;
