//! Descriptor model error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum DescriptorError {
    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("failed to serialize {path}: {message}")]
    SerializeFailed { path: String, message: String },

    #[error("failed to write {path}: {message}")]
    WriteFailed { path: String, message: String },
}

impl UserFacingError for DescriptorError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::InvalidArgument { .. } => "descriptor.invalid_argument",
            Self::SerializeFailed { .. } => "descriptor.serialize_failed",
            Self::WriteFailed { .. } => "descriptor.write_failed",
        })
    }
}
