//! SDK-pin descriptor

use crate::builder::{write_contents, DescriptorBuilder};
use async_trait::async_trait;
use sandbuild_config::constants::SDK_PIN_FILE;
use sandbuild_errors::{DescriptorError, Error};
use sandbuild_workspace::Subdirectory;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// How the toolchain may resolve a newer SDK than the pinned one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RollForward {
    Disable,
    Patch,
    Feature,
    Minor,
    Major,
    LatestPatch,
    LatestFeature,
    LatestMinor,
    LatestMajor,
}

impl RollForward {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disable => "disable",
            Self::Patch => "patch",
            Self::Feature => "feature",
            Self::Minor => "minor",
            Self::Major => "major",
            Self::LatestPatch => "latestPatch",
            Self::LatestFeature => "latestFeature",
            Self::LatestMinor => "latestMinor",
            Self::LatestMajor => "latestMajor",
        }
    }

    const ALL: [Self; 9] = [
        Self::Disable,
        Self::Patch,
        Self::Feature,
        Self::Minor,
        Self::Major,
        Self::LatestPatch,
        Self::LatestFeature,
        Self::LatestMinor,
        Self::LatestMajor,
    ];
}

impl fmt::Display for RollForward {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RollForward {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|policy| policy.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                DescriptorError::InvalidArgument {
                    name: "roll_forward".to_string(),
                    message: format!("unknown policy {s:?}"),
                }
                .into()
            })
    }
}

#[derive(Serialize)]
struct PinDocument<'a> {
    sdk: SdkSection<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SdkSection<'a> {
    version: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    allow_prerelease: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    roll_forward: Option<RollForward>,
}

/// Pins the toolchain SDK version for the workspace
#[derive(Debug, Clone)]
pub struct SdkPinDescriptor {
    dir: Subdirectory,
    version: String,
    allow_prerelease: Option<bool>,
    roll_forward: Option<RollForward>,
}

impl SdkPinDescriptor {
    /// # Errors
    ///
    /// Returns `DescriptorError::InvalidArgument` for a blank version.
    pub fn new(dir: &Subdirectory, version: impl Into<String>) -> Result<Self, Error> {
        let version = version.into();
        if version.trim().is_empty() {
            return Err(DescriptorError::InvalidArgument {
                name: "version".to_string(),
                message: "must not be blank".to_string(),
            }
            .into());
        }
        Ok(Self {
            dir: dir.clone(),
            version,
            allow_prerelease: None,
            roll_forward: None,
        })
    }

    #[must_use]
    pub fn with_allow_prerelease(mut self, allow: bool) -> Self {
        self.allow_prerelease = Some(allow);
        self
    }

    #[must_use]
    pub fn with_roll_forward(mut self, policy: RollForward) -> Self {
        self.roll_forward = Some(policy);
        self
    }

    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    #[must_use]
    pub fn allow_prerelease(&self) -> Option<bool> {
        self.allow_prerelease
    }

    #[must_use]
    pub fn roll_forward(&self) -> Option<RollForward> {
        self.roll_forward
    }

    /// Pretty-printed document; unset fields are left out
    ///
    /// # Errors
    ///
    /// Returns `DescriptorError::SerializeFailed` if encoding fails.
    pub fn to_json(&self) -> Result<String, Error> {
        let doc = PinDocument {
            sdk: SdkSection {
                version: &self.version,
                allow_prerelease: self.allow_prerelease,
                roll_forward: self.roll_forward,
            },
        };
        serde_json::to_string_pretty(&doc).map_err(|e| {
            DescriptorError::SerializeFailed {
                path: self.path().display().to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }
}

#[async_trait]
impl DescriptorBuilder for SdkPinDescriptor {
    fn dir(&self) -> &Subdirectory {
        &self.dir
    }

    fn relative_path(&self) -> &Path {
        Path::new(SDK_PIN_FILE)
    }

    async fn create(&self) -> Result<(), Error> {
        let json = self.to_json()?;
        write_contents(&self.dir, SDK_PIN_FILE, json.as_bytes()).await
    }
}
