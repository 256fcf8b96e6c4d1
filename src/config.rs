//! Runtime configuration and access to the compiled-in guide document.

use crate::counter::ClickCounter;
use crate::guide::{GuideSource, LoadError};
use crate::render::{DEFAULT_VIDEO_HUB_URL, PageOptions};
use crate::strategy::DEFAULT_PLAYBOOK_URL;
use once_cell::sync::Lazy;
use std::io::Cursor;
use std::path::PathBuf;
use zstd::stream::decode_all;

static EMBEDDED_BYTES: &[u8] = include_bytes!(env!("PLAYBOOK_GUIDES"));

static EMBEDDED_JSON: Lazy<Result<Vec<u8>, String>> =
    Lazy::new(|| decode_all(Cursor::new(EMBEDDED_BYTES)).map_err(|err| err.to_string()));

/// The guide document validated and compressed by the build script.
pub fn embedded_guides() -> Result<GuideSource, LoadError> {
    let bytes = EMBEDDED_JSON
        .as_ref()
        .map_err(|err| LoadError::Embedded(err.clone()))?;
    GuideSource::from_slice(bytes)
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GuidesLocation {
    #[default]
    Embedded,
    /// Re-read on every load so edits show up without a restart.
    File(PathBuf),
}

#[derive(Debug, Clone)]
pub struct PlaybookConfig {
    pub guides: GuidesLocation,
    pub playbook_url: String,
    pub video_hub_url: String,
    pub counter_path: Option<PathBuf>,
}

impl Default for PlaybookConfig {
    fn default() -> Self {
        Self {
            guides: GuidesLocation::Embedded,
            playbook_url: DEFAULT_PLAYBOOK_URL.to_string(),
            video_hub_url: DEFAULT_VIDEO_HUB_URL.to_string(),
            counter_path: None,
        }
    }
}

impl PlaybookConfig {
    pub fn load_guides(&self) -> Result<GuideSource, LoadError> {
        match &self.guides {
            GuidesLocation::Embedded => embedded_guides(),
            GuidesLocation::File(path) => GuideSource::load(path),
        }
    }

    /// Page inputs for one visit. Empty referral ids count as absent.
    pub fn page_options(&self, ref_id: Option<&str>) -> PageOptions {
        PageOptions {
            ref_id: ref_id
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string),
            playbook_url: self.playbook_url.clone(),
            video_hub_url: self.video_hub_url.clone(),
        }
    }

    pub fn counter(&self) -> ClickCounter {
        match &self.counter_path {
            Some(path) => ClickCounter::persistent(path),
            None => ClickCounter::ephemeral(),
        }
    }
}
