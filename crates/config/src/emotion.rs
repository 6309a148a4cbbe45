//! Emotion→motion registry
//!
//! A static mapping from emotion label to candidate motion files, plus a
//! fixed ordered list assigning each motion file its index in the avatar's
//! motion table. Loaded once at startup; a missing or unparsable file is
//! fatal (the pipeline must not start without it).

use std::collections::HashMap;
use std::path::Path;

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// On-disk shape of the registry
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EmotionConfigFile {
    /// emotion label → candidate motion files
    #[serde(default)]
    emotion_actions: HashMap<String, Vec<String>>,
    /// ordered motion table; position is the avatar motion index
    #[serde(default = "default_motion_files")]
    motion_files: Vec<String>,
}

fn default_motion_files() -> Vec<String> {
    [
        "Hiyori_m02.motion3.json",
        "Hiyori_m03.motion3.json",
        "Hiyori_m04.motion3.json",
        "Hiyori_m05.motion3.json",
        "Hiyori_m06.motion3.json",
        "Hiyori_m07.motion3.json",
        "Hiyori_m08.motion3.json",
        "Hiyori_m09.motion3.json",
        "micoff.motion3.json",
        "micon.motion3.json",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// A motion chosen for one recognized marker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMotion {
    pub motion_file: String,
    pub motion_index: usize,
}

/// Emotion label → motion lookup, resolved uniformly at random
#[derive(Debug, Clone)]
pub struct EmotionRegistry {
    actions: HashMap<String, Vec<String>>,
    motion_index: HashMap<String, usize>,
}

impl EmotionRegistry {
    /// Load the registry from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound(path.display().to_string()))?;
        let file: EmotionConfigFile =
            serde_json::from_str(&raw).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        tracing::info!(
            labels = file.emotion_actions.len(),
            motions = file.motion_files.len(),
            "Loaded emotion registry"
        );

        Ok(Self::from_parts(file.emotion_actions, file.motion_files))
    }

    /// Build a registry from in-memory parts
    pub fn from_parts(
        actions: HashMap<String, Vec<String>>,
        motion_files: Vec<String>,
    ) -> Self {
        let motion_index = motion_files
            .into_iter()
            .enumerate()
            .map(|(index, file)| (file, index))
            .collect();
        Self {
            actions,
            motion_index,
        }
    }

    /// Whether a marker label is in the emotion table
    pub fn is_known(&self, label: &str) -> bool {
        self.actions.contains_key(label)
    }

    /// Known labels, for diagnostics
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }

    /// Resolve a label to a motion, choosing uniformly among its candidates
    ///
    /// Returns None for unknown labels and for candidates missing from the
    /// motion table.
    pub fn resolve(&self, label: &str) -> Option<ResolvedMotion> {
        let candidates = self.actions.get(label)?;
        let file = candidates.choose(&mut rand::thread_rng())?;
        let index = *self.motion_index.get(file)?;
        Some(ResolvedMotion {
            motion_file: file.clone(),
            motion_index: index,
        })
    }
}
