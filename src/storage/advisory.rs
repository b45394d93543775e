//! Advisory backing: one JSON history file per subject.

use std::{collections::BTreeMap, fs, io, path::PathBuf};

use crate::model::AdvisoryRecord;

use super::{AdvisoryBacking, Result};

/// Directory of `<subject>.json` files, each holding one farmer's ordered
/// advisory history. The directory itself is the subject → history map.
pub struct FileAdvisories {
    dir: PathBuf,
}

impl FileAdvisories {
    /// Creates the backing, creating its directory if needed.
    pub fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn subject_path(&self, subject: &str) -> PathBuf {
        self.dir.join(format!("{subject}.json"))
    }
}

impl AdvisoryBacking for FileAdvisories {
    fn load(&self) -> Result<BTreeMap<String, Vec<AdvisoryRecord>>> {
        let mut histories = BTreeMap::new();
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(histories),
            Err(e) => return Err(e.into()),
        };
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(subject) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let json = fs::read_to_string(&path)?;
            histories.insert(subject.to_string(), serde_json::from_str(&json)?);
        }
        Ok(histories)
    }

    fn save_subject(&self, subject: &str, history: &[AdvisoryRecord]) -> Result<()> {
        let json = serde_json::to_string_pretty(history)?;
        fs::write(self.subject_path(subject), json)?;
        Ok(())
    }
}
