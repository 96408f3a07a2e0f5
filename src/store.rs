use std::{
    fs::{self, create_dir_all, File},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use anyhow::Context;
use log::{debug, info};
use tempfile::NamedTempFile;

/// Persists the marker of the last comic that subscribers were notified about
pub trait MarkerStore {
    /// Returns the stored marker or an empty string if nothing has been stored yet
    fn load_previous(&mut self) -> anyhow::Result<String>;

    /// Replaces the stored marker with `value`
    fn save_previous(&mut self, value: &str) -> anyhow::Result<()>;
}

/// Keeps the marker on the first line of a text file
#[derive(Debug)]
pub struct FileMarkerStore {
    path: PathBuf,
}

impl FileMarkerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    fn create_empty(&self) -> anyhow::Result<()> {
        create_dir_all(self.parent_dir())
            .with_context(|| format!("Failed to create directory for {:?}", self.path))?;
        File::options()
            .write(true)
            .create(true)
            .open(&self.path)
            .with_context(|| format!("Failed to create {:?}", self.path))?;
        Ok(())
    }
}

impl MarkerStore for FileMarkerStore {
    fn load_previous(&mut self) -> anyhow::Result<String> {
        debug!("Loading previous comic name from: {:?}", self.path);
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No previous comic name found. Creating {:?}", self.path);
                self.create_empty()?;
                return Ok(String::new());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read contents of {:?}", self.path))
            }
        };
        Ok(contents.lines().next().unwrap_or_default().to_string())
    }

    fn save_previous(&mut self, value: &str) -> anyhow::Result<()> {
        debug!("Saving {value:?} to {:?}", self.path);
        let dir = self.parent_dir();
        create_dir_all(dir).with_context(|| format!("Failed to create directory {dir:?}"))?;

        // Written beside the target then renamed over it so readers never see a partial value
        let mut tmp = NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temporary file in {dir:?}"))?;
        tmp.write_all(value.as_bytes())
            .with_context(|| format!("Failed to write to {:?}", tmp.path()))?;
        tmp.as_file()
            .sync_all()
            .with_context(|| format!("Failed to flush {:?}", tmp.path()))?;
        tmp.persist(&self.path)
            .with_context(|| format!("Failed to replace {:?}", self.path))?;
        Ok(())
    }
}

/// Keeps the marker in memory, used where no file should be touched
#[derive(Debug, Default, Clone)]
pub struct MemoryMarkerStore {
    value: String,
    saves: usize,
}

impl MemoryMarkerStore {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            saves: 0,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Number of times `save_previous` was called
    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl MarkerStore for MemoryMarkerStore {
    fn load_previous(&mut self) -> anyhow::Result<String> {
        Ok(self.value.clone())
    }

    fn save_previous(&mut self, value: &str) -> anyhow::Result<()> {
        self.value = value.to_string();
        self.saves += 1;
        Ok(())
    }
}
