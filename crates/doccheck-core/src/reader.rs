//! Source readers
//!
//! The parsing stage obtains raw text through a [`SourceReader`] so checks can
//! run against the filesystem or against in-memory documents.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

pub trait SourceReader: Send + Sync {
    fn read(&self, path: &Path) -> io::Result<String>;
}

/// Reads UTF-8 files from disk
#[derive(Debug, Clone, Copy, Default)]
pub struct FsReader;

impl SourceReader for FsReader {
    fn read(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// Serves documents registered by path; unknown paths are `NotFound`
#[derive(Debug, Clone, Default)]
pub struct MemoryReader {
    documents: HashMap<PathBuf, String>,
}

impl MemoryReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        self.insert(path, text);
        self
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, text: impl Into<String>) {
        self.documents.insert(path.into(), text.into());
    }
}

impl SourceReader for MemoryReader {
    fn read(&self, path: &Path) -> io::Result<String> {
        self.documents.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no document at '{}'", path.display()),
            )
        })
    }
}
