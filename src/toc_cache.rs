//! # On-disk TOC cache
//!
//! Downloading the log and param tables of content is the slowest part of connecting to a Crazyflie. The
//! Crazyflie library identifies a TOC by its CRC32 and asks a [TocCache] for it before downloading it. This
//! implementation keeps one JSON file per TOC in a directory, so later connections to the same firmware are fast.

use std::path::{Path, PathBuf};

use crazyflie_lib::TocCache;

/// # Directory backed TOC cache
///
/// Files are named after the CRC32 of the TOC, in uppercase hex: `<dir>/1A2B3C4D.json`. A file that cannot be read
/// is a cache miss; a file that cannot be written is logged and skipped.
#[derive(Debug, Clone, Default)]
pub struct FileTocCache {
    dir: Option<PathBuf>,
}

impl FileTocCache {
    /// Cache TOCs in `dir`. The directory is created on first store.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileTocCache {
            dir: Some(dir.into()),
        }
    }

    /// A cache that never hits and never writes
    pub fn disabled() -> Self {
        FileTocCache { dir: None }
    }

    /// Build from an optional directory, `None` disables the cache
    pub fn from_dir(dir: Option<&Path>) -> Self {
        match dir {
            Some(dir) => Self::new(dir),
            None => Self::disabled(),
        }
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    fn entry_path(&self, crc32: u32) -> Option<PathBuf> {
        self.dir
            .as_ref()
            .map(|dir| dir.join(format!("{:08X}.json", crc32)))
    }
}

impl TocCache for FileTocCache {
    fn get_toc(&self, crc32: u32) -> Option<String> {
        let path = self.entry_path(crc32)?;
        match std::fs::read_to_string(&path) {
            Ok(toc) => {
                log::debug!("TOC {:08X} loaded from {}", crc32, path.display());
                Some(toc)
            }
            Err(_) => None,
        }
    }

    fn store_toc(&self, crc32: u32, toc: &str) {
        let (dir, path) = match (self.dir.as_ref(), self.entry_path(crc32)) {
            (Some(dir), Some(path)) => (dir, path),
            _ => return,
        };

        let result = std::fs::create_dir_all(dir).and_then(|_| std::fs::write(&path, toc));
        if let Err(e) = result {
            log::warn!("Cannot write TOC cache {}: {}", path.display(), e);
        }
    }
}
