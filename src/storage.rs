// SPDX-License-Identifier: MPL-2.0

//! Storage for captured photos and videos
//!
//! Output names follow `<PREFIX>_<yyyyMMdd_HHmmss>_<suffix>.<ext>`, where the
//! random suffix keeps names unique when several captures land in the same
//! second.

use crate::backends::camera::FileSink;
use crate::config::Config;
use crate::constants::storage::{
    IMAGE_EXTENSION, IMAGE_PREFIX, TIMESTAMP_FORMAT, UNIQUE_SUFFIX_LEN, VIDEO_EXTENSION,
    VIDEO_PREFIX,
};
use chrono::Local;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File sink writing stills and naming recordings on the local disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaStorage {
    picture_dir: PathBuf,
    video_dir: PathBuf,
}

impl MediaStorage {
    pub fn new(picture_dir: impl Into<PathBuf>, video_dir: impl Into<PathBuf>) -> Self {
        Self {
            picture_dir: picture_dir.into(),
            video_dir: video_dir.into(),
        }
    }

    /// Storage rooted at the configured picture and video directories
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.picture_dir(), config.video_dir())
    }

    pub fn picture_dir(&self) -> &Path {
        &self.picture_dir
    }

    pub fn video_dir(&self) -> &Path {
        &self.video_dir
    }

    /// Path for the next recording, creating the video directory
    pub fn next_video_path(&self) -> std::io::Result<PathBuf> {
        ensure_dir(&self.video_dir)?;
        Ok(self
            .video_dir
            .join(unique_file_name(VIDEO_PREFIX, VIDEO_EXTENSION)))
    }
}

impl FileSink for MediaStorage {
    fn allocate_still_path(&self) -> std::io::Result<PathBuf> {
        ensure_dir(&self.picture_dir)?;
        Ok(self
            .picture_dir
            .join(unique_file_name(IMAGE_PREFIX, IMAGE_EXTENSION)))
    }

    fn write(&self, bytes: &[u8], destination: &Path) -> std::io::Result<()> {
        std::fs::write(destination, bytes)?;
        debug!(path = %destination.display(), size = bytes.len(), "Wrote file");
        Ok(())
    }
}

fn ensure_dir(dir: &Path) -> std::io::Result<()> {
    if !dir.is_dir() {
        std::fs::create_dir_all(dir)?;
        info!(path = %dir.display(), "Created output directory");
    }
    Ok(())
}

/// Timestamped file name with a random suffix
fn unique_file_name(prefix: &str, extension: &str) -> String {
    let timestamp = Local::now().format(TIMESTAMP_FORMAT);
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{}_{}_{}.{}",
        prefix,
        timestamp,
        &suffix[..UNIQUE_SUFFIX_LEN],
        extension
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_format() {
        let name = unique_file_name(IMAGE_PREFIX, IMAGE_EXTENSION);
        assert!(name.starts_with("IMAGE_"));
        assert!(name.ends_with(".jpg"));

        // IMAGE_ + yyyyMMdd_HHmmss + _ + suffix + .jpg
        let stem = name.trim_end_matches(".jpg");
        let parts: Vec<&str> = stem.split('_').collect();
        assert_eq!(parts.len(), 4, "{}", name);
        assert_eq!(parts[1].len(), 8);
        assert_eq!(parts[2].len(), 6);
        assert_eq!(parts[3].len(), UNIQUE_SUFFIX_LEN);
        assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_names_are_unique_within_a_second() {
        let a = unique_file_name(VIDEO_PREFIX, VIDEO_EXTENSION);
        let b = unique_file_name(VIDEO_PREFIX, VIDEO_EXTENSION);
        assert_ne!(a, b);
    }

    #[test]
    fn test_still_path_creates_directory_and_writes() {
        let dir = tempfile::tempdir().unwrap();
        let storage = MediaStorage::new(dir.path().join("pics"), dir.path().join("vids"));

        let path = storage.allocate_still_path().unwrap();
        assert!(storage.picture_dir().is_dir());
        assert_eq!(path.parent(), Some(storage.picture_dir()));

        storage.write(&[0xff, 0xd8, 0xff, 0xd9], &path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), vec![0xff, 0xd8, 0xff, 0xd9]);
    }

    #[test]
    fn test_video_path_in_video_dir() {
        let dir = tempfile::tempdir().unwrap();
        let storage = MediaStorage::new(dir.path().join("pics"), dir.path().join("vids"));

        let path = storage.next_video_path().unwrap();
        assert!(storage.video_dir().is_dir());
        assert!(!storage.picture_dir().exists());
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("mp4"));
    }

    #[test]
    fn test_write_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let storage = MediaStorage::new(dir.path(), dir.path());
        let result = storage.write(b"x", &dir.path().join("missing").join("a.jpg"));
        assert!(result.is_err());
    }
}
