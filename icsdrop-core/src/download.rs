//! Single-event downloads.
//!
//! A download stages the payload in an ephemeral [`Blob`], hands it to a
//! [`SaveTarget`] and releases the blob before returning, whether or not
//! the save succeeded.

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::constants::ICS_MIME_TYPE;
use crate::error::{IcsDropError, IcsDropResult};
use crate::event::CalendarEvent;
use crate::ics::{generate_filename, generate_ics};

/// How many `Name (n).ics` variants are tried before giving up
const MAX_DUPLICATE_NAMES: usize = 1000;

/// An ephemeral, file-backed payload. The backing file is removed when the
/// blob is released or dropped.
#[derive(Debug)]
pub struct Blob {
    file: NamedTempFile,
    mime_type: &'static str,
    len: usize,
}

impl Blob {
    pub fn new_in(dir: &Path, payload: &[u8], mime_type: &'static str) -> IcsDropResult<Self> {
        let mut file = tempfile::Builder::new()
            .prefix(".icsdrop-")
            .suffix(".part")
            .tempfile_in(dir)?;
        file.write_all(payload)?;
        file.flush()?;

        log::debug!("Staged {} bytes at {}", payload.len(), file.path().display());
        Ok(Blob {
            file,
            mime_type,
            len: payload.len(),
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn mime_type(&self) -> &'static str {
        self.mime_type
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// A fresh read handle positioned at the start of the payload.
    pub fn reopen(&self) -> IcsDropResult<File> {
        Ok(self.file.reopen()?)
    }

    /// Delete the backing file, reporting failures instead of ignoring them.
    pub fn release(self) -> IcsDropResult<()> {
        let path = self.file.path().to_path_buf();
        self.file.close()?;
        log::debug!("Released {}", path.display());
        Ok(())
    }
}

/// Where downloads end up
pub trait SaveTarget {
    /// Directory in which blobs for this target are staged
    fn staging_dir(&self) -> PathBuf {
        std::env::temp_dir()
    }

    /// Save a copy of `blob` as `filename`, returning the final location.
    fn save(&mut self, filename: &str, blob: &Blob) -> IcsDropResult<PathBuf>;
}

/// Saves into a directory. Existing files are never overwritten: a second
/// `Standup.ics` is saved as `Standup (1).ics`, and so on.
#[derive(Debug, Clone)]
pub struct DirectoryTarget {
    dir: PathBuf,
}

impl DirectoryTarget {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DirectoryTarget { dir: dir.into() }
    }
}

impl SaveTarget for DirectoryTarget {
    fn staging_dir(&self) -> PathBuf {
        self.dir.clone()
    }

    fn save(&mut self, filename: &str, blob: &Blob) -> IcsDropResult<PathBuf> {
        let (stem, extension) = split_extension(filename);

        for n in 0..MAX_DUPLICATE_NAMES {
            let candidate = if n == 0 {
                filename.to_string()
            } else {
                format!("{} ({}){}", stem, n, extension)
            };
            let path = self.dir.join(&candidate);

            let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            };

            let copied = blob
                .reopen()
                .and_then(|mut source| Ok(std::io::copy(&mut source, &mut file)?))
                .and_then(|_| Ok(file.sync_all()?));
            if let Err(e) = copied {
                let _ = std::fs::remove_file(&path);
                return Err(e);
            }

            log::info!("Saved {} ({}) to {}", candidate, blob.mime_type(), path.display());
            return Ok(path);
        }

        Err(IcsDropError::Download(format!(
            "too many existing files named like '{}' in {}",
            filename,
            self.dir.display()
        )))
    }
}

fn split_extension(filename: &str) -> (&str, &str) {
    match filename.rfind('.') {
        Some(dot) if dot > 0 => filename.split_at(dot),
        _ => (filename, ""),
    }
}

/// Stage `payload`, save it through `target` as `filename` and release the
/// staged copy.
pub fn trigger_download(
    target: &mut dyn SaveTarget,
    filename: &str,
    payload: &str,
) -> IcsDropResult<PathBuf> {
    let blob = Blob::new_in(&target.staging_dir(), payload.as_bytes(), ICS_MIME_TYPE)?;
    let saved = target.save(filename, &blob);

    if let Err(e) = blob.release() {
        log::warn!("Failed to release staged download: {}", e);
    }

    saved
}

/// Serialize `event` and download it as `<title>.ics`.
pub fn download_event(event: &CalendarEvent, target: &mut dyn SaveTarget) -> IcsDropResult<PathBuf> {
    let ics = generate_ics(event)?;
    trigger_download(target, &generate_filename(event), &ics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    fn make_standup() -> CalendarEvent {
        CalendarEvent::new(
            "Standup",
            Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 11, 0, 0).unwrap(),
        )
        .with_description("<b>daily</b>")
    }

    /// Stages next to a directory but refuses every save
    struct RefusingTarget {
        staging: PathBuf,
        seen_blob: Option<PathBuf>,
    }

    impl SaveTarget for RefusingTarget {
        fn staging_dir(&self) -> PathBuf {
            self.staging.clone()
        }

        fn save(&mut self, _filename: &str, blob: &Blob) -> IcsDropResult<PathBuf> {
            assert!(blob.path().exists(), "Blob should exist during save");
            self.seen_blob = Some(blob.path().to_path_buf());
            Err(IcsDropError::Download("user cancelled".to_string()))
        }
    }

    #[test]
    fn test_download_event_writes_titled_file() {
        let dir = TempDir::new().unwrap();
        let mut target = DirectoryTarget::new(dir.path());

        let path = download_event(&make_standup(), &mut target).unwrap();

        assert_eq!(path, dir.path().join("Standup.ics"));
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("SUMMARY:Standup\r\n"));
        assert!(content.contains("DESCRIPTION:daily\r\n"));
    }

    #[test]
    fn test_download_leaves_no_staged_file_behind() {
        let dir = TempDir::new().unwrap();
        let mut target = DirectoryTarget::new(dir.path());

        download_event(&make_standup(), &mut target).unwrap();

        assert_eq!(entries(dir.path()), vec!["Standup.ics".to_string()]);
    }

    #[test]
    fn test_failed_save_releases_staged_file() {
        let dir = TempDir::new().unwrap();
        let mut target = RefusingTarget {
            staging: dir.path().to_path_buf(),
            seen_blob: None,
        };

        let result = trigger_download(&mut target, "Standup.ics", "BEGIN:VCALENDAR");

        assert!(matches!(result, Err(IcsDropError::Download(_))));
        let blob_path = target.seen_blob.expect("save should have been called");
        assert!(!blob_path.exists());
        assert!(entries(dir.path()).is_empty());
    }

    #[test]
    fn test_invalid_event_fails_before_staging() {
        let dir = TempDir::new().unwrap();
        let mut target = DirectoryTarget::new(dir.path());
        let mut event = make_standup();
        std::mem::swap(&mut event.start, &mut event.end);

        let result = download_event(&event, &mut target);

        assert!(matches!(result, Err(IcsDropError::InvalidTimestamp(_))));
        assert!(entries(dir.path()).is_empty());
    }

    #[test]
    fn test_existing_file_is_not_overwritten() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Standup.ics"), "keep me").unwrap();
        let mut target = DirectoryTarget::new(dir.path());

        let first = download_event(&make_standup(), &mut target).unwrap();
        let second = download_event(&make_standup(), &mut target).unwrap();

        assert_eq!(first, dir.path().join("Standup (1).ics"));
        assert_eq!(second, dir.path().join("Standup (2).ics"));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("Standup.ics")).unwrap(),
            "keep me"
        );
        assert_eq!(
            entries(dir.path()),
            vec![
                "Standup (1).ics".to_string(),
                "Standup (2).ics".to_string(),
                "Standup.ics".to_string(),
            ]
        );
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = TempDir::new().unwrap();
        let mut target = DirectoryTarget::new(dir.path().join("missing"));

        let result = trigger_download(&mut target, "Standup.ics", "BEGIN:VCALENDAR");
        assert!(matches!(result, Err(IcsDropError::Io(_))));
    }

    #[test]
    fn test_blob_metadata() {
        let dir = TempDir::new().unwrap();
        let blob = Blob::new_in(dir.path(), b"BEGIN:VCALENDAR", ICS_MIME_TYPE).unwrap();

        assert_eq!(blob.mime_type(), "text/calendar");
        assert_eq!(blob.len(), 15);
        assert!(!blob.is_empty());
        let path = blob.path().to_path_buf();
        blob.release().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_split_extension() {
        assert_eq!(split_extension("Standup.ics"), ("Standup", ".ics"));
        assert_eq!(split_extension("v1.2 notes.ics"), ("v1.2 notes", ".ics"));
        assert_eq!(split_extension("README"), ("README", ""));
        assert_eq!(split_extension(".ics"), (".ics", ""));
    }
}
