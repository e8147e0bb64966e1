//! Output path resolution

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::domain::errors::PathError;

/// Default marker inserted between the source stem and the extension
pub const DEFAULT_CLIP_MARKER: &str = "clip";

/// Derives where a cut is written
#[derive(Debug, Clone)]
pub struct OutputPathResolver {
    marker: String,
}

impl Default for OutputPathResolver {
    fn default() -> Self {
        Self::new(DEFAULT_CLIP_MARKER)
    }
}

impl OutputPathResolver {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }

    /// Pick the destination for a cut of `source`.
    ///
    /// An explicit destination is returned as given once its directory is
    /// known to exist. Otherwise the first free name in the sequence
    /// `<stem>_clip.<ext>`, `<stem>_clip_1.<ext>`, ... next to the source is
    /// used. Nothing is created on disk, so repeated calls agree until the
    /// returned file appears.
    pub fn resolve(
        &self,
        source: &Path,
        explicit: Option<&Path>,
        allow_overwrite: bool,
    ) -> Result<PathBuf, PathError> {
        self.resolve_excluding(source, explicit, allow_overwrite, |_| false)
    }

    /// Like [`resolve`](Self::resolve), also skipping generated names for
    /// which `is_taken` holds (names reserved by cuts still in progress)
    pub fn resolve_excluding(
        &self,
        source: &Path,
        explicit: Option<&Path>,
        allow_overwrite: bool,
        is_taken: impl Fn(&Path) -> bool,
    ) -> Result<PathBuf, PathError> {
        match explicit {
            Some(destination) => self.check_explicit(destination, allow_overwrite),
            None => Ok(self.next_free_sibling(source, is_taken)),
        }
    }

    fn check_explicit(&self, destination: &Path, allow_overwrite: bool) -> Result<PathBuf, PathError> {
        let parent = parent_dir(destination);
        if !parent.is_dir() {
            return Err(PathError::DirectoryNotFound {
                path: parent.to_path_buf(),
            });
        }
        if destination.exists() && !allow_overwrite {
            return Err(PathError::DestinationExists {
                path: destination.to_path_buf(),
            });
        }
        Ok(destination.to_path_buf())
    }

    fn next_free_sibling(&self, source: &Path, is_taken: impl Fn(&Path) -> bool) -> PathBuf {
        (0u64..)
            .map(|counter| self.candidate(source, counter))
            .find(|candidate| !candidate.exists() && !is_taken(candidate))
            .unwrap_or_else(|| self.candidate(source, u64::MAX))
    }

    /// Candidate name for a given counter; 0 means no counter
    pub fn candidate(&self, source: &Path, counter: u64) -> PathBuf {
        let stem = source
            .file_stem()
            .map(|s| s.to_os_string())
            .unwrap_or_else(|| OsString::from("output"));

        let mut name = stem;
        name.push("_");
        name.push(&self.marker);
        if counter > 0 {
            name.push(format!("_{}", counter));
        }
        if let Some(ext) = source.extension() {
            name.push(".");
            name.push(ext);
        }

        parent_dir(source).join(name)
    }
}

/// Parent directory, treating a bare file name as relative to the working directory
fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_sibling_name() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("demo.mp4");
        let resolver = OutputPathResolver::default();

        let resolved = resolver.resolve(&source, None, false).unwrap();
        assert_eq!(resolved, dir.path().join("demo_clip.mp4"));
    }

    #[test]
    fn test_resolution_is_idempotent_until_file_exists() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("demo.mp4");
        let resolver = OutputPathResolver::default();

        let first = resolver.resolve(&source, None, false).unwrap();
        let second = resolver.resolve(&source, None, false).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_existing_candidates_are_skipped() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("demo.mp4");
        fs::write(dir.path().join("demo_clip.mp4"), b"taken").unwrap();
        fs::write(dir.path().join("demo_clip_1.mp4"), b"taken").unwrap();

        let resolved = OutputPathResolver::default()
            .resolve(&source, None, false)
            .unwrap();
        assert_eq!(resolved, dir.path().join("demo_clip_2.mp4"));
        assert!(!resolved.exists());
    }

    #[test]
    fn test_custom_marker_and_missing_extension() {
        let resolver = OutputPathResolver::new("cut");
        let candidate = resolver.candidate(Path::new("/videos/raw"), 3);
        assert_eq!(candidate, PathBuf::from("/videos/raw_cut_3"));
    }

    #[test]
    fn test_bare_source_name_resolves_in_working_dir() {
        let candidate = OutputPathResolver::default().candidate(Path::new("demo.mp4"), 0);
        assert_eq!(candidate, Path::new(".").join("demo_clip.mp4"));
    }

    #[test]
    fn test_explicit_destination_used_unmodified() {
        let dir = TempDir::new().unwrap();
        let destination = dir.path().join("my cut.mkv");
        let resolved = OutputPathResolver::default()
            .resolve(Path::new("in.mp4"), Some(&destination), false)
            .unwrap();
        assert_eq!(resolved, destination);
    }

    #[test]
    fn test_explicit_destination_missing_directory() {
        let dir = TempDir::new().unwrap();
        let destination = dir.path().join("nope").join("out.mp4");
        let err = OutputPathResolver::default()
            .resolve(Path::new("in.mp4"), Some(&destination), false)
            .unwrap_err();
        assert_eq!(
            err,
            PathError::DirectoryNotFound {
                path: dir.path().join("nope")
            }
        );
    }

    #[test]
    fn test_explicit_existing_destination_needs_overwrite() {
        let dir = TempDir::new().unwrap();
        let destination = dir.path().join("out.mp4");
        fs::write(&destination, b"old").unwrap();
        let resolver = OutputPathResolver::default();

        assert!(matches!(
            resolver.resolve(Path::new("in.mp4"), Some(&destination), false),
            Err(PathError::DestinationExists { .. })
        ));
        assert_eq!(
            resolver
                .resolve(Path::new("in.mp4"), Some(&destination), true)
                .unwrap(),
            destination
        );
    }

    #[test]
    fn test_reserved_names_are_skipped() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("demo.mp4");
        let reserved = dir.path().join("demo_clip.mp4");

        let resolved = OutputPathResolver::default()
            .resolve_excluding(&source, None, false, |p| p == reserved)
            .unwrap();
        assert_eq!(resolved, dir.path().join("demo_clip_1.mp4"));
    }
}
