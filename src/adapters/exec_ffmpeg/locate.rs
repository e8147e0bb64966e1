//! Locating the media tool executables

use std::env;
use std::path::{Path, PathBuf};

use tracing::debug;

/// File name of `tool` on this platform
pub fn executable_name(tool: &str) -> String {
    format!("{}{}", tool, env::consts::EXE_SUFFIX)
}

/// Find `tool`, preferring an explicitly configured path.
///
/// A configured value containing a directory component is trusted as is.
/// Otherwise the lookup checks next to the running executable, its
/// `ffmpeg/bin` folder, then every `PATH` entry. Falls back to the bare name
/// so a later spawn reports the tool as missing.
pub fn locate_tool(tool: &str, configured: Option<&Path>) -> PathBuf {
    if let Some(path) = configured {
        if path.components().count() > 1 || path.is_absolute() {
            return path.to_path_buf();
        }
    }

    let name = configured
        .and_then(|p| p.to_str().map(str::to_string))
        .unwrap_or_else(|| executable_name(tool));

    let path_dirs = env::var_os("PATH")
        .map(|paths| env::split_paths(&paths).collect::<Vec<_>>())
        .unwrap_or_default();

    match find_in(&name, bundled_dirs().into_iter().chain(path_dirs)) {
        Some(found) => {
            debug!(tool, path = %found.display(), "located media tool");
            found
        }
        None => {
            debug!(tool, "media tool not found, relying on the bare name");
            PathBuf::from(name)
        }
    }
}

/// Directories shipped alongside the binary
fn bundled_dirs() -> Vec<PathBuf> {
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .map(|dir| vec![dir.clone(), dir.join("ffmpeg").join("bin")])
        .unwrap_or_default()
}

/// First `dir/name` that is a regular file
pub fn find_in(name: &str, dirs: impl IntoIterator<Item = PathBuf>) -> Option<PathBuf> {
    dirs.into_iter()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_find_in_returns_first_match() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        fs::write(second.path().join("ffmpeg"), b"").unwrap();

        let found = find_in(
            "ffmpeg",
            vec![PathBuf::new(), first.path().to_path_buf(), second.path().to_path_buf()],
        );
        assert_eq!(found, Some(second.path().join("ffmpeg")));
    }

    #[test]
    fn test_find_in_ignores_directories() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("ffmpeg")).unwrap();
        assert_eq!(find_in("ffmpeg", vec![dir.path().to_path_buf()]), None);
    }

    #[test]
    fn test_configured_path_with_directory_is_trusted() {
        let configured = Path::new("/opt/tools/ffmpeg");
        assert_eq!(locate_tool("ffmpeg", Some(configured)), configured);
    }

    #[test]
    fn test_unknown_tool_falls_back_to_bare_name() {
        let located = locate_tool("vidcut-no-such-tool", None);
        assert_eq!(located, PathBuf::from(executable_name("vidcut-no-such-tool")));
    }
}
