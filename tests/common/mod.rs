//! Fake media tools for subprocess tests

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Write an executable `sh` script named `name` into `dir`.
///
/// Every invocation appends its arguments as one line to `<name>.log`, and
/// `$last` holds the final argument (the output path for cuts).
pub fn fake_tool(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    let log = dir.join(format!("{}.log", name));
    let script = format!(
        "#!/bin/sh\necho \"$*\" >> '{}'\nfor last; do :; done\n{}\n",
        log.display(),
        body
    );
    fs::write(&path, script).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Argument lines recorded by [`fake_tool`]
pub fn invocations(dir: &Path, name: &str) -> Vec<String> {
    fs::read_to_string(dir.join(format!("{}.log", name)))
        .map(|log| log.lines().map(str::to_string).collect())
        .unwrap_or_default()
}

/// Succeeds in every mode, reporting progress half way through a 7 s cut
pub const WRITES_CLIP: &str = r#"
case "$*" in
  *image2pipe*) printf 'JPEGDATA'; exit 0 ;;
esac
echo "out_time=00:00:03.500000"
echo "progress=end"
printf 'clip' > "$last"
"#;

/// Stream copy fails after writing a partial file; re-encode succeeds
pub const COPY_FAILS: &str = r#"
case "$*" in
  *"-c copy"*)
    printf 'partial' > "$last"
    echo "Could not find tag for codec in stream #0" >&2
    exit 1 ;;
esac
printf 'reencoded' > "$last"
"#;

pub const ALWAYS_FAILS: &str = r#"
echo "Invalid data found when processing input" >&2
exit 1
"#;

/// Writes partial output, then blocks until killed
pub const HANGS: &str = r#"
printf 'partial' > "$last"
exec sleep 30
"#;

/// ffprobe reporting a 20 second container
pub const PROBE_20S: &str = r#"
echo '{"format": {"filename": "demo.mp4", "duration": "20.000000"}}'
"#;

/// A source file the fake tools can "read"
pub fn source(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, b"not really a video").unwrap();
    path
}
