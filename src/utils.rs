//! Utility functions for path-segment matching and program lookup

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Check whether any `/`-separated segment of `path` equals one of `fragments`
///
/// Segments are walked from the leaf toward the root. Matching is exact:
/// `testing/abcd/x.go` matches `abcd`, `testing/abcde/x.go` does not.
/// Empty and `.` segments never match.
pub fn has_ignored_segment(path: &str, fragments: &[String]) -> bool {
  path
    .rsplit('/')
    .filter(|segment| !segment.is_empty() && *segment != ".")
    .any(|segment| fragments.iter().any(|f| f == segment))
}

/// Check whether a lister candidate should be dropped
///
/// The empty candidate is always excluded.
pub fn is_excluded_target(candidate: &str, fragments: &[String]) -> bool {
  candidate.is_empty() || has_ignored_segment(candidate, fragments)
}

/// Append `extra` to `base`, skipping values already present
pub fn union_into(base: &mut Vec<String>, extra: &[String]) {
  for value in extra {
    if !base.contains(value) {
      base.push(value.clone());
    }
  }
}

/// Resolve a program name against a search path (the `PATH` format)
///
/// Names containing a path separator are checked directly instead.
pub fn find_on_path(program: &str, search_path: Option<&OsStr>) -> Option<PathBuf> {
  if program.is_empty() {
    return None;
  }

  let candidate = Path::new(program);
  if candidate.components().count() > 1 {
    return is_executable(candidate).then(|| candidate.to_path_buf());
  }

  std::env::split_paths(search_path?)
    .map(|dir| dir.join(program))
    .find(|path| is_executable(path))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
  use std::os::unix::fs::PermissionsExt;

  std::fs::metadata(path)
    .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
    .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
  path.is_file() || path.with_extension("exe").is_file()
}
