use std::path::{Path, PathBuf};

/// Expand `~`, `$VAR` and `${VAR}`; the input is returned unchanged when a
/// variable is undefined.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

pub fn expand_path(path: &Path) -> PathBuf {
    PathBuf::from(expand_env_vars(path.to_string_lossy().as_ref()))
}

/// `path` relative to `base`, when one can be computed.
pub fn relative_to(path: &Path, base: &Path) -> Option<PathBuf> {
    pathdiff::diff_paths(path, base)
}
