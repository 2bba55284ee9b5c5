//! Helper-side path conventions.
//!
//! The privileged helper expects backslash-separated, drive-qualified paths.
//! Callers hand in forward-slash paths; conversion happens right before a
//! request goes on the wire.

/// Separator used by the helper service.
pub const HELPER_SEPARATOR: char = '\\';

/// Drive designator prefixed to root-relative paths by default.
pub const DEFAULT_DRIVE: &str = "c:";

/// Converts caller paths into the helper's form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathNormalizer {
    drive: String,
}

impl PathNormalizer {
    /// Normalizer prefixing `drive` to root-relative paths.
    #[must_use]
    pub fn new(drive: impl Into<String>) -> Self {
        Self {
            drive: drive.into(),
        }
    }

    /// The drive designator in use.
    #[must_use]
    pub fn drive(&self) -> &str {
        &self.drive
    }

    /// Replace every `/` with `\` and qualify root-relative paths with the drive.
    ///
    /// Total and idempotent: `normalize(normalize(p)) == normalize(p)`.
    #[must_use]
    pub fn normalize(&self, path: &str) -> String {
        let normalized = to_unc(path);
        if normalized.starts_with(HELPER_SEPARATOR) {
            format!("{}{normalized}", self.drive)
        } else {
            normalized
        }
    }
}

impl Default for PathNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_DRIVE)
    }
}

/// Replace every `/` with `\`, without any drive handling.
///
/// Used for remote share addresses: `//server/share` becomes `\\server\share`.
#[must_use]
pub fn to_unc(path: &str) -> String {
    path.replace('/', "\\")
}

/// Directory part of a caller path.
///
/// Mirrors `dirname`: `"/mnt/smb"` gives `"/mnt"`, `"/mnt"` gives `"/"` and a
/// bare name gives `"."`. Both separators are accepted so already-converted
/// paths resolve too.
///
/// Trailing separators are dropped before the last component is removed, so
/// `"/mnt/smb/"` gives `"/mnt"` as POSIX `dirname` does, not `"/mnt/smb"` as
/// a purely lexical split on the last separator would.
#[must_use]
pub fn parent_dir(path: &str) -> String {
    let is_sep = |c: char| c == '/' || c == HELPER_SEPARATOR;
    let trimmed = path.trim_end_matches(is_sep);
    if trimmed.is_empty() {
        return if path.is_empty() { ".".into() } else { path[..1].to_string() };
    }
    match trimmed.rfind(is_sep) {
        Some(idx) => {
            let parent = trimmed[..idx].trim_end_matches(is_sep);
            if parent.is_empty() {
                trimmed[idx..=idx].to_string()
            } else {
                parent.to_string()
            }
        }
        None => ".".into(),
    }
}
