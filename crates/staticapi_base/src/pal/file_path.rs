use relative_path::{Component, RelativePath, RelativePathBuf};
use std::path::{Path, PathBuf};

/* 📖 # Why use RelativePathBuf for FilePath?

FilePath wraps RelativePathBuf so that every path handed to the PAL is relative to
the PAL's base directory and always uses forward slashes, whatever the host
platform. Route paths are derived directly from FilePaths, so the separator
convention is settled here once instead of at every call site.
*/

/// Type-safe wrapper for file paths relative to PAL base directory.
///
/// # Examples
///
/// ```
/// use staticapi_base::FilePath;
///
/// let root = FilePath::from("data");
/// let file = root.join("kel").join("sample-id/data.json");
/// assert_eq!(file.to_string(), "data/kel/sample-id/data.json");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FilePath(RelativePathBuf);

impl FilePath {
    /// Returns the underlying RelativePathBuf as a reference.
    pub fn as_relative(&self) -> &RelativePath {
        &self.0
    }

    /// Returns the path as a forward-slash separated string.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Converts to a regular Path for use with std::fs operations.
    /// This returns the relative path portion without a base directory.
    pub fn as_path(&self) -> &Path {
        Path::new(self.as_str())
    }

    /// Resolves this path against a base directory.
    pub fn to_path(&self, base: &Path) -> PathBuf {
        base.join(self.as_path())
    }

    /// Appends a path segment (or several, separated by `/`).
    pub fn join(&self, segment: impl AsRef<str>) -> FilePath {
        Self(self.0.join(segment.as_ref()))
    }

    /// Returns the final component, if there is one.
    pub fn file_name(&self) -> Option<&str> {
        self.0.file_name()
    }

    /// Returns the parent directory, if there is one.
    pub fn parent(&self) -> Option<FilePath> {
        self.0.parent().map(FilePath::from)
    }

    /// Removes `.` components and resolves `..` where possible.
    pub fn normalize(&self) -> FilePath {
        Self(self.0.normalize())
    }

    /// Returns this path relative to `base`, or None if it does not live under it.
    pub fn strip_prefix(&self, base: &FilePath) -> Option<FilePath> {
        let base = base.normalize();
        let this = self.normalize();
        this.0.strip_prefix(&base.0).ok().map(FilePath::from)
    }

    /// True if the path was given as an absolute host path (`/srv/data`, `\\share`
    /// or `C:\data`). Normalization would silently make such a path relative to
    /// the PAL base, so callers reject it first.
    pub fn is_absolute(&self) -> bool {
        let s = self.as_str();
        let bytes = s.as_bytes();
        s.starts_with('/')
            || s.starts_with('\\')
            || (bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':')
    }

    /// True if any component is `..`, i.e. the path may escape its base.
    pub fn has_parent_components(&self) -> bool {
        self.0
            .components()
            .any(|component| matches!(component, Component::ParentDir))
    }
}

impl From<&str> for FilePath {
    fn from(s: &str) -> Self {
        Self(RelativePathBuf::from(s))
    }
}

impl From<String> for FilePath {
    fn from(s: String) -> Self {
        Self(RelativePathBuf::from(s))
    }
}

impl From<RelativePathBuf> for FilePath {
    fn from(p: RelativePathBuf) -> Self {
        Self(p)
    }
}

impl From<&RelativePath> for FilePath {
    fn from(p: &RelativePath) -> Self {
        Self(p.to_relative_path_buf())
    }
}

impl From<&Path> for FilePath {
    fn from(p: &Path) -> Self {
        // Windows separators would otherwise end up inside a single component
        Self(RelativePathBuf::from(
            p.to_string_lossy().replace('\\', "/"),
        ))
    }
}

impl std::fmt::Display for FilePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<RelativePath> for FilePath {
    fn as_ref(&self) -> &RelativePath {
        &self.0
    }
}
