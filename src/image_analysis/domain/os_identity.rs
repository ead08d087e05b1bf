use serde::Serialize;

/// Distribution identity recovered from the merged filesystem view.
///
/// Absence is a valid, reportable state: minimal images routinely ship
/// without a release file, so both fields default to empty rather than
/// the whole scan failing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OsIdentity {
    pub distribution: String,
    pub version: String,
}

impl OsIdentity {
    pub fn new(distribution: String, version: String) -> Self {
        Self {
            distribution,
            version,
        }
    }

    /// Identity for images with no recognizable release file
    pub fn unknown() -> Self {
        Self {
            distribution: String::new(),
            version: String::new(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.distribution.is_empty() && self.version.is_empty()
    }

    /// Keyword used when querying the vulnerability feed for the OS itself,
    /// e.g. "debian 11". The version makes the lookup CPE-like rather than
    /// a free-text package name search.
    pub fn feed_keyword(&self) -> Option<String> {
        if self.distribution.is_empty() {
            return None;
        }
        if self.version.is_empty() {
            Some(self.distribution.clone())
        } else {
            Some(format!("{} {}", self.distribution, self.version))
        }
    }
}

impl Default for OsIdentity {
    fn default() -> Self {
        Self::unknown()
    }
}
