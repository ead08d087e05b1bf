use serde::Serialize;

use crate::shared::Result;

/// Maximum length for package names (security limit)
const MAX_PACKAGE_NAME_LENGTH: usize = 255;

/// The package manager a package record was decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    Dpkg,
    Apk,
    Rpm,
}

impl PackageManager {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageManager::Dpkg => "dpkg",
            PackageManager::Apk => "apk",
            PackageManager::Rpm => "rpm",
        }
    }
}

impl std::fmt::Display for PackageManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One installed package, normalized across package manager formats.
///
/// Fields are whitespace-trimmed and the name is case-folded on
/// construction, so that the `(name, version, architecture)` tuple can be
/// used directly as a uniqueness key within an inventory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Package {
    name: String,
    version: String,
    architecture: String,
    #[serde(rename = "manager")]
    manager: PackageManager,
}

impl Package {
    /// Creates a normalized package record.
    ///
    /// # Errors
    /// Returns an error if the name is empty after trimming, or exceeds
    /// the length limit.
    pub fn new(
        name: &str,
        version: &str,
        architecture: &str,
        manager: PackageManager,
    ) -> Result<Self> {
        let name = name.trim().to_lowercase();
        if name.is_empty() {
            anyhow::bail!("Package name cannot be empty");
        }
        if name.len() > MAX_PACKAGE_NAME_LENGTH {
            anyhow::bail!(
                "Package name is too long ({} bytes). Maximum allowed: {} bytes",
                name.len(),
                MAX_PACKAGE_NAME_LENGTH
            );
        }

        Ok(Self {
            name,
            version: version.trim().to_string(),
            architecture: architecture.trim().to_string(),
            manager,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn architecture(&self) -> &str {
        &self.architecture
    }

    pub fn manager(&self) -> PackageManager {
        self.manager
    }

    /// Uniqueness key within one inventory
    pub fn identity(&self) -> (&str, &str, &str) {
        (&self.name, &self.version, &self.architecture)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_normalizes_name_and_fields() {
        let pkg = Package::new(" OpenSSL ", " 1.1.1k ", " amd64 ", PackageManager::Dpkg).unwrap();
        assert_eq!(pkg.name(), "openssl");
        assert_eq!(pkg.version(), "1.1.1k");
        assert_eq!(pkg.architecture(), "amd64");
        assert_eq!(pkg.manager(), PackageManager::Dpkg);
    }

    #[test]
    fn test_package_rejects_empty_name() {
        assert!(Package::new("  ", "1.0", "", PackageManager::Apk).is_err());
    }

    #[test]
    fn test_package_rejects_overlong_name() {
        let name = "a".repeat(300);
        assert!(Package::new(&name, "1.0", "", PackageManager::Rpm).is_err());
    }

    #[test]
    fn test_package_serializes_manager_lowercase() {
        let pkg = Package::new("curl", "7.88.1", "amd64", PackageManager::Dpkg).unwrap();
        let json = serde_json::to_string(&pkg).unwrap();
        assert!(json.contains(r#""manager":"dpkg""#));
        assert!(json.contains(r#""name":"curl""#));
    }

    #[test]
    fn test_identity_tuple() {
        let a = Package::new("musl", "1.2.2", "x86_64", PackageManager::Apk).unwrap();
        let b = Package::new("MUSL", "1.2.2 ", "x86_64", PackageManager::Apk).unwrap();
        assert_eq!(a.identity(), b.identity());
    }
}
