//! Registry of document profiles.
//!
//! Profiles are looked up by identifier (case-insensitively) or detected from
//! the file name of a source document.

use std::{
    collections::BTreeMap,
    ffi::OsStr,
    path::{Path, PathBuf},
};

use walkdir::WalkDir;

use crate::domain::{profile, DocumentProfile};

const BUILTIN: &[(&str, &str)] = &[
    (
        "e1356-gtd-srs.toml",
        include_str!("../../profiles/e1356-gtd-srs.toml"),
    ),
    (
        "e1356-gtd-tr.toml",
        include_str!("../../profiles/e1356-gtd-tr.toml"),
    ),
    (
        "mpy-spb-srs.toml",
        include_str!("../../profiles/mpy-spb-srs.toml"),
    ),
    ("rtems-srs.toml", include_str!("../../profiles/rtems-srs.toml")),
    ("savoir-gs.toml", include_str!("../../profiles/savoir-gs.toml")),
    (
        "savoir-gs-dssnird.toml",
        include_str!("../../profiles/savoir-gs-dssnird.toml"),
    ),
];

/// A set of validated document profiles keyed by identifier.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    profiles: BTreeMap<String, DocumentProfile>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the profiles shipped with the crate.
    ///
    /// # Errors
    ///
    /// Returns an error if a bundled profile fails validation.
    pub fn builtin() -> Result<Self, Error> {
        let mut registry = Self::new();
        for (name, content) in BUILTIN {
            let profile = DocumentProfile::from_toml(content).map_err(|source| {
                Error::Load(profile::LoadError::Parse {
                    path: (*name).to_string(),
                    source,
                })
            })?;
            registry.register(profile)?;
        }
        Ok(registry)
    }

    /// Adds a profile.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Duplicate`] if a profile with the same identifier is
    /// already registered.
    pub fn register(&mut self, profile: DocumentProfile) -> Result<(), Error> {
        let key = normalise(profile.id());
        if self.profiles.contains_key(&key) {
            return Err(Error::Duplicate(profile.id().to_string()));
        }
        tracing::debug!(profile = profile.id(), "registered profile");
        self.profiles.insert(key, profile);
        Ok(())
    }

    /// Registers every `*.toml` profile found below `dir`.
    ///
    /// Returns the number of profiles added.
    ///
    /// # Errors
    ///
    /// Returns an error if a profile file cannot be loaded or its identifier
    /// is already registered.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize, Error> {
        let paths = collect_profile_paths(dir);
        for path in &paths {
            let profile = DocumentProfile::load(path)?;
            self.register(profile)?;
        }
        Ok(paths.len())
    }

    /// Looks up a profile by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownProfile`] if no such profile is registered.
    pub fn profile_for(&self, id: &str) -> Result<&DocumentProfile, Error> {
        self.profiles
            .get(&normalise(id))
            .ok_or_else(|| Error::UnknownProfile(id.to_string()))
    }

    /// Selects the profile whose file-stem prefix matches `path`.
    ///
    /// When several profiles match, the one declaring the longest matching
    /// prefix wins.
    #[must_use]
    pub fn detect(&self, path: &Path) -> Option<&DocumentProfile> {
        let stem = path.file_stem().and_then(OsStr::to_str)?;
        self.profiles
            .values()
            .filter(|profile| profile.matches_stem(stem))
            .max_by_key(|profile| profile.matching_prefix_len(stem))
    }

    /// Iterates over the registered profiles, ordered by identifier.
    pub fn iter(&self) -> impl Iterator<Item = &DocumentProfile> {
        self.profiles.values()
    }

    /// Number of registered profiles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

fn normalise(id: &str) -> String {
    id.trim().to_ascii_uppercase()
}

fn collect_profile_paths(dir: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("skipping unreadable profile path: {e}");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|path| path.extension() == Some(OsStr::new("toml")))
        .collect();
    paths.sort();
    paths
}

/// Errors raised by the profile registry.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No profile is registered under the requested identifier.
    #[error("no profile registered for document type '{0}'")]
    UnknownProfile(String),

    /// A profile with the same identifier is already registered.
    #[error("a profile named '{0}' is already registered")]
    Duplicate(String),

    /// A profile file could not be loaded.
    #[error(transparent)]
    Load(#[from] profile::LoadError),
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn profile(id: &str, prefix: &str) -> DocumentProfile {
        DocumentProfile::from_toml(&format!(
            r#"
            _version = "1"
            id = "{id}"
            match = ["{prefix}"]

            [[chapters]]
            pattern = '1\.'

            [requirements]
            pattern = 'REQ'
            "#
        ))
        .unwrap()
    }

    #[test]
    fn builtin_profiles_are_valid() {
        let registry = Registry::builtin().unwrap();
        assert_eq!(registry.len(), BUILTIN.len());
    }

    #[test_case("input/E1356-GTD-SRS-01_I1_R4.pdf", "E1356-GTD-SRS"; "gtd srs")]
    #[test_case("input/E1356-GTD-TR-01_I2_R1.pdf", "E1356-GTD-TR"; "gtd tr")]
    #[test_case("input/RTEMS_SRS.pdf", "RTEMS-SRS"; "rtems")]
    #[test_case("input/MPY-SPB-SRS-001.pdf", "MPY-SPB-SRS"; "micropython")]
    #[test_case("input/SAVOIR-GS-001.pdf", "SAVOIR-GS-001"; "savoir obc")]
    #[test_case("input/SAVOIR-GS-DSSnIRD-006.pdf", "SAVOIR-GS-DSSNIRD"; "savoir dss")]
    fn builtin_profiles_are_detected(path: &str, expected: &str) {
        let registry = Registry::builtin().unwrap();
        let profile = registry.detect(Path::new(path)).unwrap();
        assert_eq!(profile.id().to_ascii_uppercase(), expected);
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let mut registry = Registry::new();
        registry.register(profile("DOC-A", "A")).unwrap();

        assert_eq!(registry.profile_for("doc-a").unwrap().id(), "DOC-A");
    }

    #[test]
    fn unknown_profile_is_an_error() {
        let registry = Registry::new();
        let error = registry.profile_for("NOPE").unwrap_err();
        assert!(matches!(error, Error::UnknownProfile(id) if id == "NOPE"));
    }

    #[test]
    fn duplicate_profile_is_rejected() {
        let mut registry = Registry::new();
        registry.register(profile("DOC", "A")).unwrap();
        let error = registry.register(profile("doc", "B")).unwrap_err();
        assert!(matches!(error, Error::Duplicate(_)));
    }

    #[test]
    fn detect_prefers_longest_prefix() {
        let mut registry = Registry::new();
        registry.register(profile("GENERIC", "SAVOIR-GS")).unwrap();
        registry.register(profile("SPECIFIC", "SAVOIR-GS-DSS")).unwrap();

        let detected = registry.detect(Path::new("SAVOIR-GS-DSSnIRD.pdf")).unwrap();
        assert_eq!(detected.id(), "SPECIFIC");
        assert!(registry.detect(Path::new("unrelated.pdf")).is_none());
    }

    #[test]
    fn load_dir_registers_toml_files() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("nested");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(
            nested.join("custom.toml"),
            "_version = \"1\"\nid = \"CUSTOM\"\n[[chapters]]\npattern = '1'\n[requirements]\npattern = 'R'\n",
        )
        .unwrap();
        std::fs::write(tmp.path().join("notes.md"), "not a profile").unwrap();

        let mut registry = Registry::new();
        let added = registry.load_dir(tmp.path()).unwrap();

        assert_eq!(added, 1);
        assert!(registry.profile_for("custom").is_ok());
    }

    #[test]
    fn load_dir_reports_invalid_profile() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("broken.toml"), "_version = \"1\"\n").unwrap();

        let mut registry = Registry::new();
        let error = registry.load_dir(tmp.path()).unwrap_err();
        assert!(matches!(error, Error::Load(profile::LoadError::Parse { .. })));
    }
}
