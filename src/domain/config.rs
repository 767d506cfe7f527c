use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Configuration for requirement extraction.
///
/// Controls where output files are written, the tokens used to delimit
/// serialized records, and where additional document profiles are found.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "Versions")]
pub struct Config {
    /// Name of the path segment holding source documents.
    ///
    /// The last segment with this name is rewritten to `output_area` when
    /// deriving an output path.
    pub input_area: String,

    /// Name of the path segment that receives extracted requirements.
    pub output_area: String,

    /// Extension given to output files.
    pub output_extension: String,

    /// Token placed between the fields of a record.
    pub separator: String,

    /// Token appended to every record.
    pub terminator: String,

    /// Directories searched (recursively) for additional `*.toml` profiles.
    pub profile_dirs: Vec<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_area: default_input_area(),
            output_area: default_output_area(),
            output_extension: default_output_extension(),
            separator: default_separator(),
            terminator: default_terminator(),
            profile_dirs: Vec::new(),
        }
    }
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))
    }
}

fn default_input_area() -> String {
    "input".to_string()
}

fn default_output_area() -> String {
    "output".to_string()
}

fn default_output_extension() -> String {
    "txt".to_string()
}

fn default_separator() -> String {
    "[SEP]".to_string()
}

fn default_terminator() -> String {
    "[END]".to_string()
}

/// The serialized versions of the configuration.
#[derive(Debug, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_input_area")]
        input_area: String,

        #[serde(default = "default_output_area")]
        output_area: String,

        #[serde(default = "default_output_extension")]
        output_extension: String,

        #[serde(default = "default_separator")]
        separator: String,

        #[serde(default = "default_terminator")]
        terminator: String,

        #[serde(default)]
        profile_dirs: Vec<PathBuf>,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                input_area,
                output_area,
                output_extension,
                separator,
                terminator,
                profile_dirs,
            } => Self {
                input_area,
                output_area,
                output_extension,
                separator,
                terminator,
                profile_dirs,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn load_reads_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            b"_version = \"1\"\ninput_area = \"pdf\"\noutput_area = \"reqs\"\nseparator = \"|\"\nprofile_dirs = [\"profiles\"]\n",
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.input_area, "pdf");
        assert_eq!(config.output_area, "reqs");
        assert_eq!(config.separator, "|");
        assert_eq!(config.terminator, "[END]");
        assert_eq!(config.profile_dirs, vec![PathBuf::from("profiles")]);
    }

    #[test]
    fn load_missing_file_returns_error() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing.toml");

        let error = Config::load(&missing).unwrap_err();
        assert!(error.starts_with("Failed to read config file:"));
    }

    #[test]
    fn load_invalid_toml_returns_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"_version = \"1\"\nprofile_dirs = \"not a list\"\n")
            .unwrap();

        let error = Config::load(file.path()).unwrap_err();
        assert!(error.starts_with("Failed to parse config file:"));
    }

    #[test]
    fn empty_file_returns_default() {
        let expected = Config::default();
        let actual: Config = toml::from_str(r#"_version = "1""#).unwrap();
        assert_eq!(actual, expected);
    }
}
