//! Configuration management for the proto generator
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (protogen.toml)
//! - Environment variables (PROTOGEN__*)
//!
//! ## Example config file (protogen.toml):
//! ```toml
//! [input]
//! paths = ["./decls"]
//! extension = "json"
//!
//! [output]
//! dir = "./proto"
//! base_dir = "github.com/acme/api/model"
//! option_name = "go_package"
//! well_known_imports = "always"
//!
//! [naming]
//! tag_key = "json"
//!
//! [merge]
//! target = "smallest"
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for the generator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Where declaration manifests come from
    #[serde(default)]
    pub input: InputConfig,

    /// Where and how schema files are written
    #[serde(default)]
    pub output: OutputConfig,

    /// Field naming rules
    #[serde(default)]
    pub naming: NamingConfig,

    /// Cycle merge policy
    #[serde(default)]
    pub merge: MergeConfig,
}

/// Input configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Manifest files or directories (directories are walked recursively)
    #[serde(default)]
    pub paths: Vec<PathBuf>,

    /// Extension of manifest files inside directories
    #[serde(default = "default_input_extension")]
    pub extension: String,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Destination directory
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,

    /// Base directory / import path; its last component names the package
    #[serde(default)]
    pub base_dir: String,

    /// Extension given to generated files
    #[serde(default = "default_schema_extension")]
    pub schema_extension: String,

    /// Name of the `option` line carrying the base path
    #[serde(default = "default_option_name")]
    pub option_name: String,

    /// Which well-known imports to emit
    #[serde(default)]
    pub well_known_imports: WellKnownImports,

    /// Banner comment placed at the top of every file
    #[serde(default = "default_banner")]
    pub banner: String,
}

/// Well-known import policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WellKnownImports {
    /// Always import any, duration and timestamp
    #[default]
    Always,
    /// Only import the well-known types a file actually uses
    Used,
}

/// Naming configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NamingConfig {
    /// Struct tag key that carries the wire name. `None` uses the first key in the tag.
    #[serde(default)]
    pub tag_key: Option<String>,
}

/// Merge configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MergeConfig {
    /// How a cyclic group's representative file is chosen
    #[serde(default)]
    pub target: MergeTarget,
}

/// Representative selection for a merged file group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MergeTarget {
    /// Lexicographically smallest file name
    #[default]
    Smallest,
    /// Lexicographically largest file name
    Largest,
}

impl MergeTarget {
    /// Pick the representative among a group's file names
    pub fn pick<'a, I>(&self, files: I) -> Option<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let files = files.into_iter();
        match self {
            MergeTarget::Smallest => files.min(),
            MergeTarget::Largest => files.max(),
        }
    }
}

// Default value functions
fn default_input_extension() -> String {
    "json".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("proto")
}

fn default_schema_extension() -> String {
    "proto".to_string()
}

fn default_option_name() -> String {
    "go_package".to_string()
}

fn default_banner() -> String {
    "Code generated by struct-proto. DO NOT EDIT.".to_string()
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            extension: default_input_extension(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            base_dir: String::new(),
            schema_extension: default_schema_extension(),
            option_name: default_option_name(),
            well_known_imports: WellKnownImports::default(),
            banner: default_banner(),
        }
    }
}

impl OutputConfig {
    /// Package name: last path component of the base directory
    pub fn package_name(&self) -> String {
        self.base_dir
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or("generated")
            .to_string()
    }

    /// Output file name for a host file: source extension replaced by the schema extension
    pub fn schema_file_name(&self, source_file: &str) -> String {
        let stem = match source_file.rfind('.') {
            Some(idx) if idx > 0 => &source_file[..idx],
            _ => source_file,
        };
        format!("{}.{}", stem, self.schema_extension)
    }
}

impl GeneratorConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, adding a specific file on top of the default locations
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = [
            "protogen.toml",
            ".protogen.toml",
            "config/protogen.toml",
        ];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("", "", "struct-proto") {
            let xdg_config = config_dir.config_dir().join("protogen.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // PROTOGEN__OUTPUT__BASE_DIR=...
        builder = builder.add_source(
            Environment::with_prefix("PROTOGEN")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }
}
