//! Declaration Loading
//!
//! Reads declaration manifests produced by the external parser. Inputs may be
//! manifest files or directories; directories are walked recursively and only
//! files with the configured extension are read. Manifests are returned in
//! path order so every run sees the same declaration order.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::{ProtoGenError, Result};
use crate::schema::SourceFile;

/// Configuration for manifest loading
#[derive(Debug, Clone)]
pub struct LoadConfig {
    /// Manifest extension (without the dot)
    pub extension: String,
    /// Skip paths containing these directory names when walking
    pub skip_dirs: Vec<String>,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            extension: "json".to_string(),
            skip_dirs: vec![
                "target".to_string(),
                ".git".to_string(),
                "node_modules".to_string(),
            ],
        }
    }
}

impl LoadConfig {
    pub fn with_extension(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
            ..Self::default()
        }
    }

    fn matches(&self, path: &Path) -> bool {
        path.extension().map(|ext| ext == self.extension.as_str()).unwrap_or(false)
    }
}

/// Load every manifest reachable from `inputs`
pub fn load_sources(inputs: &[PathBuf], config: &LoadConfig) -> Result<Vec<SourceFile>> {
    let mut paths = Vec::new();
    for input in inputs {
        collect_paths(input, config, &mut paths)?;
    }
    paths.sort();
    paths.dedup();

    let sources = paths
        .iter()
        .map(|path| load_source(path))
        .collect::<Result<Vec<_>>>()?;

    debug!(manifests = sources.len(), "loaded declaration manifests");
    Ok(sources)
}

fn collect_paths(input: &Path, config: &LoadConfig, paths: &mut Vec<PathBuf>) -> Result<()> {
    if input.is_file() {
        // Explicitly named files are read regardless of extension
        paths.push(input.to_path_buf());
        return Ok(());
    }
    if !input.is_dir() {
        return Err(ProtoGenError::parse_input(input, "no such file or directory"));
    }

    let walker = WalkDir::new(input).into_iter().filter_entry(|entry| {
        let name = entry.file_name().to_string_lossy();
        !(entry.depth() > 0 && entry.file_type().is_dir() && config.skip_dirs.iter().any(|d| *d == name))
    });

    for entry in walker {
        let entry = entry.map_err(|e| ProtoGenError::parse_input(input, e))?;
        let path = entry.path();
        if path.is_file() && config.matches(path) {
            paths.push(path.to_path_buf());
        }
    }
    Ok(())
}

/// Load a single manifest. Declarations without an origin file inherit the
/// manifest's `file`.
pub fn load_source(path: &Path) -> Result<SourceFile> {
    let content = fs::read_to_string(path).map_err(|e| ProtoGenError::parse_input(path, e))?;
    let mut source: SourceFile =
        serde_json::from_str(&content).map_err(|e| ProtoGenError::parse_input(path, e))?;

    if source.file.is_empty() {
        return Err(ProtoGenError::parse_input(path, "manifest has no `file` name"));
    }
    for decl in &mut source.declarations {
        if decl.origin_file.is_empty() {
            decl.origin_file = source.file.clone();
        }
    }

    debug!(path = %path.display(), file = %source.file, declarations = source.declarations.len(), "loaded manifest");
    Ok(source)
}
