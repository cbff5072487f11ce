use std::ffi::OsString;
use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info};

/// Environment variable naming an explicit JSON config file.
pub const CONFIG_ENV: &str = "DNA_REPORT_CONFIG";
/// Config file picked up from the project root when `DNA_REPORT_CONFIG` is unset.
pub const DEFAULT_CONFIG_FILE: &str = "dna_report.json";

const DNA_FILE_ENV: &str = "DNA_FILE";
const CATALOG_ENV: &str = "GENE_CATALOG";
const OUTPUT_ENV: &str = "REPORT_OUTPUT";
const EXPORT_ENV: &str = "EXPORT_DIR";

/// Input and output locations for one run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub dna_file: PathBuf,
    pub catalog_dir: PathBuf,
    pub output_path: PathBuf,
    /// Directory for the CSV tables; no tables are written when unset.
    pub export_dir: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dna_file: PathBuf::from("dna-test-results/AncestryDNA.txt"),
            catalog_dir: PathBuf::from("hidden/important-genes-2"),
            output_path: PathBuf::from("SUMMARY-FROM-RAW-DNA.md"),
            export_dir: None,
        }
    }
}

impl PipelineConfig {
    /// Defaults, then the JSON config file if there is one, then environment overrides.
    /// Relative paths are resolved against `project_root`.
    pub fn load(project_root: &Path) -> Result<Self> {
        let config = match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => {
                let default_path = project_root.join(DEFAULT_CONFIG_FILE);
                if default_path.is_file() {
                    Self::from_file(&default_path)?
                } else {
                    debug!("No {} found, using defaults", default_path.display());
                    Self::default()
                }
            }
        };

        let config = config
            .with_overrides(|key| std::env::var_os(key))
            .resolved_against(project_root);
        info!(
            "DNA file: {}, gene catalog: {}, report: {}",
            config.dna_file.display(),
            config.catalog_dir.display(),
            config.output_path.display()
        );
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        info!("Reading configuration from {}", path.display());
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file {}", path.display()))?;
        serde_json::from_reader(file)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    fn with_overrides<F>(self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<OsString>,
    {
        Self {
            dna_file: lookup(DNA_FILE_ENV).map(PathBuf::from).unwrap_or(self.dna_file),
            catalog_dir: lookup(CATALOG_ENV).map(PathBuf::from).unwrap_or(self.catalog_dir),
            output_path: lookup(OUTPUT_ENV).map(PathBuf::from).unwrap_or(self.output_path),
            export_dir: lookup(EXPORT_ENV).map(PathBuf::from).or(self.export_dir),
        }
    }

    fn resolved_against(self, root: &Path) -> Self {
        let resolve = |path: PathBuf| if path.is_absolute() { path } else { root.join(path) };
        Self {
            dna_file: resolve(self.dna_file),
            catalog_dir: resolve(self.catalog_dir),
            output_path: resolve(self.output_path),
            export_dir: self.export_dir.map(resolve),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn partial_json_keeps_remaining_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dna_report.json");
        std::fs::write(&path, r#"{ "dna_file": "raw/me.txt", "export_dir": "tables" }"#).unwrap();

        let config = PipelineConfig::from_file(&path).unwrap();
        assert_eq!(config.dna_file, PathBuf::from("raw/me.txt"));
        assert_eq!(config.export_dir, Some(PathBuf::from("tables")));
        assert_eq!(config.catalog_dir, PipelineConfig::default().catalog_dir);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{ "dna_fiel": "typo.txt" }"#).unwrap();

        assert!(PipelineConfig::from_file(&path).is_err());
    }

    #[test]
    fn environment_overrides_win() {
        let env: HashMap<&str, &str> = [("GENE_CATALOG", "/data/genes"), ("EXPORT_DIR", "out")].into_iter().collect();
        let config = PipelineConfig::default().with_overrides(|key| env.get(key).map(OsString::from));

        assert_eq!(config.catalog_dir, PathBuf::from("/data/genes"));
        assert_eq!(config.export_dir, Some(PathBuf::from("out")));
        assert_eq!(config.output_path, PathBuf::from("SUMMARY-FROM-RAW-DNA.md"));
    }

    #[test]
    fn relative_paths_resolve_against_root() {
        let config = PipelineConfig {
            catalog_dir: PathBuf::from("/abs/catalog"),
            ..PipelineConfig::default()
        }
        .resolved_against(Path::new("/project"));

        assert_eq!(config.dna_file, PathBuf::from("/project/dna-test-results/AncestryDNA.txt"));
        assert_eq!(config.catalog_dir, PathBuf::from("/abs/catalog"));
        assert_eq!(config.export_dir, None);
    }
}
