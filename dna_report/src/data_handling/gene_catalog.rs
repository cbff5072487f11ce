use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Deserializer};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::models::{Category, Dataset, GeneRecord, VariantDefinition};

/// A directory tree of gene documents, one YAML file per gene.
pub struct GeneCatalog {
    pub path: PathBuf,
}

/// One gene document as written by catalog authors.
///
/// Optional fields and their defaults: `health_impact`, `common_variants`,
/// `additional_rsids` and `research_sources` default to empty lists, `notes` and
/// `gene_description` to "", `ancestry_compatibility` to true. An explicit `null`
/// is treated like an absent field.
#[derive(Debug, Deserialize)]
struct GeneDocument {
    gene: String,
    full_name: String,
    category: Category,
    function: String,
    #[serde(default, deserialize_with = "null_as_default")]
    health_impact: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    common_variants: Vec<VariantDocument>,
    #[serde(default, deserialize_with = "null_as_default")]
    additional_rsids: Vec<String>,
    #[serde(default = "default_ancestry_compatibility")]
    ancestry_compatibility: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    research_sources: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    notes: String,
    #[serde(default, deserialize_with = "null_as_default")]
    gene_description: String,
}

#[derive(Debug, Deserialize)]
struct VariantDocument {
    #[serde(deserialize_with = "scalar_as_string")]
    variant: String,
    #[serde(deserialize_with = "scalar_as_string")]
    rsid: String,
    #[serde(deserialize_with = "scalar_as_string")]
    chromosome: String,
    #[serde(deserialize_with = "scalar_as_position")]
    position: u64,
    description: String,
}

fn default_ancestry_compatibility() -> bool {
    true
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// YAML authors write `chromosome: 1` and `chromosome: X` interchangeably.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Integer(i64),
    Text(String),
}

fn scalar_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Scalar::deserialize(deserializer)? {
        Scalar::Integer(n) => n.to_string(),
        Scalar::Text(s) => s,
    })
}

fn scalar_as_position<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Scalar::deserialize(deserializer)? {
        Scalar::Integer(n) => u64::try_from(n).map_err(|_| D::Error::custom(format!("negative position {}", n))),
        Scalar::Text(s) => s
            .trim()
            .parse::<u64>()
            .map_err(|_| D::Error::custom(format!("invalid position {:?}", s))),
    }
}

impl From<GeneDocument> for GeneRecord {
    fn from(doc: GeneDocument) -> Self {
        GeneRecord {
            symbol: doc.gene,
            full_name: doc.full_name,
            category: doc.category,
            function: doc.function,
            health_impact: doc.health_impact,
            variants: doc
                .common_variants
                .into_iter()
                .map(|v| VariantDefinition {
                    name: v.variant,
                    rsid: v.rsid,
                    chromosome: v.chromosome,
                    position: v.position,
                    description: v.description,
                })
                .collect(),
            additional_rsids: doc.additional_rsids,
            ancestry_compatibility: doc.ancestry_compatibility,
            research_sources: doc.research_sources,
            notes: doc.notes,
            gene_description: doc.gene_description,
        }
    }
}

impl Dataset for GeneCatalog {
    type Output = Vec<GeneRecord>;

    /// Loads every gene document under the catalog directory, in file-name order.
    ///
    /// Documents that fail to parse are skipped with a warning. When two documents
    /// declare the same symbol the later one replaces the earlier record in place.
    fn load(&self) -> Result<Vec<GeneRecord>> {
        if !self.path.is_dir() {
            bail!("Gene catalog directory not found: {}", self.path.display());
        }
        info!("Loading gene catalog from: {}", self.path.display());

        let files = yaml_files(&self.path);
        info!("Found {} YAML files", files.len());

        let mut genes: Vec<GeneRecord> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for file in &files {
            let gene = match parse_gene_file(file) {
                Ok(gene) => gene,
                Err(e) => {
                    warn!("Error parsing {}: {:#}", file.display(), e);
                    continue;
                }
            };

            match positions.get(&gene.symbol) {
                Some(&index) => {
                    warn!(
                        "Duplicate gene {} in {}; replacing the earlier definition",
                        gene.symbol,
                        file.display()
                    );
                    genes[index] = gene;
                }
                None => {
                    positions.insert(gene.symbol.clone(), genes.len());
                    genes.push(gene);
                }
            }
        }

        info!("Loaded {} genes from catalog", genes.len());
        Ok(genes)
    }
}

fn yaml_files(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable catalog entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map_or(false, |ext| ext == "yaml" || ext == "yml")
        })
        .collect()
}

fn parse_gene_file(path: &Path) -> Result<GeneRecord> {
    let text = fs::read_to_string(path).context("failed to read file")?;
    let doc: GeneDocument = serde_yaml::from_str(&text).context("invalid gene document")?;
    Ok(doc.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MTHFR: &str = r#"
gene: MTHFR
full_name: Methylenetetrahydrofolate Reductase
category: top-priority-genes
function: Converts folate into its active form.
health_impact:
  - Homocysteine levels
common_variants:
  - variant: C677T
    rsid: rs1801133
    chromosome: 1
    position: 11856378
    description: Reduces enzyme activity.
  - variant: A1298C
    rsid: rs1801131
    chromosome: "1"
    position: "11854476"
    description: Mildly reduces enzyme activity.
research_sources:
  - PubMed
"#;

    fn write(dir: &Path, name: &str, contents: &str) {
        let path = dir.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn minimal(symbol: &str, category: &str, full_name: &str) -> String {
        format!(
            "gene: {}\nfull_name: {}\ncategory: {}\nfunction: Something.\n",
            symbol, full_name, category
        )
    }

    #[test]
    fn parses_a_full_document() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "top-priority-genes/mthfr.yaml", MTHFR);

        let genes = GeneCatalog { path: dir.path().to_path_buf() }.load().unwrap();
        assert_eq!(genes.len(), 1);

        let gene = &genes[0];
        assert_eq!(gene.symbol, "MTHFR");
        assert_eq!(gene.category, Category::TopPriority);
        assert_eq!(gene.variants.len(), 2);
        assert_eq!(gene.variants[0].chromosome, "1");
        assert_eq!(gene.variants[1].position, 11854476);
        assert!(gene.ancestry_compatibility);
        assert_eq!(gene.research_sources, vec!["PubMed".to_string()]);
        assert!(gene.notes.is_empty());
    }

    #[test]
    fn optional_fields_take_defaults() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "clock.yaml",
            &format!("{}notes: ~\nancestry_compatibility: false\n", minimal("CLOCK", "sleep-circadian-rhythm-genes", "Clock")),
        );

        let genes = GeneCatalog { path: dir.path().to_path_buf() }.load().unwrap();
        let gene = &genes[0];
        assert!(gene.variants.is_empty());
        assert!(gene.health_impact.is_empty());
        assert!(gene.additional_rsids.is_empty());
        assert!(gene.notes.is_empty());
        assert!(!gene.ancestry_compatibility);
    }

    #[test]
    fn documents_missing_required_fields_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.yaml", "gene: BROKEN\ncategory: top-priority-genes\n");
        write(
            dir.path(),
            "b.yaml",
            "gene: BADVAR\nfull_name: x\ncategory: top-priority-genes\nfunction: y\ncommon_variants:\n  - variant: v\n    rsid: rs1\n",
        );
        write(dir.path(), "c.yaml", "not: [valid");
        write(dir.path(), "d.yaml", &minimal("COMT", "brain-mental-health-genes", "Catechol-O-methyltransferase"));
        write(dir.path(), "readme.md", "# not a gene");

        let genes = GeneCatalog { path: dir.path().to_path_buf() }.load().unwrap();
        assert_eq!(genes.len(), 1);
        assert_eq!(genes[0].symbol, "COMT");
    }

    #[test]
    fn walks_nested_directories_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b/comt.yaml", &minimal("COMT", "brain-mental-health-genes", "x"));
        write(dir.path(), "a/deep/apoe.yml", &minimal("APOE", "high-impact-health-genes", "x"));

        let genes = GeneCatalog { path: dir.path().to_path_buf() }.load().unwrap();
        let symbols: Vec<&str> = genes.iter().map(|g| g.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["APOE", "COMT"]);
    }

    #[test]
    fn duplicate_symbols_keep_the_later_document() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "1.yaml", &minimal("APOE", "high-impact-health-genes", "First"));
        write(dir.path(), "2.yaml", &minimal("COMT", "brain-mental-health-genes", "x"));
        write(dir.path(), "3.yaml", &minimal("APOE", "high-impact-health-genes", "Second"));

        let genes = GeneCatalog { path: dir.path().to_path_buf() }.load().unwrap();
        assert_eq!(genes.len(), 2);
        assert_eq!(genes[0].symbol, "APOE");
        assert_eq!(genes[0].full_name, "Second");
    }

    #[test]
    fn unknown_category_is_kept_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "x.yaml", &minimal("SIRT1", "longevity-genes", "Sirtuin 1"));

        let genes = GeneCatalog { path: dir.path().to_path_buf() }.load().unwrap();
        assert_eq!(genes[0].category, Category::Other("longevity-genes".to_string()));
    }

    #[test]
    fn missing_directory_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let result = GeneCatalog { path: dir.path().join("nope") }.load();
        assert!(result.is_err());
    }
}
