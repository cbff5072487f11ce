use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use anyhow::Result;
use serde::Deserialize;

/// Anything the pipeline reads from disk before matching starts.
pub trait Dataset {
    type Output;

    fn load(&self) -> Result<Self::Output>;
}

/// One genotype call from the raw DNA export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenotypeRecord {
    pub rsid: String,
    pub chromosome: String,
    pub position: u64,
    pub allele1: char,
    pub allele2: char,
    /// `allele1` followed by `allele2`, e.g. "AG".
    pub genotype: String,
}

impl GenotypeRecord {
    pub fn new(rsid: &str, chromosome: &str, position: u64, allele1: char, allele2: char) -> Self {
        Self {
            rsid: rsid.to_string(),
            chromosome: chromosome.to_string(),
            position,
            allele1,
            allele2,
            genotype: format!("{}{}", allele1, allele2),
        }
    }

    pub fn is_homozygous(&self) -> bool {
        self.allele1 == self.allele2
    }
}

/// Lookup table from rsid to the observed genotype.
#[derive(Debug, Clone, Default)]
pub struct GenotypeTable {
    records: HashMap<String, GenotypeRecord>,
}

impl GenotypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record; a later record for the same rsid replaces the earlier one.
    pub fn insert(&mut self, record: GenotypeRecord) {
        self.records.insert(record.rsid.clone(), record);
    }

    pub fn get(&self, rsid: &str) -> Option<&GenotypeRecord> {
        self.records.get(rsid)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GenotypeRecord> {
        self.records.values()
    }
}

impl FromIterator<GenotypeRecord> for GenotypeTable {
    fn from_iter<I: IntoIterator<Item = GenotypeRecord>>(iter: I) -> Self {
        let mut table = GenotypeTable::new();
        for record in iter {
            table.insert(record);
        }
        table
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantDefinition {
    /// Variant label such as "C677T".
    pub name: String,
    pub rsid: String,
    pub chromosome: String,
    pub position: u64,
    pub description: String,
}

/// Catalog category. The declaration order is the order categories appear in the report.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(from = "String")]
pub enum Category {
    TopPriority,
    HighImpactHealth,
    MetabolismDetoxification,
    CardiovascularHeartHealth,
    ImmuneInflammation,
    BrainMentalHealth,
    SleepCircadianRhythm,
    HormoneReproductiveHealth,
    NutrientMetabolism,
    AdditionalImportant,
    Other(String),
}

impl Category {
    pub const KNOWN: [Category; 10] = [
        Category::TopPriority,
        Category::HighImpactHealth,
        Category::MetabolismDetoxification,
        Category::CardiovascularHeartHealth,
        Category::ImmuneInflammation,
        Category::BrainMentalHealth,
        Category::SleepCircadianRhythm,
        Category::HormoneReproductiveHealth,
        Category::NutrientMetabolism,
        Category::AdditionalImportant,
    ];

    /// The tag used in catalog documents and as the report anchor.
    pub fn tag(&self) -> &str {
        match self {
            Category::TopPriority => "top-priority-genes",
            Category::HighImpactHealth => "high-impact-health-genes",
            Category::MetabolismDetoxification => "metabolism-detoxification-genes",
            Category::CardiovascularHeartHealth => "cardiovascular-heart-health-genes",
            Category::ImmuneInflammation => "immune-inflammation-genes",
            Category::BrainMentalHealth => "brain-mental-health-genes",
            Category::SleepCircadianRhythm => "sleep-circadian-rhythm-genes",
            Category::HormoneReproductiveHealth => "hormone-reproductive-health-genes",
            Category::NutrientMetabolism => "nutrient-metabolism-genes",
            Category::AdditionalImportant => "additional-important-genes",
            Category::Other(tag) => tag,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Category::TopPriority => "Top Priority Genes",
            Category::HighImpactHealth => "High-Impact Health Genes",
            Category::MetabolismDetoxification => "Metabolism & Detoxification Genes",
            Category::CardiovascularHeartHealth => "Cardiovascular & Heart Health Genes",
            Category::ImmuneInflammation => "Immune & Inflammation Genes",
            Category::BrainMentalHealth => "Brain & Mental Health Genes",
            Category::SleepCircadianRhythm => "Sleep & Circadian Rhythm Genes",
            Category::HormoneReproductiveHealth => "Hormone & Reproductive Health Genes",
            Category::NutrientMetabolism => "Nutrient Metabolism Genes",
            Category::AdditionalImportant => "Additional Important Genes",
            Category::Other(tag) => tag,
        }
    }
}

impl From<String> for Category {
    fn from(tag: String) -> Self {
        Category::KNOWN
            .iter()
            .find(|known| known.tag() == tag)
            .cloned()
            .unwrap_or(Category::Other(tag))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneRecord {
    pub symbol: String,
    pub full_name: String,
    pub category: Category,
    pub function: String,
    pub health_impact: Vec<String>,
    pub variants: Vec<VariantDefinition>,
    pub additional_rsids: Vec<String>,
    /// Whether the testing platform is expected to cover this gene's variants.
    pub ancestry_compatibility: bool,
    pub research_sources: Vec<String>,
    pub notes: String,
    pub gene_description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zygosity {
    Homozygous,
    Heterozygous,
}

impl Zygosity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Zygosity::Homozygous => "Homozygous",
            Zygosity::Heterozygous => "Heterozygous",
        }
    }
}

impl fmt::Display for Zygosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A catalog variant whose rsid was found in the genotype table.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkageOutcome<'c> {
    pub gene: &'c GeneRecord,
    pub variant: &'c VariantDefinition,
    pub genotype: String,
    pub zygosity: Zygosity,
    pub interpretation: String,
    pub is_risk_allele: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MatchSummary<'c> {
    /// Outcomes in catalog order (gene order, then variant order).
    pub outcomes: Vec<LinkageOutcome<'c>>,
    pub genes_with_matches: BTreeSet<String>,
    /// Genes flagged by the linkage pass. May overlap `genes_with_matches`
    /// for genes the platform is not expected to cover.
    pub genes_without_matches: BTreeSet<String>,
    pub total_variants_checked: usize,
    pub total_variants_found: usize,
    pub coverage_percentage: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneStatistics {
    pub symbol: String,
    pub variants_checked: usize,
    pub variants_found: usize,
    pub coverage_percentage: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryStatistics {
    pub category_name: String,
    pub total_genes: usize,
    pub total_variants_checked: usize,
    pub total_variants_found: usize,
    pub coverage_percentage: f64,
    pub genes_with_matches: usize,
    pub genes_without_matches: usize,
    /// Per-gene breakdown in catalog order.
    pub genes: Vec<GeneStatistics>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct OverallStatistics {
    pub total_genes: usize,
    pub total_variants_checked: usize,
    pub total_variants_found: usize,
    pub coverage_percentage: f64,
    pub genes_with_matches: usize,
    pub genes_without_matches: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CatalogStatistics {
    pub categories: BTreeMap<Category, CategoryStatistics>,
    pub overall: OverallStatistics,
}

/// `100 * found / checked`, or 0 when nothing was checked.
pub fn coverage_percentage(found: usize, checked: usize) -> f64 {
    if checked == 0 {
        0.0
    } else {
        found as f64 / checked as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_tags_round_trip_to_known_variants() {
        for category in Category::KNOWN.iter() {
            assert_eq!(&Category::from(category.tag().to_string()), category);
        }
        assert_eq!(
            Category::from("longevity-genes".to_string()),
            Category::Other("longevity-genes".to_string())
        );
    }

    #[test]
    fn unknown_categories_sort_after_known_ones() {
        let mut categories = vec![
            Category::Other("aaa".to_string()),
            Category::AdditionalImportant,
            Category::TopPriority,
        ];
        categories.sort();
        assert_eq!(categories[0], Category::TopPriority);
        assert_eq!(categories[2], Category::Other("aaa".to_string()));
    }

    #[test]
    fn coverage_is_zero_without_checked_variants() {
        assert_eq!(coverage_percentage(0, 0), 0.0);
        assert_eq!(coverage_percentage(1, 4), 25.0);
    }

    #[test]
    fn later_genotype_replaces_earlier_for_same_rsid() {
        let table: GenotypeTable = vec![
            GenotypeRecord::new("rs1", "1", 10, 'A', 'A'),
            GenotypeRecord::new("rs1", "1", 10, 'A', 'G'),
        ]
        .into_iter()
        .collect();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("rs1").unwrap().genotype, "AG");
        assert!(!table.get("rs1").unwrap().is_homozygous());
    }
}
