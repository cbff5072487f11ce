use crate::models::{Category, GeneRecord, GenotypeRecord, GenotypeTable, VariantDefinition};

pub fn variant(name: &str, rsid: &str) -> VariantDefinition {
    VariantDefinition {
        name: name.to_string(),
        rsid: rsid.to_string(),
        chromosome: "1".to_string(),
        position: 1000,
        description: format!("{} description.", name),
    }
}

pub fn gene(
    symbol: &str,
    category: Category,
    variants: Vec<VariantDefinition>,
    ancestry_compatibility: bool,
) -> GeneRecord {
    GeneRecord {
        symbol: symbol.to_string(),
        full_name: format!("{} full name", symbol),
        category,
        function: "Test function".to_string(),
        health_impact: vec!["Test impact".to_string()],
        variants,
        additional_rsids: vec![],
        ancestry_compatibility,
        research_sources: vec![],
        notes: String::new(),
        gene_description: String::new(),
    }
}

pub fn table(entries: &[(&str, char, char)]) -> GenotypeTable {
    entries
        .iter()
        .map(|(rsid, a, b)| GenotypeRecord::new(rsid, "1", 1000, *a, *b))
        .collect()
}
