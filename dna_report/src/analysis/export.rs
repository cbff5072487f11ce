use std::fs::{self, File};
use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use polars::df;
use polars::prelude::*;

use crate::models::{CatalogStatistics, MatchSummary};

pub const CATEGORY_STATISTICS_CSV: &str = "category_statistics.csv";
pub const MATCHED_VARIANTS_CSV: &str = "matched_variants.csv";

/// Writes the category statistics and the matched variants as CSV tables into `dir`.
pub fn export_tables(dir: &Path, stats: &CatalogStatistics, summary: &MatchSummary<'_>) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create export directory {}", dir.display()))?;

    let mut categories = category_frame(stats)?;
    write_csv(&mut categories, &dir.join(CATEGORY_STATISTICS_CSV))?;

    let mut matches = matched_variants_frame(summary)?;
    write_csv(&mut matches, &dir.join(MATCHED_VARIANTS_CSV))?;

    Ok(())
}

/// One row per category in report order, followed by an "Overall" row.
pub fn category_frame(stats: &CatalogStatistics) -> PolarsResult<DataFrame> {
    let mut names = Vec::new();
    let mut tags = Vec::new();
    let mut genes = Vec::new();
    let mut checked = Vec::new();
    let mut found = Vec::new();
    let mut coverage = Vec::new();
    let mut with_matches = Vec::new();
    let mut without_matches = Vec::new();

    for (category, s) in &stats.categories {
        names.push(s.category_name.clone());
        tags.push(category.tag().to_string());
        genes.push(s.total_genes as u64);
        checked.push(s.total_variants_checked as u64);
        found.push(s.total_variants_found as u64);
        coverage.push(s.coverage_percentage);
        with_matches.push(s.genes_with_matches as u64);
        without_matches.push(s.genes_without_matches as u64);
    }

    let overall = &stats.overall;
    names.push("Overall".to_string());
    tags.push("overall".to_string());
    genes.push(overall.total_genes as u64);
    checked.push(overall.total_variants_checked as u64);
    found.push(overall.total_variants_found as u64);
    coverage.push(overall.coverage_percentage);
    with_matches.push(overall.genes_with_matches as u64);
    without_matches.push(overall.genes_without_matches as u64);

    df![
        "category" => names,
        "tag" => tags,
        "genes" => genes,
        "variants_checked" => checked,
        "variants_found" => found,
        "coverage_percentage" => coverage,
        "genes_with_matches" => with_matches,
        "genes_without_matches" => without_matches
    ]
}

/// One row per linkage outcome, in catalog order.
pub fn matched_variants_frame(summary: &MatchSummary<'_>) -> PolarsResult<DataFrame> {
    let outcomes = &summary.outcomes;

    df![
        "gene" => outcomes.iter().map(|o| o.gene.symbol.clone()).collect::<Vec<_>>(),
        "category" => outcomes.iter().map(|o| o.gene.category.tag().to_string()).collect::<Vec<_>>(),
        "variant" => outcomes.iter().map(|o| o.variant.name.clone()).collect::<Vec<_>>(),
        "rsid" => outcomes.iter().map(|o| o.variant.rsid.clone()).collect::<Vec<_>>(),
        "genotype" => outcomes.iter().map(|o| o.genotype.clone()).collect::<Vec<_>>(),
        "zygosity" => outcomes.iter().map(|o| o.zygosity.as_str().to_string()).collect::<Vec<_>>(),
        "risk_allele" => outcomes.iter().map(|o| o.is_risk_allele).collect::<Vec<_>>()
    ]
}

fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let mut file = File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b',')
        .finish(df)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    info!("Wrote {} rows to {}", df.height(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::aggregation::aggregate;
    use crate::analysis::linkage::link;
    use crate::models::Category;
    use crate::test_fixtures::{gene, table, variant};

    #[test]
    fn writes_both_tables() {
        let catalog = vec![
            gene("MTHFR", Category::TopPriority, vec![variant("C677T", "rs1801133")], true),
            gene("APOE", Category::HighImpactHealth, vec![variant("E4", "rs429358")], true),
        ];
        let summary = link(&table(&[("rs1801133", 'T', 'T')]), &catalog);
        let stats = aggregate(&catalog, &summary);

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("tables");
        export_tables(&out, &stats, &summary).unwrap();

        let categories = fs::read_to_string(out.join(CATEGORY_STATISTICS_CSV)).unwrap();
        let lines: Vec<&str> = categories.lines().collect();
        assert_eq!(
            lines[0],
            "category,tag,genes,variants_checked,variants_found,coverage_percentage,genes_with_matches,genes_without_matches"
        );
        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with("Top Priority Genes,top-priority-genes,1,1,1,"));
        assert!(lines[3].starts_with("Overall,overall,2,2,1,"));

        let matches = fs::read_to_string(out.join(MATCHED_VARIANTS_CSV)).unwrap();
        let lines: Vec<&str> = matches.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "MTHFR,top-priority-genes,C677T,rs1801133,TT,Homozygous,true");
    }

    #[test]
    fn empty_summary_gives_header_only_matches_frame() {
        let summary = link(&table(&[]), &[]);
        let df = matched_variants_frame(&summary).unwrap();
        assert_eq!(df.height(), 0);
        assert_eq!(df.width(), 7);

        let stats = aggregate(&[], &summary);
        assert_eq!(category_frame(&stats).unwrap().height(), 1);
    }
}
