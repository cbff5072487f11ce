use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use crate::models::{
    coverage_percentage, CatalogStatistics, Category, CategoryStatistics, GeneRecord,
    GeneStatistics, MatchSummary, OverallStatistics,
};

/// Rolls the linkage outcomes up per gene, per category and overall.
///
/// `genes_without_matches` here is `total_genes - genes_with_matches` for the category and
/// is independent of the set of the same name on `MatchSummary`.
pub fn aggregate(genes: &[GeneRecord], summary: &MatchSummary<'_>) -> CatalogStatistics {
    let mut by_category: BTreeMap<&Category, Vec<&GeneRecord>> = BTreeMap::new();
    for gene in genes {
        by_category.entry(&gene.category).or_default().push(gene);
    }

    let categories: BTreeMap<Category, CategoryStatistics> = by_category
        .into_iter()
        .map(|(category, category_genes)| {
            let stats = category_statistics(category, &category_genes, summary);
            debug!(
                "{}: {} genes, {}/{} variants",
                stats.category_name,
                stats.total_genes,
                stats.total_variants_found,
                stats.total_variants_checked
            );
            (category.clone(), stats)
        })
        .collect();

    let overall = overall_statistics(categories.values());

    CatalogStatistics { categories, overall }
}

fn category_statistics(
    category: &Category,
    genes: &[&GeneRecord],
    summary: &MatchSummary<'_>,
) -> CategoryStatistics {
    let matches: Vec<_> = summary
        .outcomes
        .iter()
        .filter(|outcome| &outcome.gene.category == category)
        .collect();

    let total_variants_checked: usize = genes.iter().map(|gene| gene.variants.len()).sum();
    let total_variants_found = matches.len();
    let genes_with_matches = matches
        .iter()
        .map(|outcome| outcome.gene.symbol.as_str())
        .collect::<HashSet<_>>()
        .len();

    let gene_breakdown = genes
        .iter()
        .map(|gene| {
            let variants_found = matches
                .iter()
                .filter(|outcome| outcome.gene.symbol == gene.symbol)
                .count();
            GeneStatistics {
                symbol: gene.symbol.clone(),
                variants_checked: gene.variants.len(),
                variants_found,
                coverage_percentage: coverage_percentage(variants_found, gene.variants.len()),
            }
        })
        .collect();

    CategoryStatistics {
        category_name: category.display_name().to_string(),
        total_genes: genes.len(),
        total_variants_checked,
        total_variants_found,
        coverage_percentage: coverage_percentage(total_variants_found, total_variants_checked),
        genes_with_matches,
        genes_without_matches: genes.len() - genes_with_matches,
        genes: gene_breakdown,
    }
}

fn overall_statistics<'a>(categories: impl Iterator<Item = &'a CategoryStatistics>) -> OverallStatistics {
    let totals = categories.fold(OverallStatistics::default(), |acc, stats| OverallStatistics {
        total_genes: acc.total_genes + stats.total_genes,
        total_variants_checked: acc.total_variants_checked + stats.total_variants_checked,
        total_variants_found: acc.total_variants_found + stats.total_variants_found,
        coverage_percentage: 0.0,
        genes_with_matches: acc.genes_with_matches + stats.genes_with_matches,
        genes_without_matches: acc.genes_without_matches + stats.genes_without_matches,
    });

    OverallStatistics {
        coverage_percentage: coverage_percentage(totals.total_variants_found, totals.total_variants_checked),
        ..totals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::linkage::link;
    use crate::test_fixtures::{gene, table, variant};

    #[test]
    fn half_covered_category() {
        let catalog = vec![
            gene("COMT", Category::BrainMentalHealth, vec![variant("V158M", "rs4680"), variant("x", "rs2")], true),
            gene("BDNF", Category::BrainMentalHealth, vec![variant("V66M", "rs6265"), variant("y", "rs9")], true),
        ];
        let genotypes = table(&[("rs4680", 'A', 'G'), ("rs2", 'C', 'C')]);
        let summary = link(&genotypes, &catalog);
        let stats = aggregate(&catalog, &summary);

        let brain = &stats.categories[&Category::BrainMentalHealth];
        assert_eq!(brain.category_name, "Brain & Mental Health Genes");
        assert_eq!(brain.total_genes, 2);
        assert_eq!(brain.total_variants_checked, 4);
        assert_eq!(brain.total_variants_found, 2);
        assert_eq!(brain.coverage_percentage, 50.0);
        assert_eq!(brain.genes_with_matches, 1);
        assert_eq!(brain.genes_without_matches, 1);

        assert_eq!(brain.genes[0].symbol, "COMT");
        assert_eq!(brain.genes[0].coverage_percentage, 100.0);
        assert_eq!(brain.genes[1].variants_found, 0);
    }

    #[test]
    fn empty_catalog_has_no_categories() {
        let summary = link(&table(&[]), &[]);
        let stats = aggregate(&[], &summary);

        assert!(stats.categories.is_empty());
        assert_eq!(stats.overall, OverallStatistics::default());
    }

    #[test]
    fn overall_is_the_sum_of_categories() {
        let catalog = vec![
            gene("MTHFR", Category::TopPriority, vec![variant("C677T", "rs1801133")], true),
            gene("APOE", Category::HighImpactHealth, vec![variant("E4", "rs429358"), variant("E2", "rs7412")], true),
            gene("CYP1A2", Category::MetabolismDetoxification, vec![variant("*1F", "rs762551")], false),
            gene("EMPTY", Category::MetabolismDetoxification, vec![], true),
        ];
        let genotypes = table(&[("rs1801133", 'C', 'T'), ("rs7412", 'C', 'C')]);
        let summary = link(&genotypes, &catalog);
        let stats = aggregate(&catalog, &summary);

        assert_eq!(stats.categories.len(), 3);
        assert_eq!(stats.overall.total_genes, 4);
        assert_eq!(stats.overall.total_variants_checked, 4);
        assert_eq!(stats.overall.total_variants_found, 2);
        assert_eq!(stats.overall.coverage_percentage, 50.0);
        assert_eq!(stats.overall.genes_with_matches, 2);
        assert_eq!(stats.overall.genes_without_matches, 2);

        for category in stats.categories.values() {
            assert!(category.total_variants_found <= category.total_variants_checked);
            assert_eq!(
                category.genes_without_matches,
                category.total_genes - category.genes_with_matches
            );
        }
    }

    #[test]
    fn categories_iterate_in_report_order() {
        let catalog = vec![
            gene("X", Category::Other("zz-extra".to_string()), vec![], true),
            gene("CLOCK", Category::SleepCircadianRhythm, vec![], true),
            gene("MTHFR", Category::TopPriority, vec![], true),
        ];
        let summary = link(&table(&[]), &catalog);
        let stats = aggregate(&catalog, &summary);

        let order: Vec<&Category> = stats.categories.keys().collect();
        assert_eq!(
            order,
            vec![
                &Category::TopPriority,
                &Category::SleepCircadianRhythm,
                &Category::Other("zz-extra".to_string())
            ]
        );
    }
}
