use tracing::{debug, info};

use crate::analysis::interpretation::interpret;
use crate::models::{coverage_percentage, GeneRecord, GenotypeTable, LinkageOutcome, MatchSummary};

/// Linkage result for a single gene, folded into the run's `MatchSummary`.
struct GeneLinkage<'c> {
    symbol: &'c str,
    outcomes: Vec<LinkageOutcome<'c>>,
    variants_checked: usize,
    /// Set on the first missing variant of a gene the platform does not cover.
    flagged_untested: bool,
    /// Set when a covered gene ends with no match at all.
    flagged_unmatched: bool,
}

fn link_gene<'c>(table: &GenotypeTable, gene: &'c GeneRecord) -> GeneLinkage<'c> {
    let mut outcomes = Vec::new();
    let mut flagged_untested = false;

    for variant in &gene.variants {
        match table.get(&variant.rsid) {
            Some(record) => {
                debug!(
                    "{} {} at {}:{} matched {} at {}:{}",
                    gene.symbol, variant.name, variant.chromosome, variant.position,
                    record.genotype, record.chromosome, record.position
                );
                let (zygosity, interpretation, is_risk_allele) = interpret(variant, &record.genotype);
                outcomes.push(LinkageOutcome {
                    gene,
                    variant,
                    genotype: record.genotype.clone(),
                    zygosity,
                    interpretation,
                    is_risk_allele,
                });
            }
            None if !gene.ancestry_compatibility => flagged_untested = true,
            None => {}
        }
    }

    let flagged_unmatched = outcomes.is_empty() && gene.ancestry_compatibility && !gene.variants.is_empty();

    GeneLinkage {
        symbol: &gene.symbol,
        outcomes,
        variants_checked: gene.variants.len(),
        flagged_untested,
        flagged_unmatched,
    }
}

/// Joins every catalog variant against the genotype table.
///
/// Outcomes keep catalog order. A gene lands in `genes_without_matches` either when it is
/// not covered by the platform and at least one of its variants is missing, or when it is
/// covered and none of its variants matched. The first case can put a gene in both sets.
pub fn link<'c>(table: &GenotypeTable, catalog: &'c [GeneRecord]) -> MatchSummary<'c> {
    info!("Matching {} genes against {} genotypes", catalog.len(), table.len());

    let summary = catalog
        .iter()
        .map(|gene| link_gene(table, gene))
        .fold(MatchSummary::default(), merge);

    let summary = MatchSummary {
        coverage_percentage: coverage_percentage(
            summary.total_variants_found,
            summary.total_variants_checked,
        ),
        ..summary
    };

    info!(
        "Matched {} of {} variants",
        summary.total_variants_found, summary.total_variants_checked
    );
    info!("Coverage: {:.1}%", summary.coverage_percentage);
    summary
}

fn merge<'c>(mut summary: MatchSummary<'c>, linkage: GeneLinkage<'c>) -> MatchSummary<'c> {
    let found = linkage.outcomes.len();
    debug!(
        "{}: {} of {} variants found",
        linkage.symbol, found, linkage.variants_checked
    );

    if found > 0 {
        summary.genes_with_matches.insert(linkage.symbol.to_string());
    }
    if linkage.flagged_untested || linkage.flagged_unmatched {
        summary.genes_without_matches.insert(linkage.symbol.to_string());
    }
    summary.total_variants_checked += linkage.variants_checked;
    summary.total_variants_found += found;
    summary.outcomes.extend(linkage.outcomes);
    summary
}
