use crate::models::{VariantDefinition, Zygosity};

/// The only variant the risk flag knows about (MTHFR C677T).
const RISK_VARIANT_MARKER: &str = "C677T";
const RISK_ALLELE: char = 'T';

/// Derives zygosity, a readable interpretation and the risk flag for a two-character genotype.
///
/// The risk flag is a placeholder rule: it fires only for variants whose name contains
/// "C677T" when the genotype carries a `T`. It is not a general risk model.
pub fn interpret(variant: &VariantDefinition, genotype: &str) -> (Zygosity, String, bool) {
    let mut alleles = genotype.chars();
    let first = alleles.next().unwrap_or('0');
    let second = alleles.next().unwrap_or(first);

    let (zygosity, interpretation) = if first == second {
        (
            Zygosity::Homozygous,
            format!("Both alleles are {}. {}", first, variant.description),
        )
    } else {
        (
            Zygosity::Heterozygous,
            format!(
                "One {} and one {} allele. {}",
                first, second, variant.description
            ),
        )
    };

    let is_risk_allele =
        genotype.contains(RISK_ALLELE) && variant.name.contains(RISK_VARIANT_MARKER);

    (zygosity, interpretation, is_risk_allele)
}
