use std::collections::BTreeSet;
use std::fmt::{self, Write as _};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::helper_functions::truncate_chars;
use crate::models::{CatalogStatistics, Category, GeneRecord, LinkageOutcome, MatchSummary};

const LIST_LIMIT: usize = 20;
const TABLE_INTERPRETATION_CHARS: usize = 100;
const RISK_INTERPRETATION_CHARS: usize = 80;

/// Renders the markdown report from the catalog, the linkage summary and the statistics.
pub struct ReportGenerator<'a> {
    genes: &'a [GeneRecord],
    summary: &'a MatchSummary<'a>,
    stats: &'a CatalogStatistics,
    source: String,
    generated_at: String,
}

impl<'a> ReportGenerator<'a> {
    pub fn new(
        genes: &'a [GeneRecord],
        summary: &'a MatchSummary<'a>,
        stats: &'a CatalogStatistics,
        source: impl Into<String>,
    ) -> Self {
        Self {
            genes,
            summary,
            stats,
            source: source.into(),
            generated_at: chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        }
    }

    /// Overrides the generation timestamp shown in the header and footer.
    #[cfg(test)]
    pub fn generated_at(mut self, timestamp: impl Into<String>) -> Self {
        self.generated_at = timestamp.into();
        self
    }

    pub fn render(&self) -> Result<String> {
        let mut parts = vec![
            self.header()?,
            self.table_of_contents()?,
            self.overall_statistics()?,
            self.methodology()?,
        ];
        for category in self.stats.categories.keys() {
            parts.push(self.category_section(category)?);
        }
        parts.push(self.summary_and_recommendations()?);
        parts.push(self.disclaimer()?);

        Ok(parts.join("\n\n"))
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        info!("Generating report: {}", path.display());
        let content = self.render()?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(path, content).with_context(|| format!("Failed to write report {}", path.display()))?;

        info!("Report generated successfully: {}", path.display());
        Ok(())
    }

    fn header(&self) -> Result<String, fmt::Error> {
        let mut out = String::new();
        writeln!(out, "# DNA Analysis Report from Ancestry.com Raw Data")?;
        writeln!(out)?;
        writeln!(out, "**Generated:** {}", self.generated_at)?;
        writeln!(out, "**Source:** {}", self.source)?;
        writeln!(out, "**Genes Analyzed:** {}", self.genes.len())?;
        Ok(out)
    }

    fn table_of_contents(&self) -> Result<String, fmt::Error> {
        let mut entries = vec![
            ("Overall Statistics".to_string(), "overall-statistics".to_string()),
            ("Methodology".to_string(), "methodology".to_string()),
        ];
        let others: BTreeSet<&Category> = self
            .stats
            .categories
            .keys()
            .filter(|c| matches!(c, Category::Other(_)))
            .collect();
        for category in Category::KNOWN.iter().chain(others) {
            entries.push((category.display_name().to_string(), category.tag().to_string()));
        }
        entries.push(("Summary & Recommendations".to_string(), "summary--recommendations".to_string()));
        entries.push(("Disclaimer".to_string(), "disclaimer".to_string()));

        let mut out = String::from("## Table of Contents\n\n");
        for (i, (title, anchor)) in entries.iter().enumerate() {
            writeln!(out, "{}. [{}](#{})", i + 1, title, anchor)?;
        }
        Ok(out)
    }

    fn overall_statistics(&self) -> Result<String, fmt::Error> {
        let overall = &self.stats.overall;
        let mut out = String::from("## Overall Statistics\n\n### Analysis Coverage\n\n");
        writeln!(out, "| Category | Genes | Variants Checked | Variants Found | Coverage |")?;
        writeln!(out, "|----------|--------|------------------|----------------|----------|")?;
        for stats in self.stats.categories.values() {
            writeln!(
                out,
                "| {} | {} | {} | {} | {:.1}% |",
                stats.category_name,
                stats.total_genes,
                stats.total_variants_checked,
                stats.total_variants_found,
                stats.coverage_percentage
            )?;
        }
        writeln!(out)?;
        writeln!(out, "### Summary")?;
        writeln!(out)?;
        writeln!(out, "- **Total Genes Analyzed:** {}", self.genes.len())?;
        writeln!(out, "- **Total Variants Checked:** {}", overall.total_variants_checked)?;
        writeln!(out, "- **Total Variants Found:** {}", overall.total_variants_found)?;
        writeln!(out, "- **Overall Coverage:** {:.1}%", overall.coverage_percentage)?;
        Ok(out)
    }

    fn methodology(&self) -> Result<String, fmt::Error> {
        let mut out = String::from("## Methodology\n\nThis report was generated by:\n\n");
        out.push_str("1. **Parsing the raw DNA file** - Extracting all genotype data for rsids\n");
        out.push_str("2. **Loading the gene catalog** - Reading every gene document in the catalog directory\n");
        out.push_str("3. **Matching variants** - Comparing DNA genotypes against gene variants\n");
        out.push_str("4. **Generating analysis sections** - Creating category-specific genetic insights\n");
        out.push_str("5. **Compiling the report** - Assembling all findings into a single document\n\n");

        writeln!(out, "### Data Sources")?;
        writeln!(out)?;
        writeln!(out, "- **DNA test data:** Ancestry.com raw data export ({})", self.source)?;
        writeln!(
            out,
            "- **Gene catalog:** {} genes, {} categories",
            self.genes.len(),
            self.stats.categories.len()
        )?;
        writeln!(out, "- **Variant information:** Gene documents with rsid, chromosome, position, and descriptions")?;
        writeln!(out)?;

        out.push_str("### Limitations\n\n");
        out.push_str("- Only includes variants tested by Ancestry.com (~700,000 SNPs)\n");
        out.push_str("- Some gene variants may not be covered (marked with `ancestry_compatibility: false`)\n");
        out.push_str("- Interpretations are based on available research and may not be complete\n");
        out.push_str("- This is not medical advice; consult healthcare professionals\n");
        out.push_str("- Genetic risk is influenced by many factors including environment, lifestyle, and other genes\n\n");

        out.push_str("### Genotype Interpretation\n\n");
        out.push_str("- **Homozygous:** Both alleles are the same (e.g., AA, GG, TT, CC)\n");
        out.push_str("- **Heterozygous:** Two different alleles (e.g., AG, TC)\n");
        out.push_str("- Risk alleles are identified based on variant descriptions from research sources\n");
        out.push_str("- Each variant interpretation includes information from the gene catalog\n");
        Ok(out)
    }

    fn category_section(&self, category: &Category) -> Result<String, fmt::Error> {
        let stats = &self.stats.categories[category];
        let name = category.display_name();
        let category_genes: Vec<&GeneRecord> =
            self.genes.iter().filter(|g| &g.category == category).collect();

        // Outcomes are in catalog order, so a gene's matches are contiguous.
        let mut matches_by_gene: Vec<(&GeneRecord, Vec<&LinkageOutcome<'_>>)> = Vec::new();
        for outcome in self.summary.outcomes.iter().filter(|o| &o.gene.category == category) {
            match matches_by_gene.last_mut() {
                Some((gene, matches)) if gene.symbol == outcome.gene.symbol => matches.push(outcome),
                _ => matches_by_gene.push((outcome.gene, vec![outcome])),
            }
        }

        let mut out = String::new();
        writeln!(out, "<a id=\"{}\"></a>", category.tag())?;
        writeln!(out, "## {}", name)?;
        writeln!(out)?;
        writeln!(out, "### Genetic Classification")?;
        writeln!(out)?;
        writeln!(
            out,
            "This category contains {} genes related to {}. These genes play important roles in various \
             biological processes and have been identified through research as having significant health implications.",
            stats.total_genes,
            name.to_lowercase()
        )?;
        writeln!(out)?;
        writeln!(out, "### Genes in This Category")?;
        writeln!(out)?;
        writeln!(out, "**Total Genes:** {}", stats.total_genes)?;
        writeln!(out, "**Variants Analyzed:** {}", stats.total_variants_checked)?;
        writeln!(out, "**Variants Found in DNA Data:** {}", stats.total_variants_found)?;
        writeln!(out, "**Coverage:** {:.1}%", stats.coverage_percentage)?;
        writeln!(out)?;

        writeln!(out, "#### Gene Information")?;
        writeln!(out)?;
        for (gene, gene_stats) in category_genes.iter().zip(&stats.genes) {
            writeln!(out, "**{}** - {}", gene.symbol.to_uppercase(), gene.full_name)?;
            if !gene.gene_description.is_empty() {
                writeln!(out, "- **Description:** {}", gene.gene_description)?;
            }
            writeln!(out, "- **Function:** {}", gene.function)?;
            writeln!(out, "- **Health Impacts:** {}", gene.health_impact.join(", "))?;
            writeln!(out, "- **Variants Tracked:** {} common variants", gene.variants.len())?;
            writeln!(
                out,
                "- **Variants Found:** {} of {} ({:.1}%)",
                gene_stats.variants_found, gene_stats.variants_checked, gene_stats.coverage_percentage
            )?;
            if !gene.additional_rsids.is_empty() {
                writeln!(out, "- **Additional rsids:** {}", gene.additional_rsids.join(", "))?;
            }
            if !gene.research_sources.is_empty() {
                writeln!(out, "- **Research Sources:** {}", gene.research_sources.join("; "))?;
            }
            if !gene.notes.is_empty() {
                writeln!(out, "- **Notes:** {}", gene.notes)?;
            }
            if !gene.ancestry_compatibility {
                writeln!(out, "- **Note:** Some variants may not be tested by Ancestry.com")?;
            }
            writeln!(out)?;
        }

        writeln!(out, "### DNA Analysis Results")?;
        writeln!(out)?;
        if matches_by_gene.is_empty() {
            writeln!(out, "**No variants found in DNA data for this category.**")?;
            writeln!(out)?;
        }
        for (gene, matches) in &matches_by_gene {
            writeln!(out, "#### {} - {}", gene.symbol.to_uppercase(), gene.full_name)?;
            writeln!(out)?;
            writeln!(out, "**Function:** {}", gene.function)?;
            writeln!(out)?;
            writeln!(out, "**Health Impacts:**")?;
            for impact in &gene.health_impact {
                writeln!(out, "- {}", impact)?;
            }
            writeln!(out)?;
            writeln!(out, "**Variants Found:**")?;
            writeln!(out)?;
            writeln!(out, "| Variant | rsid | Genotype | Type | Interpretation |")?;
            writeln!(out, "|----------|------|----------|------|----------------|")?;
            for mv in matches {
                writeln!(
                    out,
                    "| {} | {} | {} | {} | {}... |",
                    escape_cell(&mv.variant.name),
                    mv.variant.rsid,
                    mv.genotype,
                    mv.zygosity,
                    escape_cell(truncate_chars(&mv.interpretation, TABLE_INTERPRETATION_CHARS))
                )?;
            }
            writeln!(out)?;
        }

        writeln!(out, "### Category Summary")?;
        writeln!(out)?;
        writeln!(out, "**Key Findings:**")?;
        writeln!(
            out,
            "- {} of {} genes have matching variants in your DNA data",
            stats.genes_with_matches, stats.total_genes
        )?;
        writeln!(
            out,
            "- {} variants were found out of {} checked",
            stats.total_variants_found, stats.total_variants_checked
        )?;
        writeln!(out, "- Coverage: {:.1}%", stats.coverage_percentage)?;
        writeln!(out)?;

        if stats.genes_without_matches > 0 {
            writeln!(
                out,
                "**Note:** {} genes in this category have no matching variants. This could mean:",
                stats.genes_without_matches
            )?;
            writeln!(out, "- The variants are not tested by Ancestry.com")?;
            writeln!(out, "- You have the normal (non-risk) alleles")?;
            writeln!(out, "- The variants are not present in your DNA")?;
            writeln!(out)?;
        }
        Ok(out)
    }

    fn summary_and_recommendations(&self) -> Result<String, fmt::Error> {
        let overall = &self.stats.overall;
        let risk_variants: Vec<&LinkageOutcome<'_>> =
            self.summary.outcomes.iter().filter(|o| o.is_risk_allele).collect();
        let needs_testing: Vec<&GeneRecord> =
            self.genes.iter().filter(|g| !g.ancestry_compatibility).collect();

        let mut out = String::from("## Summary & Recommendations\n\n### Overall Findings\n\n");
        writeln!(
            out,
            "This DNA analysis report examined {} genes across {} categories, checking {} genetic variants \
             against your Ancestry.com test results. A total of {} variants were found in your DNA data.",
            self.genes.len(),
            self.stats.categories.len(),
            overall.total_variants_checked,
            overall.total_variants_found
        )?;
        writeln!(out)?;
        writeln!(out, "### Notable Findings")?;
        writeln!(out)?;
        writeln!(out, "- **Total Genes Analyzed:** {}", self.genes.len())?;
        writeln!(out, "- **Total Variants Checked:** {}", overall.total_variants_checked)?;
        writeln!(out, "- **Variants Found:** {}", overall.total_variants_found)?;
        writeln!(out, "- **Risk Alleles Identified:** {}", risk_variants.len())?;
        writeln!(out, "- **Genes Requiring Additional Testing:** {}", needs_testing.len())?;
        writeln!(out)?;

        writeln!(out, "### Risk Alleles")?;
        writeln!(out)?;
        if risk_variants.is_empty() {
            writeln!(out, "- No significant risk alleles identified in this analysis.")?;
        }
        for rv in risk_variants.iter().take(LIST_LIMIT) {
            writeln!(
                out,
                "- **{}** ({}): {} - {}...",
                rv.gene.symbol.to_uppercase(),
                rv.variant.rsid,
                rv.variant.name,
                truncate_chars(&rv.interpretation, RISK_INTERPRETATION_CHARS)
            )?;
        }
        if risk_variants.len() > LIST_LIMIT {
            writeln!(
                out,
                "- ... and {} additional risk alleles (see category sections for details)",
                risk_variants.len() - LIST_LIMIT
            )?;
        }
        writeln!(out)?;

        writeln!(out, "### Genes Requiring Additional Testing")?;
        writeln!(out)?;
        writeln!(out, "The following genes have variants that may not be tested by Ancestry.com:")?;
        writeln!(out)?;
        if needs_testing.is_empty() {
            writeln!(out, "- All genes in this catalog are compatible with Ancestry.com testing.")?;
        }
        for gene in needs_testing.iter().take(LIST_LIMIT) {
            writeln!(out, "- **{}** - {}", gene.symbol.to_uppercase(), gene.full_name)?;
        }
        if needs_testing.len() > LIST_LIMIT {
            writeln!(out, "- ... and {} additional genes", needs_testing.len() - LIST_LIMIT)?;
        }
        writeln!(out)?;

        out.push_str(RECOMMENDATIONS);
        Ok(out)
    }

    fn disclaimer(&self) -> Result<String, fmt::Error> {
        let mut out = String::from(DISCLAIMER);
        writeln!(out)?;
        writeln!(out, "---")?;
        writeln!(out)?;
        writeln!(out, "**Generated by:** DNA Analysis Report System")?;
        writeln!(out, "**Date:** {}", self.generated_at)?;
        writeln!(out, "**Version:** {}", env!("CARGO_PKG_VERSION"))?;
        writeln!(out)?;
        writeln!(out, "For questions or feedback, please refer to the project documentation.")?;
        Ok(out)
    }
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

const RECOMMENDATIONS: &str = "### Recommendations

1. **Review Category Sections:** Each category section provides detailed information about genes relevant to that area of health.

2. **Consult Healthcare Professionals:** Discuss these findings with a genetic counselor or healthcare provider for personalized interpretation.

3. **Consider Additional Testing:** For genes marked as not compatible with Ancestry.com, consider alternative genetic testing providers that may cover these variants.

4. **Research Further:** Use the gene descriptions and research sources to learn more about specific genes and their implications.

5. **Lifestyle Considerations:** While genetics influence health, lifestyle factors play a significant role. Focus on modifiable risk factors.

6. **Stay Informed:** Genetic research is constantly evolving. Stay updated on new discoveries about these genes.

### Important Notes

- This analysis is based on current scientific understanding, which may change as research progresses.
- Genetic risk is one factor among many that influence health outcomes.
- Environment, lifestyle, and other genetic factors all play important roles.
- This report is for informational purposes only and is not a substitute for professional medical advice.
";

const DISCLAIMER: &str = "## Disclaimer

**Important Notice:**

This genetic analysis report is for informational and educational purposes only. It is not intended to provide medical advice, diagnosis, or treatment recommendations. Genetic information is complex and should be interpreted by qualified healthcare professionals.

### Limitations

- Ancestry.com tests approximately 700,000 SNPs, which does not cover all possible genetic variants
- Some genes may have variants not included in this test
- Genetic risk is influenced by many factors including environment, lifestyle, and other genes
- Scientific understanding of genetic variants is constantly evolving
- Variant interpretations are based on available research and may not be complete

### Recommendations

- **Discuss these findings with a genetic counselor or healthcare provider** before making any health decisions
- **Consider additional genetic testing** if specific genes of interest are not covered
- **Use this report as a starting point** for further research and discussion with professionals
- **Do not use this information** to self-diagnose or self-treat any health conditions
- **Maintain a healthy lifestyle** regardless of genetic predispositions

### Privacy and Data Security

- This analysis was performed locally on your computer
- No genetic data was transmitted to external servers
- Your DNA data remains under your control
";
