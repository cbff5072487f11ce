use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::analysis::aggregation::aggregate;
use crate::analysis::export::export_tables;
use crate::analysis::linkage::link;
use crate::config::PipelineConfig;
use crate::data_handling::gene_catalog::GeneCatalog;
use crate::data_handling::raw_dna::RawDnaFile;
use crate::helper_functions::project_root;
use crate::models::Dataset;
use crate::report::ReportGenerator;

mod analysis;
mod config;
mod data_handling;
mod helper_functions;
mod models;
mod report;
#[cfg(test)]
mod test_fixtures;

fn main() -> Result<()> {
    // Setup logging and project configuration
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting the DNA analysis report pipeline");

    let project_root = project_root();
    let config = PipelineConfig::load(&project_root)?;

    info!("Phase 1: Parsing DNA data");
    let genotypes = RawDnaFile {
        path: config.dna_file.clone(),
    }
    .load()?;
    if genotypes.is_empty() {
        warn!("No usable genotypes in {}", config.dna_file.display());
    }

    info!("Phase 2: Loading gene catalog");
    let genes = GeneCatalog {
        path: config.catalog_dir.clone(),
    }
    .load()?;

    info!("Phase 3: Matching variants");
    let summary = link(&genotypes, &genes);
    let stats = aggregate(&genes, &summary);

    info!("Phase 4: Generating report");
    ReportGenerator::new(&genes, &summary, &stats, config.dna_file.display().to_string())
        .write(&config.output_path)?;

    if let Some(export_dir) = &config.export_dir {
        export_tables(export_dir, &stats, &summary)?;
    }

    info!("Analysis complete. Report saved to: {}", config.output_path.display());
    Ok(())
}
