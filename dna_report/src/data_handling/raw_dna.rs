use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tracing::{debug, info};

use crate::models::{Dataset, GenotypeRecord, GenotypeTable};

const VALID_ALLELES: [char; 5] = ['A', 'T', 'C', 'G', '0'];
const MIN_FIELDS: usize = 5;

/// An Ancestry-style raw DNA export: tab separated
/// `rsid  chromosome  position  allele1  allele2` rows after a `#` comment block and an
/// `rsid` header line.
pub struct RawDnaFile {
    pub path: PathBuf,
}

impl Dataset for RawDnaFile {
    type Output = GenotypeTable;

    fn load(&self) -> Result<GenotypeTable> {
        if !self.path.is_file() {
            bail!("DNA file not found: {}", self.path.display());
        }

        info!("Parsing DNA file: {}", self.path.display());
        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open DNA file {}", self.path.display()))?;
        let table = parse_genotypes(file)
            .with_context(|| format!("Failed to parse DNA file {}", self.path.display()))?;

        info!("Parsed {} genotypes from DNA file", table.len());
        debug!(
            "{} homozygous calls, {} no-calls",
            table.iter().filter(|r| r.is_homozygous()).count(),
            table.iter().filter(|r| r.genotype == "00").count()
        );
        Ok(table)
    }
}

/// Decodes raw DNA rows into a lookup table, skipping rows that cannot be used.
pub fn parse_genotypes<R: Read>(reader: R) -> Result<GenotypeTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut table = GenotypeTable::new();
    let mut in_header = true;
    let mut skipped = 0usize;

    for result in rdr.byte_records() {
        let raw = result?;
        let line = raw.position().map(|p| p.line()).unwrap_or_default();
        let row = match csv::StringRecord::from_byte_record(raw) {
            Ok(row) => row,
            Err(err) => {
                debug!("Line {}: invalid genotype row ({})", line, err);
                in_header = false;
                skipped += 1;
                continue;
            }
        };

        if in_header {
            if row.get(0).map_or(false, |field| field.starts_with("rsid")) {
                continue;
            }
            in_header = false;
        }

        if row.len() < MIN_FIELDS {
            debug!("Line {}: expected {} fields, found {}", line, MIN_FIELDS, row.len());
            skipped += 1;
            continue;
        }

        match parse_row(&row) {
            Some(record) => table.insert(record),
            None => {
                debug!("Line {}: invalid genotype row {:?}", line, row);
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        info!("Skipped {} malformed genotype rows", skipped);
    }
    Ok(table)
}

fn parse_row(row: &csv::StringRecord) -> Option<GenotypeRecord> {
    let allele1 = parse_allele(&row[3])?;
    let allele2 = parse_allele(&row[4])?;
    let position = row[2].parse::<u64>().ok()?;

    Some(GenotypeRecord::new(&row[0], &row[1], position, allele1, allele2))
}

/// A single allele code from {A, T, C, G, 0}, case-insensitive.
fn parse_allele(field: &str) -> Option<char> {
    let mut chars = field.chars();
    let allele = chars.next()?.to_ascii_uppercase();
    if chars.next().is_some() || !VALID_ALLELES.contains(&allele) {
        return None;
    }
    Some(allele)
}
