pub mod gene_catalog;
pub mod raw_dna;
