pub mod aggregation;
pub mod export;
pub mod interpretation;
pub mod linkage;
