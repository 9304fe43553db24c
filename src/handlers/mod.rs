pub mod dashboard;
pub mod imports;
