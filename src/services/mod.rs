pub mod analytics;
pub mod imports;
pub mod reports;
pub mod validation;
