pub mod headline;
pub mod prediction;
pub mod report;
pub mod series;
