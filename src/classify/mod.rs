pub mod classifier;
pub mod keywords;
