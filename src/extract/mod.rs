pub mod extractor;
pub mod heuristics;
pub mod record;
