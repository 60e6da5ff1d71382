//! Output module - smoothing of tool results.

mod extractor;
mod normalizer;

pub use extractor::extract_json_from_text;
pub use normalizer::normalize_output;
