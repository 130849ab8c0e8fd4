//! Extraction handlers.

mod information_extractor;

pub use information_extractor::InformationExtractor;
