pub mod category_resolver;
pub mod date_normalizer;
pub mod numeric_filler;
pub mod preprocessor;
pub mod review_deduplicator;

pub use category_resolver::*;
pub use date_normalizer::*;
pub use numeric_filler::*;
pub use preprocessor::*;
pub use review_deduplicator::*;
