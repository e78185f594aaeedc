pub mod types;
pub mod recommendation;
pub mod formatters;

pub use types::{Recommendation, RecommendationStatus};
pub use recommendation::RecommendationGenerator;
pub use formatters::{JsonFormatter, MarkdownFormatter};
