pub mod aggregator;
pub mod aspects;
pub mod cache;
pub mod hosted;
pub mod keywords;
pub mod normalizer;
pub mod pipeline;
pub mod splitter;
pub mod stars;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;

pub use aspects::{AspectAssigner, KeywordAssigner, KeywordLexicon, ZeroShotAssigner};
pub use cache::SentimentCache;
pub use hosted::{HostedAspectScorer, HostedSentimentClassifier};
pub use keywords::top_terms;
pub use normalizer::LabelNormalizer;
pub use pipeline::AnalysisPipeline;
pub use traits::{AspectScorer, RawSentiment, SentimentClassifier};
