pub mod feature_extractor;
pub mod huggingface_extractor;
pub mod similarity;

pub use feature_extractor::FeatureExtractor;
pub use huggingface_extractor::HuggingFaceImageExtractor;
pub use similarity::{cosine_similarity, Embedding};
