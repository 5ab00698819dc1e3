pub mod candidate_store;
pub mod memory_store;
pub mod mongo;
pub mod recommendation;
pub mod scorer;

// Re-export public types
pub use candidate_store::{CandidateFilter, CandidateStore};
pub use memory_store::InMemoryOutfitStore;
pub use mongo::MongoDataApiClient;
pub use recommendation::{RecommendationService, MAX_RECOMMENDATIONS};
pub use scorer::PreferenceScorer;
