pub mod generator;
pub mod intent;
pub mod prompts;
pub mod router;

pub use generator::QueryGenerator;
pub use intent::IntentClassifier;
pub use router::TableRouter;
