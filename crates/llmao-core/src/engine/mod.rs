pub mod dataset;
pub mod evaluator;
pub mod pipeline;
pub mod satisfaction;

pub use evaluator::{EvaluationOutput, Evaluator, ScoreSheet};
pub use pipeline::ChatPipeline;
