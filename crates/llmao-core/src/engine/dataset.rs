use crate::engine::pipeline::ChatPipeline;
use crate::errors::JudgeError;
use crate::judge::StructuredJudge;
use crate::model::{ChatHistory, EvaluationRecord};
use crate::prompt::render;
use crate::sql::prompts;

pub const SKILL_LEVELS: [&str; 4] = [
    "No AOP knowledge",
    "Beginner level AOP knowledge",
    "Intermediate level AOP knowledge",
    "Expert level AOP knowledge",
];

/// Seed question shown to the judge as a sample of the expected style.
pub const SAMPLE_QUESTIONS: &str = r#"{"Look up 2 chemicals in the AOP database": "SELECT ChemicalName, ChemicalID FROM chemical_info LIMIT 2;"}"#;

/// Asks the judge for `n` new questions, cycling through the skill
/// levels, and answers each with a fresh history. Every turn becomes one
/// record; turns without retrieval context get an empty context.
pub async fn generate_dataset(
    judge: &StructuredJudge,
    pipeline: &mut ChatPipeline,
    n: usize,
) -> Result<Vec<EvaluationRecord>, JudgeError> {
    let schema = pipeline.catalog().to_prompt_json();
    let mut questions: Vec<String> = Vec::with_capacity(n);
    let mut records = Vec::with_capacity(n);

    for i in 0..n {
        let skill_level = SKILL_LEVELS[i % SKILL_LEVELS.len()];
        let current = serde_json::to_string(&questions).unwrap_or_default();
        let prompt = render(
            prompts::DATASET_QUESTION,
            &[
                ("examples", SAMPLE_QUESTIONS),
                ("skill_level", skill_level),
                ("schema", &schema),
                ("current_questions", &current),
            ],
        );
        let question = judge.complete_text(&prompt).await?.trim().to_string();
        if question.is_empty() {
            tracing::warn!(event = "llmao.dataset.empty_question", index = i);
            continue;
        }

        let turn = pipeline.answer(&question, &ChatHistory::default()).await;
        tracing::info!(
            event = "llmao.dataset.generated",
            index = i,
            skill_level,
            status = ?turn.status
        );
        records.push(EvaluationRecord::new(
            question.clone(),
            turn.answer,
            turn.context.unwrap_or_default(),
        ));
        questions.push(question);
    }
    Ok(records)
}
