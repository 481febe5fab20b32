use crate::errors::JudgeError;
use crate::judge::StructuredJudge;
use crate::model::{ChatHistory, Role};
use crate::prompt::render;
use crate::sql::prompts;
use crate::storage::ratings::{RatingEntry, RatingLog};

pub const MIN_RATING: i8 = -2;
pub const MAX_RATING: i8 = 2;

pub async fn rate_satisfaction(
    judge: &StructuredJudge,
    question: &str,
    history: &ChatHistory,
) -> Result<i8, JudgeError> {
    let prompt = render(
        prompts::SATISFACTION,
        &[("chat_history", &history.render()), ("question", question)],
    );
    let reply = judge.complete_text(&prompt).await?;
    Ok(parse_rating(&reply))
}

/// First integer in the reply, if it is a valid rating. Anything else is
/// treated as neutral.
pub fn parse_rating(reply: &str) -> i8 {
    let parsed = reply
        .split(|c: char| !(c.is_ascii_digit() || c == '-' || c == '+'))
        .find(|t| t.chars().any(|c| c.is_ascii_digit()))
        .and_then(|t| t.parse::<i8>().ok());
    match parsed {
        Some(r) if (MIN_RATING..=MAX_RATING).contains(&r) => r,
        _ => {
            tracing::warn!(
                event = "llmao.satisfaction.unparsable",
                reply = %reply.trim(),
                "rating missing or out of range; recording 0"
            );
            0
        }
    }
}

/// Rates the previous exchange and appends it to `log`. Returns `None`
/// when the history holds fewer than two turns.
pub async fn record_satisfaction(
    judge: &StructuredJudge,
    log: &RatingLog,
    question: &str,
    history: &ChatHistory,
) -> anyhow::Result<Option<i8>> {
    let Some((last, second_last)) = history.last_two() else {
        return Ok(None);
    };
    let (prior_response, prior_question) = match (last.role, second_last.role) {
        (Role::Ai, Role::Human) => (last.content.clone(), second_last.content.clone()),
        _ => (String::new(), last.content.clone()),
    };

    let rating = rate_satisfaction(judge, question, history).await?;
    log.append(&RatingEntry {
        prior_response,
        prior_question,
        rating,
        at: chrono::Utc::now().to_rfc3339(),
    })?;
    tracing::info!(
        event = "llmao.satisfaction.recorded",
        rating,
        path = %log.path().display()
    );
    Ok(Some(rating))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ChatMessage;
    use crate::providers::llm::fake::FakeClient;
    use std::sync::Arc;

    #[test]
    fn ratings_are_clamped_to_neutral() {
        assert_eq!(parse_rating("2"), 2);
        assert_eq!(parse_rating("Rating: -1"), -1);
        assert_eq!(parse_rating("+1."), 1);
        assert_eq!(parse_rating("5"), 0);
        assert_eq!(parse_rating("-3"), 0);
        assert_eq!(parse_rating("happy"), 0);
    }

    #[tokio::test]
    async fn short_history_is_not_recorded() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let log = RatingLog::new(dir.path().join("ratings.jsonl"));
        let client = Arc::new(FakeClient::new().with_default("2"));
        let judge = StructuredJudge::new(client.clone());

        let history = ChatHistory(vec![ChatMessage::human("hi")]);
        assert_eq!(record_satisfaction(&judge, &log, "again?", &history).await?, None);
        assert!(client.prompts().is_empty());
        assert!(log.read_all()?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn rating_is_appended_with_prior_turn() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let log = RatingLog::new(dir.path().join("nested").join("ratings.jsonl"));
        let judge = StructuredJudge::new(Arc::new(
            FakeClient::new().on("whether or not the user is satisfied", "-1"),
        ));
        let history = ChatHistory(vec![
            ChatMessage::human("Look up 2 chemicals, please"),
            ChatMessage::ai("Bevonium, Insulin"),
        ]);

        let rating = record_satisfaction(&judge, &log, "That's wrong", &history).await?;
        assert_eq!(rating, Some(-1));
        let entries = log.read_all()?;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].prior_question, "Look up 2 chemicals, please");
        assert_eq!(entries[0].prior_response, "Bevonium, Insulin");
        Ok(())
    }
}
