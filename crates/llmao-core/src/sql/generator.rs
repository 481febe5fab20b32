use super::prompts;
use crate::catalog::RelevantSchema;
use crate::errors::{ExecutionError, JudgeError};
use crate::judge::StructuredJudge;
use crate::prompt::render;
use regex::Regex;
use std::sync::OnceLock;

pub const DEFAULT_LIMIT_HINT: usize = 5;

/// Writes (and once, rewrites) the SQL for a question.
pub struct QueryGenerator {
    judge: StructuredJudge,
    limit_hint: usize,
}

impl QueryGenerator {
    pub fn new(judge: StructuredJudge) -> Self {
        Self {
            judge,
            limit_hint: DEFAULT_LIMIT_HINT,
        }
    }

    pub fn with_limit_hint(mut self, limit_hint: usize) -> Self {
        self.limit_hint = limit_hint;
        self
    }

    pub async fn generate(
        &self,
        question: &str,
        relevant: &RelevantSchema,
    ) -> Result<String, JudgeError> {
        let prompt = render(
            prompts::GENERATE,
            &[
                ("top_k", &self.limit_hint.to_string()),
                ("table_dict", &relevant.to_prompt_json()),
                ("question", question),
            ],
        );
        let reply = self.judge.complete_text(&prompt).await?;
        Ok(clean_query(&reply))
    }

    pub async fn repair(
        &self,
        question: &str,
        failed_query: &str,
        relevant: &RelevantSchema,
    ) -> Result<String, JudgeError> {
        let prompt = render(
            prompts::REPAIR,
            &[
                ("table_dict", &relevant.to_prompt_json()),
                ("question", question),
                ("query", failed_query),
            ],
        );
        let reply = self.judge.complete_text(&prompt).await?;
        Ok(clean_query(&reply))
    }
}

fn fence_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```[A-Za-z]*\s*(.*?)```").ok())
        .as_ref()
}

fn label_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*(sql(ite)?(\s+query)?|query|response|answer)\s*:\s*").ok()
    })
    .as_ref()
}

/// Reduces a judge reply to one SQL statement: code fences, a leading
/// label and wrapping quotes are stripped, and anything after the first
/// top-level `;` is dropped. The result may be empty.
pub fn clean_query(reply: &str) -> String {
    let mut text = reply.trim().to_string();
    if let Some(inner) = fence_re()
        .and_then(|re| re.captures(&text))
        .and_then(|c| c.get(1))
    {
        text = inner.as_str().trim().to_string();
    }
    if let Some(re) = label_re() {
        text = re.replace(&text, "").trim().to_string();
    }
    for quote in ['"', '\'', '`'] {
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
            text = text[1..text.len() - 1].trim().to_string();
        }
    }
    first_statement(&text).trim().to_string()
}

/// Everything up to and including the first `;` outside a string literal.
fn first_statement(sql: &str) -> &str {
    let mut quote: Option<char> = None;
    for (i, c) in sql.char_indices() {
        match (quote, c) {
            (None, '\'' | '"') => quote = Some(c),
            (Some(q), c) if c == q => quote = None,
            (None, ';') => return &sql[..=i],
            _ => {}
        }
    }
    sql
}

/// An empty statement is never sent to the store.
pub fn check_not_empty(query: &str) -> Result<(), ExecutionError> {
    if query.trim().trim_end_matches(';').trim().is_empty() {
        return Err(ExecutionError::malformed("judge produced an empty query"));
    }
    Ok(())
}
