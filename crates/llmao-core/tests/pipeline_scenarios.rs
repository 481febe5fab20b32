use llmao_core::answer::FALLBACK_MESSAGE;
use llmao_core::catalog::SchemaCatalog;
use llmao_core::engine::dataset::generate_dataset;
use llmao_core::engine::ChatPipeline;
use llmao_core::errors::ExecutionErrorKind;
use llmao_core::judge::StructuredJudge;
use llmao_core::model::{AttemptOutcome, ChatHistory, ChatMessage, Intent, TurnStatus};
use llmao_core::providers::llm::fake::FakeClient;
use llmao_core::storage::ratings::RatingLog;
use llmao_core::storage::{SqlStore, SqliteStore};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::{tempdir, TempDir};

const INTENT: &str = "classify whether";
const ROUTE: &str = "what table(s)";
const GENERATE: &str = "sole purpose";
const REPAIR: &str = "not properly executable";
const ANSWER: &str = "already executed";

fn aop_db() -> anyhow::Result<(TempDir, PathBuf)> {
    let dir = tempdir()?;
    let path = dir.path().join("aop.db");
    let conn = rusqlite::Connection::open(&path)?;
    conn.execute_batch(
        "CREATE TABLE chemical_info (ChemicalName TEXT, ChemicalID TEXT);
         INSERT INTO chemical_info VALUES ('Bevonium', 'MESH:C000002');
         INSERT INTO chemical_info VALUES ('Insulin', 'MESH:C000006');
         INSERT INTO chemical_info VALUES ('Pentachlorophenol', 'MESH:D010416');",
    )?;
    Ok((dir, path))
}

fn database_client() -> FakeClient {
    FakeClient::new()
        .on(INTENT, "database")
        .on(ROUTE, r#"{"chemical_info": ["ChemicalName", "ChemicalID"]}"#)
}

fn pipeline(client: Arc<FakeClient>, path: &PathBuf) -> anyhow::Result<ChatPipeline> {
    let store: Arc<dyn SqlStore> = Arc::new(SqliteStore::new(path));
    let catalog = Arc::new(SchemaCatalog::load(store.as_ref())?);
    Ok(ChatPipeline::new(
        StructuredJudge::new(client),
        store,
        catalog,
    ))
}

#[tokio::test]
async fn answers_from_generated_query() -> anyhow::Result<()> {
    let (_dir, path) = aop_db()?;
    let client = Arc::new(
        database_client()
            .on(GENERATE, "SELECT ChemicalName, ChemicalID FROM chemical_info LIMIT 2;")
            .on(ANSWER, "Two chemicals in the database are Bevonium and Insulin."),
    );
    let mut p = pipeline(client.clone(), &path)?;

    let turn = p
        .answer("Look up 2 chemicals in the AOP database", &ChatHistory::default())
        .await;

    assert_eq!(turn.intent, Intent::Database);
    assert_eq!(turn.status, TurnStatus::Answered);
    assert_eq!(
        turn.relevant_schema.as_ref().map(|r| r.tables().collect::<Vec<_>>()),
        Some(vec!["chemical_info"])
    );
    assert_eq!(turn.attempts.len(), 1);
    let rows = turn.attempts[0].rows().expect("rows");
    assert_eq!(rows.len(), 2);
    assert!(turn.answer.contains("Bevonium") && turn.answer.contains("Insulin"));
    let context = turn.context.as_deref().expect("context");
    assert!(context.contains("ChemicalName = Bevonium"));
    assert!(context.contains("ChemicalName = Insulin"));
    assert_eq!(client.calls_matching(REPAIR), 0);
    Ok(())
}

#[tokio::test]
async fn repaired_query_rows_are_used() -> anyhow::Result<()> {
    let (_dir, path) = aop_db()?;
    let client = Arc::new(
        database_client()
            .on(GENERATE, "SELECT ChemicalToxicity FROM chemical_info LIMIT 2;")
            .on(REPAIR, "SELECT ChemicalName FROM chemical_info LIMIT 2;")
            .on(ANSWER, "Bevonium and Insulin."),
    );
    let mut p = pipeline(client.clone(), &path)?;

    let turn = p
        .answer("Look up 2 chemicals in the AOP database", &ChatHistory::default())
        .await;

    assert_eq!(turn.status, TurnStatus::Answered);
    assert_eq!(turn.attempts.len(), 2);
    match &turn.attempts[0].outcome {
        AttemptOutcome::Failed { error } => assert_eq!(error.kind, ExecutionErrorKind::Malformed),
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(turn.attempts[1].attempt_no, 2);
    assert_eq!(
        turn.final_query(),
        Some("SELECT ChemicalName FROM chemical_info LIMIT 2;")
    );
    assert_eq!(turn.attempts[1].rows().map(|r| r.columns.clone()), Some(vec!["ChemicalName".to_string()]));

    let repair_prompt = client
        .prompts()
        .into_iter()
        .find(|p| p.contains(REPAIR))
        .expect("repair prompt");
    assert!(repair_prompt.contains("SELECT ChemicalToxicity FROM chemical_info LIMIT 2;"));
    let answer_prompt = client
        .prompts()
        .into_iter()
        .find(|p| p.contains(ANSWER))
        .expect("answer prompt");
    assert!(answer_prompt.contains("SELECT ChemicalName FROM chemical_info LIMIT 2;"));
    Ok(())
}

#[tokio::test]
async fn unbound_parameter_is_repaired() -> anyhow::Result<()> {
    let (_dir, path) = aop_db()?;
    let client = Arc::new(
        database_client()
            .on(GENERATE, "SELECT ChemicalName FROM chemical_info WHERE ChemicalID = ?;")
            .on(
                REPAIR,
                "SELECT ChemicalName FROM chemical_info WHERE ChemicalID = 'MESH:C000006';",
            )
            .on(ANSWER, "That is Insulin."),
    );
    let mut p = pipeline(client.clone(), &path)?;

    let turn = p
        .answer("Which chemical has ID MESH:C000006?", &ChatHistory::default())
        .await;

    assert_eq!(turn.status, TurnStatus::Answered);
    assert_eq!(turn.attempts.len(), 2);
    match &turn.attempts[0].outcome {
        AttemptOutcome::Failed { error } => {
            assert_eq!(error.kind, ExecutionErrorKind::Programming)
        }
        other => panic!("expected failure, got {other:?}"),
    }
    let rows = turn.attempts[1].rows().expect("rows");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows.rows[0][0], serde_json::json!("Insulin"));
    assert_eq!(client.calls_matching(GENERATE), 1);
    assert_eq!(client.calls_matching(REPAIR), 1);
    Ok(())
}

#[tokio::test]
async fn second_failure_falls_back_after_two_executions() -> anyhow::Result<()> {
    let (_dir, path) = aop_db()?;
    let client = Arc::new(
        database_client()
            .on(GENERATE, "SELECT Nope FROM chemical_info;")
            .on(REPAIR, "SELEC ChemicalName FROM chemical_info;"),
    );
    let mut p = pipeline(client.clone(), &path)?;

    let turn = p
        .answer("Look up 2 chemicals in the AOP database", &ChatHistory::default())
        .await;

    assert_eq!(turn.status, TurnStatus::Fallback);
    assert_eq!(turn.answer, FALLBACK_MESSAGE);
    assert_eq!(turn.attempts.len(), 2);
    assert!(turn.attempts.iter().all(|a| !a.succeeded()));
    assert_eq!(client.calls_matching(GENERATE), 1);
    assert_eq!(client.calls_matching(REPAIR), 1);
    assert_eq!(client.calls_matching(ANSWER), 0);
    assert!(turn.fallback_reason.is_some());
    assert!(turn.context.is_none());
    Ok(())
}

#[tokio::test]
async fn driver_failure_is_not_repaired() -> anyhow::Result<()> {
    let (dir, path) = aop_db()?;
    let client = Arc::new(
        database_client().on(GENERATE, "SELECT ChemicalName FROM chemical_info LIMIT 2;"),
    );
    let mut p = pipeline(client.clone(), &path)?;
    drop(dir);

    let turn = p
        .answer("Look up 2 chemicals in the AOP database", &ChatHistory::default())
        .await;

    assert_eq!(turn.status, TurnStatus::Fallback);
    assert_eq!(turn.attempts.len(), 1);
    match &turn.attempts[0].outcome {
        AttemptOutcome::Failed { error } => assert_eq!(error.kind, ExecutionErrorKind::Driver),
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(client.calls_matching(REPAIR), 0);
    Ok(())
}

#[tokio::test]
async fn hallucinated_table_never_reaches_the_store() -> anyhow::Result<()> {
    let (_dir, path) = aop_db()?;
    let client = Arc::new(
        FakeClient::new()
            .on(INTENT, "database")
            .on(ROUTE, r#"{"chemicals": ["name"]}"#),
    );
    let mut p = pipeline(client.clone(), &path)?;

    let turn = p.answer("List chemicals", &ChatHistory::default()).await;

    assert_eq!(turn.status, TurnStatus::Fallback);
    assert!(turn.attempts.is_empty());
    assert!(turn
        .fallback_reason
        .as_deref()
        .unwrap_or_default()
        .contains("did you mean 'chemical_info'"));
    assert_eq!(client.calls_matching(GENERATE), 0);
    Ok(())
}

#[tokio::test]
async fn general_question_gets_plain_completion() -> anyhow::Result<()> {
    let (_dir, path) = aop_db()?;
    let client = Arc::new(
        FakeClient::new()
            .on(INTENT, "none")
            .on("considering the chat history", "I'm doing great, thanks!"),
    );
    let mut p = pipeline(client.clone(), &path)?;

    let turn = p.answer("How are you today?", &ChatHistory::default()).await;

    assert_eq!(turn.intent, Intent::General);
    assert_eq!(turn.status, TurnStatus::General);
    assert_eq!(turn.answer, "I'm doing great, thanks!");
    assert_eq!(client.calls_matching(ROUTE), 0);
    Ok(())
}

#[tokio::test]
async fn judge_outage_degrades_to_fallback() -> anyhow::Result<()> {
    let (_dir, path) = aop_db()?;
    let mut p = pipeline(Arc::new(FakeClient::failing("connection refused")), &path)?;

    let turn = p.answer("Look up 2 chemicals", &ChatHistory::default()).await;

    assert_eq!(turn.status, TurnStatus::Fallback);
    assert_eq!(turn.answer, FALLBACK_MESSAGE);
    assert!(turn
        .fallback_reason
        .as_deref()
        .unwrap_or_default()
        .contains("connection refused"));
    Ok(())
}

#[tokio::test]
async fn previous_turn_is_rated_when_history_allows() -> anyhow::Result<()> {
    let (dir, path) = aop_db()?;
    let client = Arc::new(
        database_client()
            .on("whether or not the user is satisfied", "2")
            .on(GENERATE, "SELECT ChemicalName FROM chemical_info LIMIT 1;")
            .on(ANSWER, "Bevonium."),
    );
    let log = RatingLog::new(dir.path().join("ratings.jsonl"));
    let mut p = pipeline(client.clone(), &path)?.with_ratings(log.clone());

    let first = p.answer("Name a chemical", &ChatHistory::default()).await;
    assert_eq!(first.satisfaction, None);

    let history = ChatHistory(vec![
        ChatMessage::human("Name a chemical"),
        ChatMessage::ai(first.answer.clone()),
    ]);
    let second = p.answer("Name another one", &history).await;
    assert_eq!(second.satisfaction, Some(2));

    let entries = log.read_all()?;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].prior_question, "Name a chemical");
    assert_eq!(entries[0].prior_response, "Bevonium.");
    Ok(())
}

#[tokio::test]
async fn dataset_generation_cycles_skill_levels() -> anyhow::Result<()> {
    let (_dir, path) = aop_db()?;
    let client = Arc::new(
        database_client()
            .on_seq(
                "come up with questions",
                vec!["What is a chemical?", "List two chemicals."],
            )
            .on(GENERATE, "SELECT ChemicalName FROM chemical_info LIMIT 2;")
            .on(ANSWER, "Bevonium and Insulin."),
    );
    let judge = StructuredJudge::new(client.clone());
    let mut p = pipeline(client.clone(), &path)?;

    let records = generate_dataset(&judge, &mut p, 2).await?;

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].question, "What is a chemical?");
    assert_eq!(records[1].response, "Bevonium and Insulin.");
    assert!(records[1].context.contains("Row 2"));

    let prompts: Vec<String> = client
        .prompts()
        .into_iter()
        .filter(|p| p.contains("come up with questions"))
        .collect();
    assert!(prompts[0].contains("Skill level: No AOP knowledge"));
    assert!(prompts[1].contains("Skill level: Beginner level AOP knowledge"));
    assert!(prompts[1].contains("What is a chemical?"));
    Ok(())
}
