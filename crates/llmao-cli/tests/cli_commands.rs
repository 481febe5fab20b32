use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const HAPPY_SCRIPT: &str = r#"
rules:
  - when: "classify whether"
    respond: ["database"]
  - when: "what table(s)"
    respond: ['{"chemical_info": ["ChemicalName", "ChemicalID"]}']
  - when: "sole purpose"
    respond: ["SELECT ChemicalName, ChemicalID FROM chemical_info LIMIT 2;"]
  - when: "already executed"
    respond: ["Two chemicals are Bevonium and Insulin."]
  - when: "Total number of claims"
    respond: ['{"A": 2, "B": 1}']
  - when: "A response is concise"
    respond: ['{"precision": 0.5}']
"#;

const BROKEN_SQL_SCRIPT: &str = r#"
rules:
  - when: "classify whether"
    respond: ["database"]
  - when: "what table(s)"
    respond: ['{"chemical_info": ["ChemicalName"]}']
  - when: "sole purpose"
    respond: ["SELECT Nope FROM chemical_info;"]
  - when: "not properly executable"
    respond: ["SELECT StillNope FROM chemical_info;"]
"#;

struct Fixture {
    dir: TempDir,
    config: PathBuf,
}

impl Fixture {
    fn new(script: &str, extra: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let db = dir.path().join("aop.db");
        let conn = rusqlite::Connection::open(&db).unwrap();
        conn.execute_batch(
            "CREATE TABLE chemical_info (ChemicalName TEXT, ChemicalID TEXT);
             INSERT INTO chemical_info VALUES ('Bevonium', 'MESH:C000002');
             INSERT INTO chemical_info VALUES ('Insulin', 'MESH:C000006');
             INSERT INTO chemical_info VALUES ('Pentachlorophenol', 'MESH:D010416');",
        )
        .unwrap();
        drop(conn);

        fs::write(dir.path().join("script.yaml"), script).unwrap();
        let config = dir.path().join("llmao.yaml");
        fs::write(
            &config,
            format!(
                r#"version: 1
log_level: warn
database:
  path: aop.db
judge:
  provider: fake
  fake_script: script.yaml
embedder:
  provider: fake
pipeline:
  evaluate_turns: []
  ratings_path: null
{extra}"#
            ),
        )
        .unwrap();
        Self { dir, config }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("llmao").unwrap();
        cmd.env_remove("LLMAO_DB")
            .env_remove("LLMAO_LOG")
            .env_remove("LLMAO_CONFIG")
            .arg("--config")
            .arg(&self.config);
        cmd
    }
}

fn write_records(path: &Path, body: &str) {
    fs::write(path, body).unwrap();
}

#[test]
fn metrics_lists_all_strategies() {
    Command::cargo_bin("llmao")
        .unwrap()
        .arg("metrics")
        .assert()
        .success()
        .stdout(contains("faithfulness"))
        .stdout(contains("correctness"))
        .stdout(contains("precision"))
        .stdout(contains("answer_relevancy"))
        .stdout(contains("context_relevancy"));
}

#[test]
fn init_writes_config_once() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("llmao.yaml");

    Command::cargo_bin("llmao")
        .unwrap()
        .arg("init")
        .arg("--config")
        .arg(&config)
        .assert()
        .success();
    let written = fs::read_to_string(&config).unwrap();
    assert!(written.contains("evaluate_turns"));

    Command::cargo_bin("llmao")
        .unwrap()
        .arg("init")
        .arg("--config")
        .arg(&config)
        .assert()
        .code(2)
        .stderr(contains("refusing to overwrite"));
}

#[test]
fn missing_config_is_exit_2_with_hint() {
    let dir = TempDir::new().unwrap();
    Command::cargo_bin("llmao")
        .unwrap()
        .env_remove("LLMAO_CONFIG")
        .arg("--config")
        .arg(dir.path().join("absent.yaml"))
        .arg("catalog")
        .assert()
        .code(2)
        .stderr(contains("llmao init"));
}

#[test]
fn strict_mode_rejects_unknown_keys() {
    let fx = Fixture::new(HAPPY_SCRIPT, "judgee: {}\n");
    fx.cmd().arg("catalog").assert().success();
    fx.cmd()
        .arg("--strict")
        .arg("catalog")
        .assert()
        .code(2)
        .stderr(contains("judgee"));
}

#[test]
fn catalog_prints_tables() {
    let fx = Fixture::new(HAPPY_SCRIPT, "");
    fx.cmd()
        .arg("catalog")
        .assert()
        .success()
        .stdout(contains("chemical_info"))
        .stdout(contains("ChemicalID"));
}

#[test]
fn ask_answers_and_updates_history() {
    let fx = Fixture::new(HAPPY_SCRIPT, "");
    let history = fx.path("history.yaml");

    fx.cmd()
        .arg("ask")
        .arg("Look up 2 chemicals in the AOP database")
        .arg("--history-file")
        .arg(&history)
        .assert()
        .success()
        .stdout(contains("Bevonium").and(contains("Insulin")));

    let saved = fs::read_to_string(&history).unwrap();
    assert!(saved.contains("Look up 2 chemicals in the AOP database"));
    assert!(saved.contains("Two chemicals are Bevonium and Insulin."));
}

#[test]
fn ask_json_includes_attempts_and_scores() {
    let fx = Fixture::new(HAPPY_SCRIPT, "");
    let raw = fs::read_to_string(&fx.config)
        .unwrap()
        .replace("evaluate_turns: []", "evaluate_turns: [faithfulness]");
    fs::write(&fx.config, raw).unwrap();

    let out = fx
        .cmd()
        .arg("ask")
        .arg("--json")
        .arg("Look up 2 chemicals in the AOP database")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let turn: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(turn["status"], "answered");
    assert_eq!(turn["attempts"].as_array().unwrap().len(), 1);
    assert_eq!(turn["scores"]["faithfulness"]["score"], 0.5);
}

#[test]
fn ask_falls_back_with_exit_1() {
    let fx = Fixture::new(BROKEN_SQL_SCRIPT, "");
    fx.cmd()
        .arg("ask")
        .arg("Look up 2 chemicals")
        .assert()
        .code(1)
        .stdout(contains("wasn't able to find an answer"))
        .stderr(contains("fallback"));
}

#[test]
fn eval_batch_prints_one_sheet_per_record() {
    let fx = Fixture::new(HAPPY_SCRIPT, "");
    let records = fx.path("records.yaml");
    write_records(
        &records,
        r#"
- question: Look up 2 chemicals
  response: Bevonium and Insulin
  context: "Row 1: ChemicalName = Bevonium."
- question: Name a chemical
  response: Pentachlorophenol
  context: "Row 1: ChemicalName = Pentachlorophenol."
"#,
    );
    let report = fx.path("report.json");

    let out = fx
        .cmd()
        .arg("eval")
        .arg("--records")
        .arg(&records)
        .arg("--metrics")
        .arg("faithfulness,precision")
        .arg("--batch")
        .arg("--out")
        .arg(&report)
        .assert()
        .success()
        .stderr(contains("average: 0.5000"))
        .get_output()
        .stdout
        .clone();

    let sheets: serde_json::Value = serde_json::from_slice(&out).unwrap();
    let sheets = sheets.as_array().unwrap();
    assert_eq!(sheets.len(), 2);
    for sheet in sheets {
        assert_eq!(sheet["faithfulness"]["score"], 0.5);
        assert_eq!(sheet["precision"]["score"], 0.5);
    }
    let written: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(written["records"], 2);
}

#[test]
fn eval_rejects_unknown_metric() {
    let fx = Fixture::new(HAPPY_SCRIPT, "");
    let records = fx.path("records.yaml");
    write_records(&records, "- question: q\n  response: r\n  context: c\n");

    fx.cmd()
        .arg("eval")
        .arg("--records")
        .arg(&records)
        .arg("--metrics")
        .arg("faithfullness")
        .assert()
        .code(2)
        .stderr(contains("did you mean 'faithfulness'"));
}

#[test]
fn eval_single_mode_wants_one_record() {
    let fx = Fixture::new(HAPPY_SCRIPT, "");
    let records = fx.path("records.json");
    write_records(
        &records,
        r#"[{"question": "q1", "response": "r", "context": "c"},
            {"question": "q2", "response": "r", "context": "c"}]"#,
    );

    fx.cmd()
        .arg("eval")
        .arg("--records")
        .arg(&records)
        .arg("--metrics")
        .arg("precision")
        .assert()
        .code(2)
        .stderr(contains("exactly one record"));
}
