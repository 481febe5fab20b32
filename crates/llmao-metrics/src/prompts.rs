//! Judging prompts. Every metric prompt is the shared header, the metric's
//! criteria and its worked examples; the judge appends the output schema.

use llmao_core::model::EvaluationRecord;
use llmao_core::prompt::render;

pub const GENERAL: &str = "Your goal is to evaluate the AI response to the user's question based on the criterion listed below.
Ensure your response follows only the formatting guidelines specified in the prompt.

User question - {question}
AI response - {response}
Context - {context}";

pub const FAITHFULNESS_CRITERIA: &str = "To determine faithfulness, find the following values. A must be at least as large as B.
    A = Total number of claims in the AI response
    B = Number of claims in the AI response which can be inferred from the context";

pub const FAITHFULNESS_EXAMPLES: &str = r#"<example>
AI response: The query "SELECT AOP_id, AOP_name FROM aop_info LIMIT 5;" retrieves the AOP identification number and name for the first 5 entries in the aop_info table of the adverse outcome pathway database, and the results show the AOP IDs and names for those 5 entries, which include pathways related to liver damage, Parkinson's disease, ecdysis in insects, effects of pentachlorophenol, and PPARα antagonism leading to weight loss.
Context: The Adverse Outcome Pathway (AOP) database is a collection of information related to understanding how biological perturbations at the molecular level can lead to adverse outcomes at higher levels of biological organization. The query you provided shows a sampling of AOPs in the database, such as "Uncharacterized liver damage leading to hepatocellular carcinoma" and "Inhibition of the mitochondrial complex I of nigro-striatal neurons leads to parkinsonian motor deficits". These entries describe pathways by which an initial molecular event can cascade through biological processes to ultimately result in an adverse health effect.
Your response: {"A": 7, "B": 4}
</example>"#;

pub const CORRECTNESS_CRITERIA: &str = "Compare the AI response with the ground truth answer and count:
    True Positives (TP): facts or statements present in both the ground truth and the AI response
    False Positives (FP): facts or statements present in the AI response but not in the ground truth
    False Negatives (FN): facts or statements present in the ground truth but not in the AI response";

pub const PRECISION_CRITERIA: &str = "A response is concise if it:
    - focuses on the main points relevant to the topic or question.
    - uses precise language and avoids unnecessary words or phrases.
    - omits irrelevant or extraneous details that don't contribute to the main point.
Score precision between 0 (none of the response is needed to answer the question) and 1 (all of it is).";

pub const PRECISION_EXAMPLES: &str = r#"<example>
Question: Look up two chemicals in the AOP database
AI response: Here are two chemicals found in the Adverse Outcome Pathway (AOP) database:
1. Bevonium (Chemical ID: MESH:C000002)
2. Insulin, neutral (Chemical ID: MESH:C000006)
Your response: {"precision": 1}
</example>"#;

pub const ANSWER_RELEVANCY_CRITERIA: &str = "Rather than evaluating the AI response, your goal is to generate questions from it.
Using the AI response only, reverse engineer the response to come up with {k} questions that
could be answered using the same AI response.";

pub const ANSWER_RELEVANCY_EXAMPLES: &str = r#"<example>
AI response: The Adverse Outcome Pathway (AOP) database contains information about key events, molecular initiating events, and other details related to toxicological pathways. For each event, the database stores the event type, the AOPs the event is involved in, and the biological level the event occurs at.
Your response: {"questions": ["What information does the Adverse Outcome Pathway (AOP) database contain?", "What details does the AOP database store for each event?", "Which event types are stored in the AOP database?"]}
</example>"#;

pub const CONTEXT_RELEVANCY_CRITERIA: &str = "Context relevancy requires noting which sentences of the retrieved context are relevant to the user's question.
Determine the following two values:
    S: the number of sentences in the retrieved context which are relevant to the user's question
    T: the total number of sentences in the retrieved context";

pub const CONTEXT_RELEVANCY_EXAMPLES: &str = "<example>
Question: What is the capital of France?
High context relevancy: France, in Western Europe, encompasses medieval cities, alpine villages and Mediterranean beaches. Paris, its capital, is famed for its fashion houses, classical art museums including the Louvre and monuments like the Eiffel Tower.
Low context relevancy: the same two sentences followed by sentences about French wine, cuisine, cave drawings and palaces.
</example>";

/// Shared header followed by the metric's criteria and examples.
pub fn metric_prompt(record: &EvaluationRecord, context: &str, parts: &[&str]) -> String {
    let mut out = render(
        GENERAL,
        &[
            ("question", &record.question),
            ("response", &record.response),
            ("context", context),
        ],
    );
    for part in parts.iter().filter(|p| !p.is_empty()) {
        out.push_str("\n\n");
        out.push_str(part);
    }
    out
}
