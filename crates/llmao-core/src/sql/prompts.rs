//! Prompt templates for the question-answering path. Placeholders are
//! filled with [`crate::prompt::render`].

pub const INTENT: &str = r#"<instructions>
Given the user question below, classify whether it has anything at all to do with the
adverse outcome pathway (AOP) database or any of its tables, listed below.
If the question mentions the AOP database, any of its tables, or any of its columns,
respond with database. Otherwise, respond with none.
Respond with a single lowercase word and no punctuation.
</instructions>

<examples>
Question: Describe the AOP gene table
Your response: database
Question: Which molecules in the AOP database are the most toxic?
Your response: database
Question: How are you today?
Your response: none
</examples>

<context>
AOP database schema: {schema}
User question: {question}
</context>
Classification:"#;

pub const ROUTER: &str = r#"<instructions>
You are an expert at Adverse Outcome Pathways (AOPs). Look at the user's question and the
AOP database schema below, and determine what table(s) and what column(s) of those tables
are needed to answer the question. Use only tables and columns that appear in the schema.
Do not include any table or column that is not essential to answering the question.
If the user mentions any name from the schema, include it.
Double check your answer against these instructions before responding.
</instructions>

<context>
User question: {question}
AOP database schema: {schema}
</context>

Respond with an object of the same shape as the schema: table name keys, each mapped to
the list of needed column names."#;

pub const GENERATE: &str = r#"<instructions>
You are a SQLite expert. Your sole purpose is to find a SQL query that retrieves the
information from the adverse outcome pathway (AOP) database needed to answer the user
question at the end. Do not execute the query or provide anything other than the query.
Form the simplest query possible.
Unless the user's question suggests otherwise, limit the results to {top_k} rows with a LIMIT clause.
Use only the tables that are keys of {table_dict} and only the columns listed in its values.
</instructions>

<example>
User input: "Look up 2 chemicals in the AOP database"
Response: SELECT ChemicalName, ChemicalID FROM chemical_info LIMIT 2;
</example>

The user question to answer with a SQLite query is: {question}

<formatting>
Respond ONLY with the SQLite query.
</formatting>"#;

pub const REPAIR: &str = r#"<instructions>
You are an assistant with deep expertise in SQLite and the adverse outcome pathway database.
A previous assistant turned the user's question into a SQLite query, but their query was
not properly executable. Correct the query, or write a new one that answers the user's
question, and make sure it is syntactically correct and executable.
Use only the tables that are keys of {table_dict} and only the columns listed in its values.
</instructions>

<context>
User question: {question}
Failed SQLite query: {query}
</context>

<formatting>
Respond ONLY with the executable SQLite query.
</formatting>"#;

pub const ANSWER: &str = r#"<instructions>
You are a helpful assistant answering a user's question using the results of a SQLite query
that was already executed for you. Use all of the information to fully answer the question in
the context of the adverse outcome pathway database. Be concise, but give more context if the
question is open-ended. Address the user in a friendly, cheerful and informative manner, and
take the conversation so far into account: {chat_history}
</instructions>

<information>
User question: {question}
SQLite query: {query}
SQLite result: {result}
</information>

<formatting>
Answer in complete sentences and explain how the query answers the user's question.
</formatting>"#;

pub const GENERAL: &str = r#"<instructions>
You are a friendly, cheerful and helpful assistant.
Answer the following questions considering the chat history and user question.
If the chat history is none, do not mention the chat history.
</instructions>

Chat history: {chat_history}
Question: {question}"#;

pub const SATISFACTION: &str = r#"<instructions>
You are given a chat history between a human user and a chatbot. Evaluate, based on the chat
history, whether or not the user is satisfied with the chatbot. Pay attention to how the
user's tone changes, whether their questions are answered, and whether they repeat similar
questions. Rate the conversation using the criteria below.
</instructions>

<context>
Chat history: {chat_history}
Current question: {question}
Rating criteria:
    -2 - the user is deeply unsatisfied; their questions are not answered at all
    -1 - the user is somewhat unsatisfied; their questions are not fully answered
     0 - no chat history, a neutral user, or not enough information
     1 - the user is somewhat satisfied; their questions are mostly answered
     2 - the user is very satisfied; their questions are fully answered
</context>

<formatting>
Respond ONLY with the rating number.
</formatting>"#;

pub const DATASET_QUESTION: &str = r#"<instructions>
You are an expert at adverse outcome pathways (AOP) and SQLite databases. Come up with questions
that a user might have about how the AOP database works, what its purpose is, and how to
understand the data inside it. Write one question matching the user's skill level, based on the
schema of the AOP database, and make it different from the current questions.
</instructions>

<example>
Sample questions: {examples}
</example>

<context>
Skill level: {skill_level}
AOP database schema: {schema}
Current questions: {current_questions}
</context>

<formatting>
Output only the question.
</formatting>"#;
