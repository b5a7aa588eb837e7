//! Model fallback adapter.
//!
//! When no template matches, the question goes to an external generative
//! text service: an opaque text-in/text-out boundary with nondeterministic
//! output. This module owns everything around that boundary (building a
//! grounded prompt, bounding the call with a timeout, stripping code-fence
//! decoration, classifying the reply as SQL or a refusal) but never the
//! call internals themselves, which live behind the [`TextModel`] trait.

#[cfg(feature = "openai")]
mod openai;

#[cfg(feature = "openai")]
pub use openai::OpenAiModel;

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::lint::looks_like_sql;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Failures at the model boundary. Always surfaced as user-visible
/// messages, never propagated as raw panics.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("model call timed out after {0} seconds")]
    Timeout(u64),

    #[error("model backend error: {0}")]
    Backend(String),

    #[error("model returned an empty response")]
    EmptyResponse,
}

/// An external generative text service.
#[async_trait]
pub trait TextModel: Send + Sync {
    /// One prompt in, raw text out.
    async fn generate(&self, prompt: &str) -> ModelResult<String>;
}

/// Inputs for a grounded prompt.
#[derive(Debug, Clone, Copy)]
pub struct PromptContext<'a> {
    pub schema: &'a str,
    pub question: &'a str,
    pub season: i32,
    pub current_year: i32,
}

/// Token spellings tolerated in prompt skeletons.
///
/// Prompt files are human-edited; rather than fixing one canonical token
/// name, every common spelling is substituted and unknown tokens are left
/// intact rather than raising.
fn replacements(ctx: &PromptContext<'_>) -> Vec<(&'static str, String)> {
    let season = ctx.season.to_string();
    let current = ctx.current_year.to_string();
    vec![
        ("{schema}", ctx.schema.to_string()),
        ("{SCHEMA}", ctx.schema.to_string()),
        ("{{SCHEMA}}", ctx.schema.to_string()),
        ("{question}", ctx.question.to_string()),
        ("{QUESTION}", ctx.question.to_string()),
        ("{{QUESTION}}", ctx.question.to_string()),
        ("{query}", ctx.question.to_string()),
        ("{user_query}", ctx.question.to_string()),
        ("{USER_QUERY}", ctx.question.to_string()),
        ("{season}", season.clone()),
        ("{SEASON}", season.clone()),
        ("{{SEASON}}", season.clone()),
        ("{requested_season}", season.clone()),
        ("{REQUESTED_SEASON}", season),
        ("{current_year}", current.clone()),
        ("{CURRENT_YEAR}", current),
    ]
}

/// Minimum plausible length for a substituted prompt. Anything shorter
/// means the skeleton was missing or mostly empty.
const MIN_PROMPT_LEN: usize = 200;

/// Build the grounded prompt from a skeleton.
///
/// Embeds the schema description, the literal question, and both the
/// requested season and the current year so the model can reason about
/// season availability. If the skeleton is missing or implausibly short,
/// a minimal grounded prompt is synthesized instead.
pub fn build_prompt(skeleton: &str, ctx: &PromptContext<'_>) -> String {
    let mut prompt = skeleton.to_string();
    for (token, value) in replacements(ctx) {
        prompt = prompt.replace(token, &value);
    }
    if prompt.trim().len() < MIN_PROMPT_LEN {
        prompt = format!(
            "You are a PostgreSQL expert and baseball analyst.\n\
             Translate the user question into a single valid PostgreSQL query \
             using the provided schema.\nOnly return SQL (no explanations).\n\n\
             Question: {}\nRequested season: {}\nCurrent year: {}\n\nSchema:\n{}\n",
            ctx.question, ctx.season, ctx.current_year, ctx.schema
        );
    }
    prompt
}

/// Strip common code-fence decoration from a model response.
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```sql", "").replace("```", "").trim().to_string()
}

/// Phrases marking a reply as a refusal rather than SQL.
pub const REFUSAL_MARKERS: &[&str] = &[
    "i cannot",
    "i can't",
    "cannot answer",
    "unable to",
    "not available in this database",
    "no sql",
    "sorry",
];

/// A classified model reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelReply {
    /// Cleaned text that opens with a recognized SQL keyword.
    Sql(String),
    /// Anything else; must never be executed.
    Refusal(String),
}

/// Classify a raw model response after stripping decoration.
pub fn classify_reply(raw: &str) -> ModelReply {
    let cleaned = strip_code_fences(raw);
    if looks_like_sql(&cleaned) {
        ModelReply::Sql(cleaned)
    } else {
        ModelReply::Refusal(cleaned)
    }
}

/// True when a refusal text matches the fixed marker list.
pub fn is_refusal_phrase(text: &str) -> bool {
    let lower = text.to_lowercase();
    REFUSAL_MARKERS.iter().any(|m| lower.contains(m))
}

/// Bounded-timeout wrapper around a [`TextModel`].
pub struct ModelAdapter {
    model: Box<dyn TextModel>,
    timeout: Duration,
}

impl ModelAdapter {
    pub fn new(model: Box<dyn TextModel>, timeout: Duration) -> Self {
        Self { model, timeout }
    }

    /// Call the model and classify its reply.
    ///
    /// The call never hangs: expiry surfaces as [`ModelError::Timeout`].
    pub async fn generate_sql(&self, prompt: &str) -> ModelResult<ModelReply> {
        let raw = tokio::time::timeout(self.timeout, self.model.generate(prompt))
            .await
            .map_err(|_| ModelError::Timeout(self.timeout.as_secs()))??;
        if raw.trim().is_empty() {
            return Err(ModelError::EmptyResponse);
        }
        Ok(classify_reply(&raw))
    }
}

/// Deterministic test double: replays a scripted sequence of responses.
pub struct ScriptedModel {
    replies: Mutex<VecDeque<String>>,
}

impl ScriptedModel {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
        }
    }
}

#[async_trait]
impl TextModel for ScriptedModel {
    async fn generate(&self, _prompt: &str) -> ModelResult<String> {
        self.replies
            .lock()
            .expect("scripted model lock")
            .pop_front()
            .ok_or(ModelError::EmptyResponse)
    }
}
