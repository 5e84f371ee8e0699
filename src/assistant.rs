use crate::gemini::{GenerativeBackend, GENERATION_CONFIG};
use log::{info, warn};
use serde::Serialize;

pub const TITLE: &str = "Chef Mate: Assistant 🤖🍳";
pub const INTRO: &str = "Ask me how to cook your favorite dishes! For other queries, I'll politely decline. 😊";
pub const ANSWER_LABEL: &str = "🍴 **Chef Mate says:** ";
pub const REFUSAL_MESSAGE: &str =
    "❌ I'm only allowed to assist you with food recipes. Please ask about recipes or cooking methods.";

pub const FOOD_KEYWORDS: [&str; 7] = [
    "recipe",
    "ingredients",
    "how to cook",
    "how to make",
    "cooking",
    "dish",
    "prepare",
];

/// Terminal state of one assistant request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum AssistantResult {
    /// Blank input; nothing was classified or sent.
    Idle,
    Refused(String),
    Answered(String),
    Failed(String),
}

/// Keyword test on the lowercased query. Plain substring matching, so
/// phrasings without any keyword are declined.
pub fn is_food_related(query: &str) -> bool {
    let query = query.to_lowercase();
    FOOD_KEYWORDS.iter().any(|keyword| query.contains(keyword))
}

pub struct RecipeAssistant<B> {
    backend: B,
}

impl<B: GenerativeBackend> RecipeAssistant<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub async fn answer(&self, query: &str) -> AssistantResult {
        if query.trim().is_empty() {
            return AssistantResult::Idle;
        }

        if !is_food_related(query) {
            info!("Declining off-topic query");
            return AssistantResult::Refused(REFUSAL_MESSAGE.to_string());
        }

        match self.backend.generate(query, &GENERATION_CONFIG).await {
            Ok(text) => {
                info!("Backend answered with {} bytes", text.len());
                AssistantResult::Answered(format!("{}{}", ANSWER_LABEL, text))
            }
            Err(e) => {
                warn!("Backend call failed: {}", e);
                AssistantResult::Failed(format!("Sorry, something went wrong: {}", e))
            }
        }
    }
}
