//! Scripted response engine
//!
//! The ResponseEngine turns free text into a canned reply:
//! 1. Lower-cases the input
//! 2. Walks the ordered pattern list and takes the first group with a hit
//! 3. Picks a random table entry for insight/tip, or the fallback template
//!
//! Nothing here is generative. Every reply is a fixed string.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::conversation::Category;

use super::content::{self, PATTERNS};
use super::profile::ProfileRepository;
use super::random::{pick, RandomSource};

/// A generated reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub text: String,
    pub category: Category,
}

impl Reply {
    fn new(text: impl Into<String>, category: Category) -> Self {
        Self {
            text: text.into(),
            category,
        }
    }
}

/// Special action buttons that show a banner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Tips,
    Insights,
    Emergency,
}

impl std::str::FromStr for ActionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tips" => Ok(ActionKind::Tips),
            "insights" => Ok(ActionKind::Insights),
            "emergency" => Ok(ActionKind::Emergency),
            other => Err(format!("Unknown action: {}", other)),
        }
    }
}

/// Category for `input`, by first matching pattern group
pub fn classify(input: &str) -> Category {
    let normalized = input.to_lowercase();

    PATTERNS
        .iter()
        .find(|pattern| pattern.keywords.iter().any(|k| normalized.contains(k)))
        .map(|pattern| pattern.category)
        .unwrap_or(Category::Bot)
}

/// Fallback reply, greeting the user by name when one is known
pub fn fallback_text(name: Option<&str>) -> String {
    match name {
        Some(name) => format!("Olá {}, {}", name, content::FALLBACK),
        None => content::FALLBACK.to_string(),
    }
}

pub fn emergency_acknowledgment() -> Reply {
    Reply::new(content::EMERGENCY_ACK, Category::Insight)
}

pub fn action_message(kind: ActionKind) -> &'static str {
    match kind {
        ActionKind::Tips => content::actions::TIPS,
        ActionKind::Insights => content::actions::INSIGHTS,
        ActionKind::Emergency => content::actions::EMERGENCY,
    }
}

/// The response engine
pub struct ResponseEngine {
    profiles: Arc<dyn ProfileRepository>,
    random: Arc<dyn RandomSource>,
}

impl ResponseEngine {
    pub fn new(profiles: Arc<dyn ProfileRepository>, random: Arc<dyn RandomSource>) -> Self {
        Self { profiles, random }
    }

    /// Reply to free text. Never fails: unmatched input gets the fallback.
    pub async fn respond(&self, input: &str) -> Reply {
        let category = classify(input);
        tracing::debug!(category = category.as_str(), "classified input");

        match category {
            Category::Insight => Reply::new(self.insight_on_demand(), category),
            Category::Tip => Reply::new(self.tip_on_demand(), category),
            _ => {
                let name = self.display_name().await;
                Reply::new(fallback_text(name.as_deref()), Category::Bot)
            }
        }
    }

    pub fn insight_on_demand(&self) -> &'static str {
        pick(self.random.as_ref(), content::INSIGHTS)
    }

    pub fn tip_on_demand(&self) -> &'static str {
        pick(self.random.as_ref(), content::TIPS)
    }

    pub fn random(&self) -> &Arc<dyn RandomSource> {
        &self.random
    }

    /// Stored display name. Storage failures and malformed profiles count
    /// as "no name".
    pub async fn display_name(&self) -> Option<String> {
        match self.profiles.get().await {
            Ok(profile) => profile.and_then(|p| p.display_name().map(str::to_string)),
            Err(e) => {
                tracing::warn!(error = %e, "profile lookup failed, replying without greeting");
                None
            }
        }
    }
}
