//! Shared conversation types used across pipelines and bridges.

use serde::{Deserialize, Serialize};

/// Role of a conversation turn. The preamble, when present, is always the
/// first entry of a session and carries `System` or `Developer` depending on
/// the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    Developer,
    User,
    Assistant,
}

impl Role {
    /// Wire name as used by OpenAI-compatible chat APIs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::Developer => "developer",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One part of a structured multi-part user message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { url: String },
}

/// Turn content: plain text, or text plus zero or more image references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TurnContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl TurnContent {
    /// Concatenated text of all textual parts.
    pub fn text(&self) -> String {
        match self {
            TurnContent::Text(t) => t.clone(),
            TurnContent::Parts(parts) => parts
                .iter()
                .filter_map(|p| match p {
                    ContentPart::Text { text } => Some(text.as_str()),
                    ContentPart::ImageUrl { .. } => None,
                })
                .collect::<Vec<_>>()
                .join(" "),
        }
    }

    /// Image payloads carried by this content. Data-URI prefixes are
    /// stripped so callers get the raw base64 body.
    pub fn images(&self) -> Vec<String> {
        match self {
            TurnContent::Text(_) => Vec::new(),
            TurnContent::Parts(parts) => parts
                .iter()
                .filter_map(|p| match p {
                    ContentPart::ImageUrl { url } => {
                        let data = if url.starts_with("data:image") {
                            url.splitn(2, ',').nth(1).unwrap_or(url)
                        } else {
                            url.as_str()
                        };
                        Some(data.to_string())
                    }
                    ContentPart::Text { .. } => None,
                })
                .collect(),
        }
    }
}

/// One entry of a session's conversation log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: TurnContent,
}

impl Turn {
    pub fn text(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: TurnContent::Text(content.into()),
        }
    }
}

/// Renders a session history into a single text blob
/// (`User: ...\nAssistant: ...`), skipping turns with the given preamble
/// role. Used for summarization and topic extraction.
pub fn render_transcript(turns: &[Turn], skip_role: Role) -> String {
    turns
        .iter()
        .filter(|t| t.role != skip_role)
        .map(|t| {
            let role = t.role.as_str();
            let mut label: String = role.chars().take(1).flat_map(|c| c.to_uppercase()).collect();
            label.push_str(&role[1..]);
            format!("{}: {}", label, t.content.text())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Most recent user turn in the supplied history, if any.
pub fn last_user_turn(turns: &[Turn]) -> Option<&Turn> {
    turns.iter().rev().find(|t| t.role == Role::User)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcript_skips_preamble_role() {
        let turns = vec![
            Turn::text(Role::Developer, "preamble"),
            Turn::text(Role::User, "hello"),
            Turn::text(Role::Assistant, "hi"),
        ];
        let blob = render_transcript(&turns, Role::Developer);
        assert_eq!(blob, "User: hello\nAssistant: hi");
    }

    #[test]
    fn images_strip_data_uri_prefix() {
        let content = TurnContent::Parts(vec![
            ContentPart::Text { text: "look".into() },
            ContentPart::ImageUrl { url: "data:image/png;base64,QUJD".into() },
        ]);
        assert_eq!(content.images(), vec!["QUJD".to_string()]);
        assert_eq!(content.text(), "look");
    }

    #[test]
    fn last_user_turn_finds_latest() {
        let turns = vec![
            Turn::text(Role::User, "first"),
            Turn::text(Role::Assistant, "reply"),
            Turn::text(Role::User, "second"),
        ];
        assert_eq!(last_user_turn(&turns).unwrap().content.text(), "second");
    }
}
