//! Natural-language document matching via a chat-completion API.
//!
//! The matcher sends the numbered document list and the user's query to a
//! language model, reads back the names it picked (one per line), and maps
//! those names onto the documents fetched in this run.

use std::fmt::Write as _;

use reqwest::Client;
use tracing::debug;

use crate::error::{GdocError, Result};
use crate::models::{ChatMessage, ChatRequest, ChatResponse, Document};

/// Base URL for the Together AI API.
pub const TOGETHER_API_BASE: &str = "https://api.together.xyz/v1";

/// Model used for matching.
pub const DEFAULT_MODEL: &str = "ServiceNow-AI/Apriel-1.6-15b-Thinker";

/// Answer the model gives when nothing matches.
const NONE_TOKEN: &str = "NONE";

/// Connection settings for the completion endpoint.
#[derive(Debug, Clone)]
pub struct MatcherConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

impl MatcherConfig {
    /// Settings for the public Together API with the default model.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: TOGETHER_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

/// Selects documents matching a free-text query.
pub struct QueryMatcher {
    config: MatcherConfig,
    http: Client,
}

impl QueryMatcher {
    pub fn new(config: MatcherConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }

    /// Return the documents the model judges relevant to `query`, in the
    /// order of `documents`.
    pub async fn find_matches(&self, documents: &[Document], query: &str) -> Result<Vec<Document>> {
        let candidates = self.request_candidates(documents, query).await?;
        debug!(candidates = candidates.len(), "model returned candidates");
        Ok(reconcile(documents, &candidates))
    }

    /// Ask the model for matching names and return the cleaned candidate lines.
    pub async fn request_candidates(
        &self,
        documents: &[Document],
        query: &str,
    ) -> Result<Vec<String>> {
        let prompt = build_prompt(documents, query);
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage::user(prompt)],
        };
        let body = serde_json::to_vec(&request).map_err(GdocError::RequestSerialization)?;

        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        debug!(%url, model = %self.config.model, bytes = body.len(), "sending completion request");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await?;
        let response_body = response.bytes().await?;

        let response: ChatResponse =
            serde_json::from_slice(&response_body).map_err(GdocError::ResponseParse)?;
        let content = first_completion(response)?;

        Ok(parse_candidates(&content))
    }
}

/// Build the instruction block sent to the model.
pub fn build_prompt(documents: &[Document], query: &str) -> String {
    let mut document_list = String::new();
    for (index, document) in documents.iter().enumerate() {
        let _ = write!(document_list, "{}. {}", index + 1, document.name);
        if let Some(description) = document.description() {
            let _ = write!(document_list, " - {}", description);
        }
        document_list.push('\n');
    }

    format!(
        "You are a document filter assistant. Given a list of document names and a search query, return ONLY the names of documents that match the query.

Which documents from this list:
{document_list}
Match the prompt: {query}

Rules:
1. Return ONLY the document names that match, one per line
2. Use EXACT document names from the list
3. If no documents match, return \"{NONE_TOKEN}\"
4. Do not explain or add any other text

Matching documents:"
    )
}

/// Extract the first completion's content, surfacing payload errors.
fn first_completion(response: ChatResponse) -> Result<String> {
    if let Some(error) = response.error {
        return Err(GdocError::MatcherApi(error.message));
    }

    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content.unwrap_or_default())
        .ok_or(GdocError::NoCompletion)
}

/// Split the model's answer into candidate document names.
///
/// Bullets (`- `, `* `) and short numeric prefixes (`1. `, `12. `) are
/// stripped. Both numeric checks run in sequence and only look at byte
/// positions, so a name whose third character is a period followed by a space
/// loses its first four bytes, even after a one-digit prefix was already
/// removed (`1. Dr. Who` yields `Who`).
pub fn parse_candidates(content: &str) -> Vec<String> {
    let content = content.trim();
    if content.is_empty() || content == NONE_TOKEN {
        return Vec::new();
    }

    content
        .split('\n')
        .filter_map(|line| {
            let cleaned = clean_line(line);
            (!cleaned.is_empty() && cleaned != NONE_TOKEN).then(|| cleaned.to_string())
        })
        .collect()
}

fn clean_line(line: &str) -> &str {
    let mut cleaned = line.trim();
    cleaned = cleaned.strip_prefix("- ").unwrap_or(cleaned);
    cleaned = cleaned.strip_prefix("* ").unwrap_or(cleaned);

    // Byte checks: '.' and ' ' are ASCII, so the slice point is a char boundary.
    let bytes = cleaned.as_bytes();
    if bytes.len() > 3 && bytes[1] == b'.' && bytes[2] == b' ' {
        cleaned = &cleaned[3..];
    }
    let bytes = cleaned.as_bytes();
    if bytes.len() > 4 && bytes[2] == b'.' && bytes[3] == b' ' {
        cleaned = &cleaned[4..];
    }

    cleaned.trim()
}

/// Map candidate names back onto fetched documents.
///
/// A document matches when its name equals a candidate ignoring case, or its
/// lowercased name contains the lowercased candidate. Each document appears
/// at most once, in its original position.
pub fn reconcile(documents: &[Document], candidates: &[String]) -> Vec<Document> {
    let candidates: Vec<String> = candidates.iter().map(|c| c.to_lowercase()).collect();

    documents
        .iter()
        .filter(|document| {
            let name = document.name.to_lowercase();
            candidates
                .iter()
                .any(|candidate| name == *candidate || name.contains(candidate.as_str()))
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChatChoice, ChatChoiceMessage, ChatError};

    fn doc(name: &str) -> Document {
        Document {
            id: format!("id-{}", name.to_lowercase().replace(' ', "-")),
            name: name.to_string(),
            description: None,
            modified_time: None,
            created_time: None,
        }
    }

    fn names(documents: &[Document]) -> Vec<&str> {
        documents.iter().map(|d| d.name.as_str()).collect()
    }

    fn candidates(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|l| l.to_string()).collect()
    }

    #[test]
    fn test_none_answer_is_empty() {
        assert!(parse_candidates("NONE").is_empty());
        assert!(parse_candidates("  \n NONE \n\t").is_empty());
        assert!(parse_candidates("").is_empty());
        assert!(parse_candidates("   ").is_empty());
    }

    #[test]
    fn test_lowercase_none_is_a_candidate() {
        assert_eq!(parse_candidates("none"), vec!["none"]);
    }

    #[test]
    fn test_bullets_stripped() {
        assert_eq!(parse_candidates("- Example Doc"), vec!["Example Doc"]);
        assert_eq!(parse_candidates("* Example Doc"), vec!["Example Doc"]);
    }

    #[test]
    fn test_numeric_prefixes_stripped() {
        assert_eq!(parse_candidates("1. Example Doc"), vec!["Example Doc"]);
        assert_eq!(parse_candidates("12. Example Doc"), vec!["Example Doc"]);
        assert_eq!(parse_candidates("- 3. Example Doc"), vec!["Example Doc"]);
    }

    #[test]
    fn test_double_prefix_truncation() {
        // After "1. " is removed, "Dr. " still looks like a two-digit prefix.
        assert_eq!(parse_candidates("1. Dr. Who Notes"), vec!["Who Notes"]);
        assert_eq!(parse_candidates("1. St. Louis Trip"), vec!["Louis Trip"]);
        assert_eq!(parse_candidates("Dr. Who Notes"), vec!["Who Notes"]);
        assert_eq!(parse_candidates("1. A. Budget"), vec!["A. Budget"]);
    }

    #[test]
    fn test_short_lines_keep_prefix_shape() {
        // Length must exceed the prefix for it to be stripped.
        assert_eq!(parse_candidates("1. "), vec!["1."]);
        assert_eq!(parse_candidates("12. "), vec!["12."]);
        assert_eq!(parse_candidates("1. A"), vec!["A"]);
    }

    #[test]
    fn test_only_one_bullet_of_each_kind() {
        assert_eq!(parse_candidates("- - Notes"), vec!["- Notes"]);
        assert_eq!(parse_candidates("- * Notes"), vec!["Notes"]);
        assert_eq!(parse_candidates("* - Notes"), vec!["- Notes"]);
    }

    #[test]
    fn test_lines_kept_in_order_with_duplicates() {
        let parsed = parse_candidates("Beta\n\nNONE\nAlpha\r\nBeta\n");
        assert_eq!(parsed, vec!["Beta", "Alpha", "Beta"]);
    }

    #[test]
    fn test_multibyte_names_survive_prefix_checks() {
        assert_eq!(parse_candidates("1. Résumé"), vec!["Résumé"]);
        assert_eq!(parse_candidates("日本語の文書"), vec!["日本語の文書"]);
    }

    #[test]
    fn test_reconcile_exact_case_insensitive() {
        let documents = vec![doc("Alpha"), doc("Beta"), doc("Gamma")];
        let matched = reconcile(&documents, &candidates(&["beta"]));
        assert_eq!(names(&matched), vec!["Beta"]);
    }

    #[test]
    fn test_reconcile_substring() {
        let documents = vec![doc("Quarterly Report Draft"), doc("Notes")];
        let matched = reconcile(&documents, &candidates(&["Report"]));
        assert_eq!(names(&matched), vec!["Quarterly Report Draft"]);
    }

    #[test]
    fn test_reconcile_never_duplicates_a_document() {
        let documents = vec![doc("Quarterly Report Draft")];
        let matched = reconcile(
            &documents,
            &candidates(&["Quarterly Report Draft", "Report", "report"]),
        );
        assert_eq!(matched.len(), 1);
    }

    #[test]
    fn test_reconcile_preserves_document_order() {
        let documents = vec![doc("Alpha"), doc("Beta"), doc("Gamma")];
        let matched = reconcile(&documents, &candidates(&["Gamma", "Alpha"]));
        assert_eq!(names(&matched), vec!["Alpha", "Gamma"]);
    }

    #[test]
    fn test_reconcile_duplicate_names_both_returned() {
        let documents = vec![doc("Plan"), doc("Plan")];
        let matched = reconcile(&documents, &candidates(&["plan"]));
        assert_eq!(matched.len(), 2);
    }

    #[test]
    fn test_reconcile_no_candidates() {
        let documents = vec![doc("Alpha")];
        assert!(reconcile(&documents, &[]).is_empty());
    }

    #[test]
    fn test_prompt_lists_documents_with_descriptions() {
        let mut described = doc("Budget");
        described.description = Some("FY24 numbers".to_string());
        let mut blank = doc("Notes");
        blank.description = Some(String::new());

        let prompt = build_prompt(&[described, blank], "money stuff");

        assert!(prompt.contains("1. Budget - FY24 numbers\n"));
        assert!(prompt.contains("2. Notes\n"));
        assert!(!prompt.contains("2. Notes -"));
        assert!(prompt.contains("Match the prompt: money stuff"));
        assert!(prompt.contains("return \"NONE\""));
        assert!(prompt.ends_with("Matching documents:"));
    }

    #[test]
    fn test_first_completion_error_field() {
        let response = ChatResponse {
            choices: Vec::new(),
            error: Some(ChatError {
                message: "rate limited".to_string(),
            }),
        };
        let err = first_completion(response).unwrap_err();
        assert!(matches!(err, GdocError::MatcherApi(ref m) if m == "rate limited"));
    }

    #[test]
    fn test_first_completion_no_choices() {
        let err = first_completion(ChatResponse::default()).unwrap_err();
        assert!(matches!(err, GdocError::NoCompletion));
    }

    #[test]
    fn test_first_completion_takes_first() {
        let response = ChatResponse {
            choices: vec![
                ChatChoice {
                    message: ChatChoiceMessage {
                        content: Some("Alpha".to_string()),
                    },
                },
                ChatChoice {
                    message: ChatChoiceMessage {
                        content: Some("Beta".to_string()),
                    },
                },
            ],
            error: None,
        };
        assert_eq!(first_completion(response).unwrap(), "Alpha");
    }
}
