// Anthropic Messages API client for the need-ranking call.
//
// A single non-streaming request per ranking decision: the response
// contract is one player id, so there is nothing worth streaming.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::catalog::PlayerAttributes;
use crate::config::Config;
use crate::draft::autopick::RosterNeeds;
use crate::draft::state::TeamDraftRecord;

use super::prompt;
use super::{NeedRanker, RankingError};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Low-level Anthropic API client.
pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicClient {
    pub fn new(api_key: String, model: String, max_tokens: u32) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            model,
            max_tokens,
        }
    }

    /// Send one ranking request and return the raw response text.
    async fn complete(&self, system: &str, user_content: &str) -> Result<String, RankingError> {
        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "system": system,
            "messages": [{ "role": "user", "content": user_content }]
        });

        let response = self
            .http
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RankingError::Api(status.as_u16()));
        }

        let value: Value = response.json().await?;
        extract_response_text(&value)
            .ok_or_else(|| RankingError::Malformed(value.to_string()))
    }
}

/// Extract the first text block from a Messages API response.
///
/// Expected shape: `{ "content": [ { "type": "text", "text": "..." } ] }`
pub(crate) fn extract_response_text(value: &Value) -> Option<String> {
    value
        .get("content")?
        .as_array()?
        .iter()
        .find(|block| block.get("type").and_then(Value::as_str) == Some("text"))?
        .get("text")?
        .as_str()
        .map(|s| s.to_string())
}

/// High-level wrapper that can be either an active client or disabled.
pub enum RankingClient {
    /// API key configured and ready.
    Active(AnthropicClient),
    /// Ranking disabled (no API key); every call reports `Disabled` and the
    /// engine falls back to its local policy.
    Disabled,
}

impl RankingClient {
    /// Build a client from the application config. `Active` only when an
    /// API key is present in credentials.
    pub fn from_config(config: &Config) -> Self {
        match &config.credentials.anthropic_api_key {
            Some(key) if !key.is_empty() => RankingClient::Active(AnthropicClient::new(
                key.clone(),
                config.llm.model.clone(),
                config.llm.max_tokens,
            )),
            _ => RankingClient::Disabled,
        }
    }
}

#[async_trait]
impl NeedRanker for RankingClient {
    async fn rank_for_need(
        &self,
        team: &TeamDraftRecord,
        candidates: &[PlayerAttributes],
        needs: &RosterNeeds,
        pick_number: u32,
        round: u32,
    ) -> Result<String, RankingError> {
        let client = match self {
            RankingClient::Active(client) => client,
            RankingClient::Disabled => return Err(RankingError::Disabled),
        };

        let system = prompt::system_prompt();
        let user = prompt::build_ranking_prompt(team, candidates, needs, pick_number, round);
        let text = client.complete(&system, &user).await?;
        debug!(%text, "ranking response");

        match prompt::parse_choice(&text, candidates) {
            Some(player_id) => Ok(player_id),
            None => Err(RankingError::NotACandidate(text.trim().to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extract_response_text_happy_path() {
        let value = json!({
            "content": [{ "type": "text", "text": "p3" }]
        });
        assert_eq!(extract_response_text(&value).as_deref(), Some("p3"));
    }

    #[test]
    fn extract_response_text_skips_non_text_blocks() {
        let value = json!({
            "content": [
                { "type": "thinking", "thinking": "..." },
                { "type": "text", "text": "p1" }
            ]
        });
        assert_eq!(extract_response_text(&value).as_deref(), Some("p1"));
    }

    #[test]
    fn extract_response_text_malformed_is_none() {
        assert!(extract_response_text(&json!({})).is_none());
        assert!(extract_response_text(&json!({ "content": [] })).is_none());
        assert!(extract_response_text(&json!({ "content": "p1" })).is_none());
    }

    #[tokio::test]
    async fn disabled_client_reports_disabled() {
        let team = TeamDraftRecord {
            team_id: "team_cpu".to_string(),
            computer_controlled: true,
            picks: vec![],
        };
        let needs = RosterNeeds::from_picks(&team.picks);
        let err = RankingClient::Disabled
            .rank_for_need(&team, &[], &needs, 1, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, RankingError::Disabled));
    }
}
