//! AI-assisted interpretation of scan results
//!
//! Posts the raw scan text to the OpenAI chat-completions API and stores
//! the returned risk summary as a timestamped text file. Strictly
//! best-effort: the scan and report never depend on this succeeding.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::{env, path::PathBuf, time::Duration};
use tokio::fs;
use tracing::{debug, info};

use crate::{
    config::{AnalysisConfig, AppConfig},
    error::{GhostVenomError, Result},
};

const CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

const SYSTEM_PROMPT: &str = "You are a defensive security analyst.\n\n\
Analyze the following Nmap scan output and provide a concise, \
structured assessment:\n\
1) Target overview and high-level summary\n\
2) Open ports with detected services/versions (short list)\n\
3) Potential security risks or misconfigurations (qualitative)\n\
4) Overall risk level (Low / Medium / High) with reasoning\n\
5) Recommended defensive next steps\n\n\
Be precise and technical. Avoid speculation and unnecessary verbosity.";

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    temperature: f64,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// LLM analyzer collaborator
pub struct GptAnalyzer {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    output_dir: PathBuf,
}

impl GptAnalyzer {
    pub fn new(config: &AnalysisConfig) -> Self {
        let model = env::var("GVA_OPENAI_MODEL").unwrap_or_else(|_| config.model.clone());
        let output_dir = env::var("GVA_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config.output_dir.clone());

        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .unwrap_or_default(),
            api_key: resolve_api_key(
                env::var("OPENAI_API_KEY").ok(),
                env::var("GVA_OPENAI_KEY").ok(),
                &config.api_key,
            ),
            model,
            output_dir,
        }
    }

    /// Whether an API key is available at all
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Analyze scan output and write the summary to a timestamped file
    pub async fn analyze(&self, scan_text: &str) -> Result<PathBuf> {
        if scan_text.trim().is_empty() {
            return Err(GhostVenomError::analysis(
                "No scan output provided for analysis",
            ));
        }

        let api_key = self.api_key.as_deref().ok_or_else(|| {
            GhostVenomError::analysis("OpenAI API key not found. Set OPENAI_API_KEY or GVA_OPENAI_KEY.")
        })?;

        debug!(model = %self.model, "Requesting scan analysis");

        let request = build_request(&self.model, scan_text);
        let response: ChatResponse = self
            .client
            .post(CHAT_COMPLETIONS_URL)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        let out_file = self.output_dir.join(analysis_file_name(Utc::now()));
        fs::create_dir_all(&self.output_dir).await.map_err(|e| {
            GhostVenomError::analysis(format!("Failed to create output directory: {e}"))
        })?;
        fs::write(&out_file, content).await.map_err(|e| {
            GhostVenomError::analysis(format!("Failed to write analysis file: {e}"))
        })?;

        info!("Analysis written: {}", out_file.display());
        Ok(out_file)
    }
}

fn build_request(model: &str, scan_text: &str) -> ChatRequest {
    ChatRequest {
        model: model.to_string(),
        temperature: 0.2,
        messages: vec![
            ChatMessage {
                role: "system",
                content: SYSTEM_PROMPT.to_string(),
            },
            ChatMessage {
                role: "user",
                content: scan_text.to_string(),
            },
        ],
    }
}

/// Key resolution order: OPENAI_API_KEY env, GVA_OPENAI_KEY env, config file
fn resolve_api_key(
    env_primary: Option<String>,
    env_alternate: Option<String>,
    configured: &str,
) -> Option<String> {
    for candidate in [env_primary, env_alternate, Some(configured.to_string())] {
        match candidate {
            Some(key) if !key.trim().is_empty() => return Some(key.trim().to_string()),
            _ => {}
        }
    }
    None
}

fn analysis_file_name(now: chrono::DateTime<Utc>) -> String {
    format!("gpt_analysis_{}.txt", now.format("%Y-%m-%d_%H-%M-%S"))
}

/// Create the analyzer from application configuration
pub fn create_analyzer(config: &AppConfig) -> GptAnalyzer {
    GptAnalyzer::new(&config.analysis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_key_resolution_order() {
        let key = resolve_api_key(Some("sk-env".into()), Some("sk-alt".into()), "sk-cfg");
        assert_eq!(key.as_deref(), Some("sk-env"));

        let key = resolve_api_key(None, Some("sk-alt".into()), "sk-cfg");
        assert_eq!(key.as_deref(), Some("sk-alt"));

        let key = resolve_api_key(None, None, "sk-cfg");
        assert_eq!(key.as_deref(), Some("sk-cfg"));

        assert_eq!(resolve_api_key(None, None, ""), None);
        assert_eq!(resolve_api_key(Some("  ".into()), None, ""), None);
    }

    #[test]
    fn test_request_payload_shape() {
        let request = build_request("gpt-4o-mini", "80/tcp open http");
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["temperature"], 0.2);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "80/tcp open http");
    }

    #[test]
    fn test_analysis_file_name_format() {
        let ts = Utc.with_ymd_and_hms(2024, 6, 1, 9, 5, 3).unwrap();
        assert_eq!(analysis_file_name(ts), "gpt_analysis_2024-06-01_09-05-03.txt");
    }

    #[tokio::test]
    async fn test_blank_scan_text_is_rejected() {
        let analyzer = GptAnalyzer::new(&AnalysisConfig {
            api_key: "sk-test".into(),
            ..AnalysisConfig::default()
        });

        let result = analyzer.analyze("   \n  ").await;
        assert!(matches!(result, Err(GhostVenomError::Analysis { .. })));
    }

    #[tokio::test]
    async fn test_missing_key_is_rejected() {
        let analyzer = GptAnalyzer {
            client: reqwest::Client::new(),
            api_key: None,
            model: "gpt-4o-mini".into(),
            output_dir: PathBuf::from("output"),
        };

        let result = analyzer.analyze("80/tcp open http").await;
        assert!(matches!(result, Err(GhostVenomError::Analysis { .. })));
    }
}
