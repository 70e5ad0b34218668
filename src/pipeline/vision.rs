//! Vision-model call: one page image plus the tag in, findings text out.
//!
//! One attempt per page, bounded by `api_timeout_secs`. A failed call is
//! returned as a [`PageError`] and the search loop moves on.

use crate::config::{FinderConfig, DEFAULT_MODEL};
use crate::error::{FinderError, PageError};
use crate::prompts::{normalize_reply, tag_prompt, DEFAULT_SYSTEM_PROMPT};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider, ProviderFactory};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Reads one page image and reports what it found about the tag.
#[async_trait]
pub trait PageReader: Send + Sync {
    /// Return the findings for `page_num` (1-indexed); an empty string means
    /// nothing relevant was on the page.
    async fn read_page(
        &self,
        page_num: usize,
        image: ImageData,
        tag: &str,
    ) -> Result<String, PageError>;
}

/// [`PageReader`] backed by an `edgequake-llm` vision provider.
pub struct VisionReader {
    provider: Arc<dyn LLMProvider>,
    system_prompt: String,
    temperature: f32,
    max_tokens: usize,
    timeout_secs: u64,
}

impl VisionReader {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &FinderConfig) -> Self {
        Self {
            provider,
            system_prompt: config
                .system_prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout_secs: config.api_timeout_secs,
        }
    }

    /// Resolve the provider from the config/environment and wrap it.
    pub fn from_config(config: &FinderConfig) -> Result<Self, FinderError> {
        let provider = resolve_provider(config)?;
        Ok(Self::new(provider, config))
    }

    fn build_messages(&self, image: ImageData, tag: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.system_prompt.as_str()),
            ChatMessage::user_with_images(&tag_prompt(tag), vec![image]),
        ]
    }

    fn build_options(&self) -> CompletionOptions {
        CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        }
    }
}

#[async_trait]
impl PageReader for VisionReader {
    async fn read_page(
        &self,
        page_num: usize,
        image: ImageData,
        tag: &str,
    ) -> Result<String, PageError> {
        let start = Instant::now();
        let messages = self.build_messages(image, tag);
        let options = self.build_options();

        let call = self.provider.chat(&messages, Some(&options));
        match tokio::time::timeout(Duration::from_secs(self.timeout_secs), call).await {
            Ok(Ok(response)) => {
                debug!(
                    "Page {}: {} input tokens, {} output tokens, {:?}",
                    page_num,
                    response.prompt_tokens,
                    response.completion_tokens,
                    start.elapsed()
                );
                Ok(normalize_reply(&response.content).to_string())
            }
            Ok(Err(e)) => {
                warn!("Page {}: model call failed: {}", page_num, e);
                Err(PageError::LlmFailed {
                    page: page_num,
                    detail: e.to_string(),
                })
            }
            Err(_) => {
                warn!("Page {}: model call timed out after {}s", page_num, self.timeout_secs);
                Err(PageError::Timeout {
                    page: page_num,
                    secs: self.timeout_secs,
                })
            }
        }
    }
}

/// Instantiate a named provider with the given model.
fn create_vision_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, FinderError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        FinderError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Pick the vision model that reads the newspaper pages.
///
/// A pre-built `config.provider` wins. Otherwise a named provider is taken
/// from `--provider` / [`FinderConfig::provider_name`], then the
/// `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL` pair, then OpenAI when
/// `OPENAI_API_KEY` is set (the default reader, `gpt-4o`). Last comes
/// `edgequake-llm` auto-detection. The chosen model must accept image input
/// and read Gujarati script.
pub fn resolve_provider(config: &FinderConfig) -> Result<Arc<dyn LLMProvider>, FinderError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some((name, model)) = named_provider(config, |key| std::env::var(key).ok()) {
        debug!("Vision reader: provider '{}', model '{}'", name, model);
        return create_vision_provider(&name, &model);
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| FinderError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No vision model is available to read the newspaper pages.\n\
                Set OPENAI_API_KEY (gpt-4o reads Gujarati well), or pick another\n\
                image-capable model with --provider and --model.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

/// Provider name and model from the config or the environment, if any.
fn named_provider(
    config: &FinderConfig,
    env: impl Fn(&str) -> Option<String>,
) -> Option<(String, String)> {
    let var = |key: &str| env(key).filter(|v| !v.trim().is_empty());
    let model = || {
        config
            .model
            .clone()
            .unwrap_or_else(|| DEFAULT_MODEL.to_string())
    };

    if let Some(ref name) = config.provider_name {
        return Some((name.clone(), model()));
    }
    if let (Some(name), Some(env_model)) = (var("EDGEQUAKE_LLM_PROVIDER"), var("EDGEQUAKE_MODEL")) {
        return Some((name, env_model));
    }
    var("OPENAI_API_KEY").map(|_| ("openai".to_string(), model()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn configured_name_beats_environment() {
        let config = FinderConfig::builder()
            .provider_name("anthropic")
            .model("claude-sonnet-4-20250514")
            .build()
            .unwrap();
        let env = env_of(&[("EDGEQUAKE_LLM_PROVIDER", "gemini"), ("EDGEQUAKE_MODEL", "x")]);
        assert_eq!(
            named_provider(&config, env),
            Some(("anthropic".into(), "claude-sonnet-4-20250514".into()))
        );
    }

    #[test]
    fn env_pair_needs_both_values() {
        let config = FinderConfig::default();
        let only_provider = env_of(&[("EDGEQUAKE_LLM_PROVIDER", "gemini")]);
        assert_eq!(named_provider(&config, only_provider), None);

        let pair = env_of(&[
            ("EDGEQUAKE_LLM_PROVIDER", "gemini"),
            ("EDGEQUAKE_MODEL", "gemini-2.0-flash"),
            ("OPENAI_API_KEY", "sk-test"),
        ]);
        assert_eq!(
            named_provider(&config, pair),
            Some(("gemini".into(), "gemini-2.0-flash".into()))
        );
    }

    #[test]
    fn openai_key_selects_default_reader() {
        let config = FinderConfig::default();
        let env = env_of(&[("OPENAI_API_KEY", "sk-test")]);
        assert_eq!(
            named_provider(&config, env),
            Some(("openai".into(), DEFAULT_MODEL.into()))
        );

        let blank = env_of(&[("OPENAI_API_KEY", "  ")]);
        assert_eq!(named_provider(&config, blank), None);
    }
}
