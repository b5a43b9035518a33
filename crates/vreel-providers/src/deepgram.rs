//! Deepgram transcription client.
//!
//! Speaks the prerecorded `/v1/listen` API with URL-based input, so the
//! media bytes flow straight from storage to Deepgram without passing
//! through this process.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use vreel_models::{TranscriptSegment, TranscriptWord, VideoTranscript};

use crate::error::{ProviderError, ProviderResult};
use crate::traits::TranscriptionProvider;

const DEFAULT_BASE_URL: &str = "https://api.deepgram.com";
const MODEL: &str = "nova-3";

/// Configuration for the Deepgram client.
#[derive(Debug, Clone)]
pub struct DeepgramConfig {
    pub api_key: String,
    /// Override for tests; production leaves the default.
    pub base_url: String,
    /// Request timeout (transcription of long media is slow).
    pub timeout: Duration,
}

impl DeepgramConfig {
    /// Create config from environment variables.
    pub fn from_env() -> ProviderResult<Self> {
        let api_key = std::env::var("DEEPGRAM_API_KEY")
            .map_err(|_| ProviderError::config("DEEPGRAM_API_KEY not set"))?;

        Ok(Self {
            api_key,
            base_url: std::env::var("DEEPGRAM_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            timeout: Duration::from_secs(
                std::env::var("DEEPGRAM_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(300),
            ),
        })
    }
}

/// Deepgram prerecorded transcription client.
pub struct DeepgramClient {
    http: Client,
    config: DeepgramConfig,
}

#[derive(Debug, serde::Serialize)]
struct ListenRequest<'a> {
    url: &'a str,
}

#[derive(Debug, Deserialize)]
struct ListenResponse {
    results: ListenResults,
}

#[derive(Debug, Deserialize)]
struct ListenResults {
    #[serde(default)]
    channels: Vec<ListenChannel>,
    #[serde(default)]
    utterances: Vec<ListenUtterance>,
}

#[derive(Debug, Deserialize)]
struct ListenChannel {
    #[serde(default)]
    alternatives: Vec<ListenAlternative>,
    detected_language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListenAlternative {
    transcript: String,
}

#[derive(Debug, Deserialize)]
struct ListenUtterance {
    start: f64,
    end: f64,
    transcript: String,
    #[serde(default)]
    words: Vec<ListenWord>,
}

#[derive(Debug, Deserialize)]
struct ListenWord {
    word: String,
    start: f64,
    end: f64,
    confidence: f64,
}

impl DeepgramClient {
    /// Create a new Deepgram client.
    pub fn new(config: DeepgramConfig) -> ProviderResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ProviderError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> ProviderResult<Self> {
        Self::new(DeepgramConfig::from_env()?)
    }

    fn listen_url(&self, language_hint: Option<&str>) -> ProviderResult<Url> {
        let mut url = Url::parse(&self.config.base_url)
            .and_then(|u| u.join("/v1/listen"))
            .map_err(|e| ProviderError::config(format!("Bad Deepgram base URL: {}", e)))?;

        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("model", MODEL)
                .append_pair("punctuate", "true")
                .append_pair("paragraphs", "true")
                .append_pair("utterances", "true")
                .append_pair("smart_format", "true")
                .append_pair("diarize", "false");
            if let Some(language) = language_hint {
                pairs.append_pair("language", language);
            }
        }

        Ok(url)
    }

    fn map_response(
        response: ListenResponse,
        language_hint: Option<&str>,
    ) -> ProviderResult<VideoTranscript> {
        let results = response.results;

        let segments: Vec<TranscriptSegment> = results
            .utterances
            .iter()
            .map(|u| TranscriptSegment {
                text: u.transcript.clone(),
                start: u.start,
                end: u.end,
                words: u
                    .words
                    .iter()
                    .map(|w| TranscriptWord {
                        word: w.word.clone(),
                        start: w.start,
                        end: w.end,
                        confidence: w.confidence,
                    })
                    .collect(),
            })
            .collect();

        let channel = results.channels.first();
        let full_text = channel
            .and_then(|c| c.alternatives.first())
            .map(|a| a.transcript.clone())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| {
                segments
                    .iter()
                    .map(|s| s.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" ")
            });

        let language = channel
            .and_then(|c| c.detected_language.clone())
            .or_else(|| language_hint.map(str::to_string))
            .unwrap_or_else(|| "en".to_string());

        Ok(VideoTranscript {
            language,
            segments,
            full_text,
        })
    }
}

#[async_trait]
impl TranscriptionProvider for DeepgramClient {
    async fn transcribe(
        &self,
        media_url: &str,
        language_hint: Option<&str>,
    ) -> ProviderResult<VideoTranscript> {
        let url = self.listen_url(language_hint)?;
        debug!(media_url, "Requesting Deepgram transcription");

        let response = self
            .http
            .post(url)
            .header("Authorization", format!("Token {}", self.config.api_key))
            .json(&ListenRequest { url: media_url })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::timeout(format!("Deepgram request timed out: {}", e))
                } else {
                    ProviderError::Network(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status, body));
        }

        let listen: ListenResponse = response.json().await.map_err(|e| {
            ProviderError::invalid_response(format!("Failed to parse Deepgram response: {}", e))
        })?;

        let transcript = Self::map_response(listen, language_hint)?;
        info!(
            language = %transcript.language,
            segments = transcript.segments.len(),
            "Transcription complete"
        );
        Ok(transcript)
    }
}
