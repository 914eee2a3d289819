use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::error::ProviderError;

/// Transcripts are advisory; a slow source must not stall extraction.
const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// One transcript endpoint. The fetch chain tries a caller-operated local
/// server first, then the hosted fallback; both speak the same shape.
pub struct HttpTranscriptSource {
    http: reqwest::Client,
    endpoint: String,
    label: &'static str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub transcript: Option<String>,
}

/// Summary attached to a video after transcript resolution. Transcripts are
/// advisory input for keyword extraction; fetch failure is never fatal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptInfo {
    pub has_transcript: bool,
    pub length: usize,
    /// True when supplied by the operator instead of fetched.
    pub is_manual: bool,
    pub source: String,
}

impl TranscriptInfo {
    pub fn missing() -> Self {
        Self {
            has_transcript: false,
            length: 0,
            is_manual: false,
            source: "none".to_string(),
        }
    }

    pub fn manual(text: &str) -> Self {
        Self {
            has_transcript: !text.trim().is_empty(),
            length: text.trim().len(),
            is_manual: true,
            source: "manual".to_string(),
        }
    }
}

impl HttpTranscriptSource {
    pub fn new(endpoint: impl Into<String>, label: &'static str) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| ProviderError::network(e.to_string()))?;
        Ok(Self {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            label,
        })
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub async fn fetch(&self, video_id: &str) -> Result<Option<String>, ProviderError> {
        let url = format!("{}/transcript", self.endpoint);
        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "videoId": video_id }))
            .send()
            .await
            .map_err(|e| ProviderError::network(e.to_string()))?;

        if !response.status().is_success() {
            return Ok(None);
        }
        let body: TranscriptResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::decode(e.to_string()))?;
        if body.success {
            Ok(body.transcript.filter(|t| !t.trim().is_empty()))
        } else {
            Ok(None)
        }
    }
}

/// Ordered transcript fetch chain. Local server first when configured, then
/// the hosted endpoint. Every failure is swallowed into "no transcript".
pub struct TranscriptFetcher {
    sources: Vec<HttpTranscriptSource>,
}

impl TranscriptFetcher {
    pub fn new(local_endpoint: Option<&str>, remote_endpoint: Option<&str>) -> Self {
        let mut sources = Vec::new();
        if let Some(local) = local_endpoint {
            if let Ok(source) = HttpTranscriptSource::new(local, "local") {
                sources.push(source);
            }
        }
        if let Some(remote) = remote_endpoint {
            if let Ok(source) = HttpTranscriptSource::new(remote, "remote") {
                sources.push(source);
            }
        }
        Self { sources }
    }

    pub fn is_configured(&self) -> bool {
        !self.sources.is_empty()
    }

    /// Returns the transcript text and which source produced it.
    pub async fn fetch(&self, video_id: &str) -> Option<(String, &'static str)> {
        for source in &self.sources {
            match source.fetch(video_id).await {
                Ok(Some(text)) => return Some((text, source.label())),
                Ok(None) => continue,
                Err(_) => continue,
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_info_counts_trimmed_length() {
        let info = TranscriptInfo::manual("  hello world  ");
        assert!(info.has_transcript);
        assert_eq!(info.length, 11);
        assert!(info.is_manual);
        assert_eq!(info.source, "manual");
    }

    #[test]
    fn manual_info_with_blank_text_is_empty() {
        let info = TranscriptInfo::manual("   ");
        assert!(!info.has_transcript);
        assert_eq!(info.length, 0);
    }

    #[test]
    fn missing_info_defaults() {
        let info = TranscriptInfo::missing();
        assert!(!info.has_transcript);
        assert_eq!(info.source, "none");
    }

    #[test]
    fn per_source_timeout_stays_short() {
        // two sources in the chain must still finish within a prompt's
        // worth of waiting
        assert!(FETCH_TIMEOUT <= Duration::from_secs(5));
    }

    #[test]
    fn unconfigured_fetcher_reports_so() {
        let fetcher = TranscriptFetcher::new(None, None);
        assert!(!fetcher.is_configured());
    }

    #[test]
    fn response_shape_parses() {
        let ok: TranscriptResponse =
            serde_json::from_str(r#"{"success": true, "transcript": "hello"}"#).unwrap();
        assert!(ok.success);
        assert_eq!(ok.transcript.as_deref(), Some("hello"));
        let fail: TranscriptResponse = serde_json::from_str(r#"{"success": false}"#).unwrap();
        assert!(!fail.success);
        assert!(fail.transcript.is_none());
    }
}
