use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::error::ProviderError;

/// Suggestion generation runs a model server side, so this sits well above
/// the transcript timeout, but a hung endpoint still gets cut off.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Input for a keyword-suggestion call: everything extractable about one
/// video without spending metadata quota.
#[derive(Debug, Clone, Serialize)]
pub struct SuggestionRequest {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordSuggestion {
    /// "keyword" or "content"; gates live cross-validation.
    #[serde(default)]
    pub video_type: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendClassification {
    /// "shorttail" or "longtail".
    #[serde(default)]
    pub keyword_type: Option<String>,
    /// Free-form trend label, passed through to output.
    #[serde(default)]
    pub trend_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelatedKeywordsResponse {
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Suggestion/classification service port. Separate from the metadata
/// provider because these calls are metered independently.
pub trait SuggestionApi: Send + Sync {
    fn suggest_keywords(
        &self,
        request: SuggestionRequest,
    ) -> impl Future<Output = Result<KeywordSuggestion, ProviderError>> + Send;

    fn classify_trend(
        &self,
        keyword: String,
    ) -> impl Future<Output = Result<TrendClassification, ProviderError>> + Send;

    fn related_keywords(
        &self,
        keyword: String,
    ) -> impl Future<Output = Result<Vec<String>, ProviderError>> + Send;
}

pub struct KeywordServiceClient {
    http: reqwest::Client,
    keyword_endpoint: Option<String>,
    trends_endpoint: Option<String>,
    related_endpoint: Option<String>,
}

impl KeywordServiceClient {
    pub fn new(
        keyword_endpoint: Option<String>,
        trends_endpoint: Option<String>,
        related_endpoint: Option<String>,
    ) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ProviderError::network(e.to_string()))?;
        Ok(Self {
            http,
            keyword_endpoint: keyword_endpoint.map(|e| e.trim_end_matches('/').to_string()),
            trends_endpoint: trends_endpoint.map(|e| e.trim_end_matches('/').to_string()),
            related_endpoint: related_endpoint.map(|e| e.trim_end_matches('/').to_string()),
        })
    }

    pub fn has_suggestions(&self) -> bool {
        self.keyword_endpoint.is_some()
    }

    pub fn has_trends(&self) -> bool {
        self.trends_endpoint.is_some()
    }

    async fn post_json<B: serde::Serialize, T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T, ProviderError> {
        let response = self
            .http
            .post(endpoint)
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::network(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::new(
                crate::core::error::ProviderErrorKind::Http,
                Some(status.as_u16()),
                format!("keyword service error: {}", text.chars().take(200).collect::<String>()),
            ));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| ProviderError::decode(e.to_string()))
    }

    fn endpoint(&self, value: &Option<String>, what: &str) -> Result<String, ProviderError> {
        value.clone().ok_or_else(|| {
            ProviderError::new(
                crate::core::error::ProviderErrorKind::Http,
                None,
                format!("{what} endpoint is not configured"),
            )
        })
    }
}

impl SuggestionApi for KeywordServiceClient {
    fn suggest_keywords(
        &self,
        request: SuggestionRequest,
    ) -> impl Future<Output = Result<KeywordSuggestion, ProviderError>> + Send {
        async move {
            let endpoint = self.endpoint(&self.keyword_endpoint, "keyword suggestion")?;
            self.post_json(&endpoint, &request).await
        }
    }

    fn classify_trend(
        &self,
        keyword: String,
    ) -> impl Future<Output = Result<TrendClassification, ProviderError>> + Send {
        async move {
            let endpoint = self.endpoint(&self.trends_endpoint, "trend classification")?;
            self.post_json(&endpoint, &serde_json::json!({ "keyword": keyword }))
                .await
        }
    }

    fn related_keywords(
        &self,
        keyword: String,
    ) -> impl Future<Output = Result<Vec<String>, ProviderError>> + Send {
        async move {
            let endpoint = self.endpoint(&self.related_endpoint, "related keywords")?;
            let body: RelatedKeywordsResponse = self
                .post_json(&endpoint, &serde_json::json!({ "keyword": keyword }))
                .await?;
            Ok(body.keywords)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_timeout_is_bounded() {
        assert!(REQUEST_TIMEOUT <= Duration::from_secs(20));
    }

    #[test]
    fn suggestion_response_parses() {
        let json = r#"{"videoType": "keyword", "keywords": ["budget headphones", "anc earbuds (rising)"]}"#;
        let parsed: KeywordSuggestion = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.video_type.as_deref(), Some("keyword"));
        assert_eq!(parsed.keywords.len(), 2);
    }

    #[test]
    fn classification_response_tolerates_missing_fields() {
        let parsed: TrendClassification = serde_json::from_str("{}").unwrap();
        assert!(parsed.keyword_type.is_none());
        assert!(parsed.trend_type.is_none());
        let full: TrendClassification =
            serde_json::from_str(r#"{"keywordType": "shorttail", "trendType": "rising"}"#).unwrap();
        assert_eq!(full.keyword_type.as_deref(), Some("shorttail"));
        assert_eq!(full.trend_type.as_deref(), Some("rising"));
    }

    #[test]
    fn request_omits_absent_transcript() {
        let request = SuggestionRequest {
            title: "t".into(),
            description: "d".into(),
            tags: vec![],
            transcript: None,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(!json.contains("transcript"));
    }

    #[test]
    fn unconfigured_endpoints_report_so() {
        let client = KeywordServiceClient::new(None, None, None).unwrap();
        assert!(!client.has_suggestions());
        assert!(!client.has_trends());
    }
}
