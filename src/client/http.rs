use super::ConsoleBackend;
use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::models::{
    DetectionSample, Event, EventFilters, RecordingCatalog, RecordingMedia, SampleFilters,
};
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::header::{CONTENT_TYPE, COOKIE, ETAG, IF_NONE_MATCH};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use url::Url;

/// Last body seen for a URL together with its validator
struct CachedBody {
    etag: String,
    body: Vec<u8>,
}

/// HTTP client for the edge service REST API
pub struct HttpBackend {
    http: Client,
    base_url: Url,
    session_cookie: Option<String>,
    operator_name: String,
    cache: Mutex<HashMap<String, CachedBody>>,
}

impl HttpBackend {
    /// Create a new client from the API configuration
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: Url::parse(&config.base_url)?,
            session_cookie: config.session_cookie.clone(),
            operator_name: config.operator_name.clone(),
            cache: Mutex::new(HashMap::new()),
        })
    }

    /// Build an endpoint URL below the base URL, percent-encoding each segment
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("Base URL cannot have paths: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.session_cookie {
            Some(cookie) => builder.header(COOKIE, cookie.as_str()),
            None => builder,
        }
    }

    /// GET a JSON document, reusing the remembered body when the service answers 304
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let key = url.to_string();
        let known_etag = self
            .cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&key)
            .map(|cached| cached.etag.clone());

        let mut request = self.request(Method::GET, url);
        if let Some(etag) = &known_etag {
            request = request.header(IF_NONE_MATCH, etag.as_str());
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::NOT_MODIFIED {
            let cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
            return match cache.get(&key) {
                Some(cached) => {
                    debug!("Reusing cached body for {}", key);
                    Ok(serde_json::from_slice(&cached.body)?)
                }
                None => Err(Error::Server {
                    status: status.as_u16(),
                    message: format!("Not modified without a cached body: {}", key),
                }),
            };
        }

        let response = check_status(response, "Request failed").await?;
        let etag = response
            .headers()
            .get(ETAG)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?.to_vec();
        let value = serde_json::from_slice(&body)?;

        if let Some(etag) = etag {
            self.cache
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .insert(key, CachedBody { etag, body });
        }

        Ok(value)
    }
}

/// Turn a non-success response into the matching error class
async fn check_status(response: Response, context: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let detail = response.text().await.unwrap_or_default();
    let detail = detail.trim();
    let message = if detail.is_empty() {
        context.to_string()
    } else {
        format!("{}: {}", context, detail.chars().take(200).collect::<String>())
    };

    Err(Error::from_status(status.as_u16(), message))
}

#[async_trait]
impl ConsoleBackend for HttpBackend {
    async fn fetch_events(&self, filters: &EventFilters) -> Result<Vec<Event>> {
        let mut url = self.endpoint(&["events"])?;
        url.query_pairs_mut().extend_pairs(filters.query_pairs());
        self.get_json(url).await
    }

    async fn fetch_detection_samples(&self, filters: &SampleFilters) -> Result<Vec<DetectionSample>> {
        let mut url = self.endpoint(&["get_data"])?;
        url.query_pairs_mut().extend_pairs(filters.query_pairs());
        self.get_json(url).await
    }

    async fn fetch_recording_catalog(&self) -> Result<RecordingCatalog> {
        let url = self.endpoint(&["recordings"])?;
        match self.get_json::<RecordingCatalog>(url).await {
            Err(Error::Forbidden(message)) => {
                warn!("Recording catalog forbidden: {}", message);
                Ok(RecordingCatalog::forbidden())
            }
            other => other,
        }
    }

    async fn fetch_recording_media(
        &self,
        name: &str,
        prefer_transcoded: bool,
    ) -> Result<RecordingMedia> {
        let mut url = self.endpoint(&["recordings", name, "play"])?;
        if prefer_transcoded {
            url.query_pairs_mut().append_pair("format", "mp4");
        }

        debug!("Fetching recording media {}", url);
        let response = self.request(Method::GET, url).send().await?;
        let response = match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(Error::from_status(
                    response.status().as_u16(),
                    "Sign in required to play recordings.",
                ))
            }
            StatusCode::NOT_FOUND => {
                return Err(Error::NotFound(format!("Recording not found: {}", name)))
            }
            _ => check_status(response, "Playback failed").await?,
        };

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = response.bytes().await?.to_vec();

        Ok(RecordingMedia {
            transcoded: content_type.contains("mp4"),
            content_type,
            bytes,
        })
    }

    async fn acknowledge_event(&self, id: i64) -> Result<()> {
        let id = id.to_string();
        let url = self.endpoint(&["events", id.as_str(), "acknowledge"])?;
        let response = self
            .request(Method::POST, url)
            .json(&serde_json::json!({ "user": self.operator_name }))
            .send()
            .await?;
        check_status(response, "Failed to acknowledge").await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(base_url: &str) -> HttpBackend {
        let config = ApiConfig {
            base_url: base_url.to_string(),
            ..ApiConfig::default()
        };
        HttpBackend::new(&config).unwrap()
    }

    #[test]
    fn endpoint_keeps_base_path_and_encodes_segments() {
        let client = backend("http://edge.local:5000/api/");
        let url = client
            .endpoint(&["recordings", "recording 1.avi", "play"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://edge.local:5000/api/recordings/recording%201.avi/play"
        );
    }

    #[test]
    fn rejects_unusable_base_url() {
        let config = ApiConfig {
            base_url: "not a url".to_string(),
            ..ApiConfig::default()
        };
        assert!(matches!(HttpBackend::new(&config), Err(Error::Config(_))));
    }
}
