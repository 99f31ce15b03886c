// src/api/client.rs
//! HTTP client for the Twitter REST and streaming APIs.
//!
//! A thin wrapper around reqwest: it builds endpoint URLs, encodes
//! parameters, authenticates, and maps non-success responses to
//! [`TwitterError::Api`]. It never retries and never inspects payloads.

use super::oauth::{percent_encode, OAuthSigner};
use super::{flatten_parameters, stream, TweetStream, TwitterApi};
use crate::config::ApiSettings;
use crate::constants::REST_REQUEST_TIMEOUT_SECS;
use crate::error::TwitterError;
use crate::types::{ApiPath, BaseUrl, RequestMethod};
use reqwest::{header, Client, RequestBuilder, Response};
use serde_json::{Map, Value};
use std::time::Duration;

/// Stream endpoints that take their parameters as a POST form body.
const POST_STREAM_PATHS: &[&str] = &["statuses/filter"];

/// Authenticated Twitter API client.
pub struct TwitterHttpClient {
    rest: Client,
    streaming: Client,
    rest_base_url: BaseUrl,
    stream_base_url: BaseUrl,
    signer: Option<OAuthSigner>,
    bearer_token: Option<String>,
}

impl TwitterHttpClient {
    /// Creates a client from resolved API settings.
    ///
    /// User-context OAuth 1.0a is preferred when all four secrets are set;
    /// otherwise the bearer token is used for app-only requests.
    pub fn new(settings: &ApiSettings) -> Result<Self, TwitterError> {
        let user_agent = format!("twitter2mongodb/{}", env!("CARGO_PKG_VERSION"));
        let rest = Client::builder()
            .timeout(Duration::from_secs(REST_REQUEST_TIMEOUT_SECS))
            .user_agent(user_agent.clone())
            .build()?;
        let streaming = Client::builder().user_agent(user_agent).build()?;

        Ok(Self {
            rest,
            streaming,
            rest_base_url: settings.rest_base_url.clone(),
            stream_base_url: settings.stream_base_url.clone(),
            signer: OAuthSigner::from_credentials(&settings.credentials),
            bearer_token: settings.credentials.bearer_token().map(str::to_string),
        })
    }

    /// Adds the `Authorization` header for a request to `url` with `params`.
    fn authorize(
        &self,
        builder: RequestBuilder,
        method: &str,
        url: &str,
        params: &[(String, String)],
    ) -> Result<RequestBuilder, TwitterError> {
        let value = if let Some(signer) = &self.signer {
            signer.sign(method, url, params)?
        } else if let Some(token) = &self.bearer_token {
            format!("Bearer {}", token)
        } else {
            return Err(TwitterError::Config(
                "no credentials: set the four OAuth 1.0a secrets or a bearer token".to_string(),
            ));
        };
        Ok(builder.header(header::AUTHORIZATION, value))
    }

    /// Builds an authenticated request with parameters in the query string.
    fn with_query(
        &self,
        client: &Client,
        method: reqwest::Method,
        url: &str,
        params: &[(String, String)],
    ) -> Result<RequestBuilder, TwitterError> {
        let full_url = if params.is_empty() {
            url.to_string()
        } else {
            format!("{}?{}", url, encode_pairs(params))
        };
        log::debug!("{} {}", method, full_url);
        let builder = client.request(method.clone(), full_url);
        self.authorize(builder, method.as_str(), url, params)
    }

    /// Builds an authenticated request with parameters as a form body.
    fn with_form(
        &self,
        client: &Client,
        url: &str,
        params: &[(String, String)],
    ) -> Result<RequestBuilder, TwitterError> {
        log::debug!("POST {}", url);
        let builder = client
            .post(url)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(encode_pairs(params));
        self.authorize(builder, "POST", url, params)
    }
}

#[async_trait::async_trait]
impl TwitterApi for TwitterHttpClient {
    async fn request(
        &self,
        method: RequestMethod,
        path: &ApiPath,
        params: &Map<String, Value>,
    ) -> Result<Value, TwitterError> {
        let url = self.rest_base_url.endpoint(path);
        let pairs = flatten_parameters(params);

        let builder = match method {
            RequestMethod::Get => self.with_query(&self.rest, reqwest::Method::GET, &url, &pairs)?,
            RequestMethod::Delete => {
                self.with_query(&self.rest, reqwest::Method::DELETE, &url, &pairs)?
            }
            RequestMethod::Post => self.with_form(&self.rest, &url, &pairs)?,
            RequestMethod::Stream => {
                return Err(TwitterError::Config(
                    "streaming endpoints must be opened with stream()".to_string(),
                ))
            }
        };

        let response = ensure_success(builder.send().await?).await?;
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    async fn stream(
        &self,
        path: &ApiPath,
        params: &Map<String, Value>,
    ) -> Result<TweetStream, TwitterError> {
        let url = self.stream_base_url.endpoint(path);
        let pairs = flatten_parameters(params);

        let builder = if POST_STREAM_PATHS.contains(&path.as_str()) {
            self.with_form(&self.streaming, &url, &pairs)?
        } else {
            self.with_query(&self.streaming, reqwest::Method::GET, &url, &pairs)?
        };

        log::info!("Opening Twitter stream {}", path);
        let response = ensure_success(builder.send().await?).await?;
        Ok(stream::spawn_reader(response))
    }
}

/// Encodes parameter pairs with OAuth percent-encoding (`%20`, never `+`).
pub fn encode_pairs(params: &[(String, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Converts a non-success response into [`TwitterError::Api`].
async fn ensure_success(response: Response) -> Result<Response, TwitterError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(TwitterError::Api {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

/// Extracts the human-readable message from a Twitter error body.
///
/// Handles `{"errors":[{"code":..,"message":..}]}`, `{"error":".."}` and
/// `{"detail":".."}`, and falls back to the raw body.
pub fn error_message(body: &str) -> String {
    let Ok(json) = serde_json::from_str::<Value>(body) else {
        return body.trim().to_string();
    };
    json.get("errors")
        .and_then(|errors| errors.get(0))
        .and_then(|first| first.get("message"))
        .or_else(|| json.get("error"))
        .or_else(|| json.get("detail"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| body.trim().to_string())
}
