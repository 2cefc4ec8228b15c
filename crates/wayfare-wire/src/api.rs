//! Plain REST endpoints of the travel service
//!
//! These sit beside the streaming agent endpoint: listing and booking flights
//! and hotels, and the non-streaming agent calls.

use crate::error::{Error, Result};
use serde_json::Value;

/// Default base URL of a local travel service
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Client for the travel service REST API
#[derive(Debug, Clone)]
pub struct TravelApi {
    client: reqwest::Client,
    base_url: String,
}

impl TravelApi {
    /// Create a client rooted at `base_url` (no trailing slash needed)
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Reuse an existing reqwest client
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// The base URL requests are resolved against
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /api/`
    pub async fn root(&self) -> Result<Value> {
        self.get("/api/").await
    }

    /// `GET /api/flights`
    pub async fn flights(&self) -> Result<Value> {
        self.get("/api/flights").await
    }

    /// `GET /api/hotels`
    pub async fn hotels(&self) -> Result<Value> {
        self.get("/api/hotels").await
    }

    /// `POST /api/book-flight`
    pub async fn book_flight(&self, from_airport: &str, to_airport: &str) -> Result<Value> {
        self.post(
            "/api/book-flight",
            &[("from_airport", from_airport), ("to_airport", to_airport)],
        )
        .await
    }

    /// `POST /api/book-hotel`
    pub async fn book_hotel(&self, hotel_name: &str) -> Result<Value> {
        self.post("/api/book-hotel", &[("hotel_name", hotel_name)])
            .await
    }

    /// `POST /api/agent`: one-shot, non-streaming agent call
    pub async fn agent(&self, query: &str) -> Result<Value> {
        self.post("/api/agent", &[("query", query)]).await
    }

    /// `POST /api/agent/vibe`: one-shot call to the travel agent team
    pub async fn vibe(&self, query: &str) -> Result<Value> {
        self.post("/api/agent/vibe", &[("query", query)]).await
    }

    /// Build the absolute URL for an API path
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, path: &str) -> Result<Value> {
        let url = self.url(path);
        tracing::debug!("GET {}", url);
        let response = self.client.get(&url).send().await?;
        read_json(response).await
    }

    async fn post(&self, path: &str, query: &[(&str, &str)]) -> Result<Value> {
        let url = self.url(path);
        tracing::debug!("POST {}", url);
        let response = self.client.post(&url).query(query).send().await?;
        read_json(response).await
    }
}

async fn read_json(response: reqwest::Response) -> Result<Value> {
    let status = response.status();
    let text = response.text().await?;

    if status.as_u16() == 422 {
        return Err(Error::Validation(validation_detail(&text)));
    }
    if !status.is_success() {
        return Err(Error::status(status.as_u16(), text));
    }
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&text)
        .map_err(|e| Error::UnexpectedResponse(format!("{} (body: {})", e, text)))
}

/// Flatten a FastAPI-style `{"detail": [{"loc": [...], "msg": ...}]}` body
fn validation_detail(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return body.to_string();
    };
    match value.get("detail") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                let loc = item
                    .get("loc")
                    .and_then(Value::as_array)
                    .map(|parts| {
                        parts
                            .iter()
                            .map(|p| match p {
                                Value::String(s) => s.clone(),
                                other => other.to_string(),
                            })
                            .collect::<Vec<_>>()
                            .join(".")
                    })
                    .unwrap_or_default();
                let msg = item.get("msg").and_then(Value::as_str).unwrap_or("invalid");
                if loc.is_empty() {
                    msg.to_string()
                } else {
                    format!("{}: {}", loc, msg)
                }
            })
            .collect::<Vec<_>>()
            .join("; "),
        _ => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slash() {
        let api = TravelApi::new("http://127.0.0.1:8000/");
        assert_eq!(api.base_url(), "http://127.0.0.1:8000");
        assert_eq!(api.url("/api/hotels"), "http://127.0.0.1:8000/api/hotels");
    }

    #[test]
    fn test_validation_detail_list() {
        let body = r#"{"detail":[{"loc":["query","hotel_name"],"msg":"field required","type":"value_error.missing"}]}"#;
        assert_eq!(validation_detail(body), "query.hotel_name: field required");
    }

    #[test]
    fn test_validation_detail_string_and_garbage() {
        assert_eq!(validation_detail(r#"{"detail":"bad airport"}"#), "bad airport");
        assert_eq!(validation_detail("oops"), "oops");
    }
}
