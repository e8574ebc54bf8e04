//! HTTP client for the graph service.

use std::{collections::HashMap, time::Duration};

use reqwest::{Client, Response, Url};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use super::{GraphService, ServiceError};
use crate::{
    config::AppConfig,
    models::{LineInfo, PathSolution, RandomPair, ValidationOutcome},
};

/// JSON-over-HTTP client for the graph service.
#[derive(Debug, Clone)]
pub struct HttpGraphService {
    client: Client,
    base_url: Url,
}

impl HttpGraphService {
    /// Build a client rooted at `base_url` (e.g. `http://host/api`).
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ServiceError> {
        let base_url =
            Url::parse(base_url).map_err(|err| ServiceError::InvalidUrl(format!("{base_url}: {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ServiceError::InvalidUrl(base_url.to_string()));
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    /// Build a client from application configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, ServiceError> {
        Self::new(&config.api_base_url, config.request_timeout())
    }

    /// Endpoint URL for `segments`, each percent-encoded as one path segment.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ServiceError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ServiceError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<T, ServiceError> {
        debug!(%url, "GET");
        let response = self.client.get(url).query(query).send().await?;
        decode(response).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, ServiceError> {
        debug!(%url, "POST");
        let response = self.client.post(url).json(body).send().await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }
    let body = match response.text().await {
        Ok(body) => body,
        Err(err) => {
            debug!(?err, "failed to read error body");
            String::new()
        }
    };
    let detail = error_detail(&body);
    warn!(status = status.as_u16(), %detail, "graph service rejected request");
    Err(ServiceError::Status {
        status: status.as_u16(),
        detail,
    })
}

fn error_detail(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        detail: serde_json::Value,
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: serde_json::Value::String(text),
        }) => text,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) => body.trim().to_string(),
    }
}

#[derive(Debug, Serialize)]
struct LinesRequest<'a> {
    lines: &'a [String],
}

#[derive(Debug, Serialize)]
struct ReachableRequest<'a> {
    lines: &'a [String],
    start: &'a str,
}

#[derive(Debug, Serialize)]
struct EndpointsRequest<'a> {
    lines: &'a [String],
    start: &'a str,
    end: &'a str,
}

#[derive(Debug, Serialize)]
struct ValidateRequest<'a> {
    lines: &'a [String],
    start: &'a str,
    end: &'a str,
    user_path: &'a [String],
}

#[derive(Debug, Deserialize)]
struct StationsResponse {
    #[serde(default)]
    stations: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct MapResponse {
    #[serde(default)]
    lines: HashMap<String, LineInfo>,
}

impl GraphService for HttpGraphService {
    async fn lines(&self, city: &str) -> Result<Vec<String>, ServiceError> {
        let url = self.endpoint(&[city, "lines"])?;
        self.get_json(url, &[]).await
    }

    async fn line_stations(&self, city: &str, line: &str) -> Result<Vec<String>, ServiceError> {
        let url = self.endpoint(&[city, "lines", line, "stations"])?;
        self.get_json(url, &[]).await
    }

    async fn line_metadata(&self, city: &str) -> Result<HashMap<String, LineInfo>, ServiceError> {
        let url = self.endpoint(&[city, "map", "coordinates"])?;
        let map: MapResponse = self.get_json(url, &[]).await?;
        Ok(map.lines)
    }

    async fn stations_for(&self, city: &str, lines: &[String]) -> Result<Vec<String>, ServiceError> {
        let url = self.endpoint(&[city, "stations"])?;
        let response: StationsResponse = self.get_json(url, &[("lines", lines.join(","))]).await?;
        Ok(response.stations)
    }

    async fn reachable_from(
        &self,
        city: &str,
        lines: &[String],
        start: &str,
    ) -> Result<Vec<String>, ServiceError> {
        let url = self.endpoint(&[city, "game", "reachable-stations"])?;
        let response: StationsResponse = self
            .post_json(url, &ReachableRequest { lines, start })
            .await?;
        Ok(response.stations)
    }

    async fn random_pair(&self, city: &str, lines: &[String]) -> Result<RandomPair, ServiceError> {
        let url = self.endpoint(&[city, "game", "random-stations"])?;
        self.post_json(url, &LinesRequest { lines }).await
    }

    async fn shortest_path(
        &self,
        city: &str,
        lines: &[String],
        start: &str,
        end: &str,
    ) -> Result<PathSolution, ServiceError> {
        let url = self.endpoint(&[city, "game", "calculate-path"])?;
        self.post_json(url, &EndpointsRequest { lines, start, end })
            .await
    }

    async fn validate_path(
        &self,
        city: &str,
        lines: &[String],
        start: &str,
        end: &str,
        user_path: &[String],
    ) -> Result<ValidationOutcome, ServiceError> {
        let url = self.endpoint(&[city, "game", "validate-path"])?;
        self.post_json(
            url,
            &ValidateRequest {
                lines,
                start,
                end,
                user_path,
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> HttpGraphService {
        HttpGraphService::new("http://metro.test/api/", Duration::from_secs(1))
            .expect("valid test url")
    }

    #[test]
    fn endpoints_encode_city_and_line_segments() -> Result<(), ServiceError> {
        let service = client();
        let url = service.endpoint(&["sz", "lines", "1号线", "stations"])?;
        assert_eq!(
            url.as_str(),
            "http://metro.test/api/sz/lines/1%E5%8F%B7%E7%BA%BF/stations"
        );
        let url = service.endpoint(&["sh", "game", "validate-path"])?;
        assert_eq!(url.path(), "/api/sh/game/validate-path");
        Ok(())
    }

    #[test]
    fn rejects_non_http_base() {
        assert!(matches!(
            HttpGraphService::new("mailto:metro@example.com", Duration::from_secs(1)),
            Err(ServiceError::InvalidUrl(_))
        ));
        assert!(HttpGraphService::new("not a url", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn request_bodies_use_service_field_names() -> anyhow::Result<()> {
        let lines = vec!["1号线".to_string(), "2号线".to_string()];
        let path = vec!["A".to_string(), "C".to_string(), "B".to_string()];
        let body = serde_json::to_value(ValidateRequest {
            lines: &lines,
            start: "A",
            end: "B",
            user_path: &path,
        })?;
        assert_eq!(
            body,
            serde_json::json!({
                "lines": ["1号线", "2号线"],
                "start": "A",
                "end": "B",
                "user_path": ["A", "C", "B"],
            })
        );
        let body = serde_json::to_value(ReachableRequest {
            lines: &lines,
            start: "A",
        })?;
        assert_eq!(body["start"], "A");
        Ok(())
    }

    #[test]
    fn map_metadata_tolerates_missing_branches() -> anyhow::Result<()> {
        let map: MapResponse = serde_json::from_str(
            r##"{"lines": {
                "5号线": {"color": "#A349A4", "stations": ["A", "B"], "branch_stations": ["C"]},
                "机场线": {"stations": ["D"]}
            }}"##,
        )?;
        assert_eq!(map.lines["5号线"].branch_stations, vec!["C".to_string()]);
        assert!(map.lines["机场线"].branch_stations.is_empty());
        assert!(map.lines["机场线"].color.is_none());
        Ok(())
    }

    #[test]
    fn error_detail_prefers_detail_field() {
        assert_eq!(
            error_detail(r#"{"detail": "Stations are not reachable"}"#),
            "Stations are not reachable"
        );
        assert_eq!(error_detail("Bad Gateway\n"), "Bad Gateway");
    }

    #[test]
    fn unreadable_error_body_yields_empty_detail() {
        assert_eq!(error_detail(""), "");
        assert_eq!(error_detail("   \n"), "");
    }
}
