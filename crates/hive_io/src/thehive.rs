use std::time::Duration;

use hive_core::domain::RawCaseRecord;
use hive_core::error::AppError;
use hive_core::ports::CaseSource;
use serde_json::{json, Value};
use tracing::info;

const SEARCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Read-only TheHive case search client.
#[derive(Debug, Clone)]
pub struct TheHiveClient {
    base_url: String,
    api_key: Option<String>,
}

impl TheHiveClient {
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self, AppError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();

        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(AppError::new(
                "HIVE_URL_INVALID",
                "TheHive base URL must be http(s)",
            )
            .with_details(format!("base_url={base_url}")));
        }

        Ok(Self {
            base_url,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn search_url(&self) -> String {
        format!("{}/api/case/_search?range=all", self.base_url)
    }
}

/// Decode a `_search` response body: a JSON array of case objects.
pub fn parse_case_list(body: Value) -> Result<Vec<RawCaseRecord>, AppError> {
    let Value::Array(items) = body else {
        return Err(AppError::new(
            "HIVE_RESPONSE_INVALID",
            "Case search response is not a JSON array",
        ));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(fields) => Ok(RawCaseRecord::new(fields)),
            other => Err(AppError::new(
                "HIVE_RESPONSE_INVALID",
                "Case search response contains a non-object entry",
            )
            .with_details(format!("index={i}; value={other}"))),
        })
        .collect()
}

impl CaseSource for TheHiveClient {
    fn fetch_cases(&self) -> Result<Vec<RawCaseRecord>, AppError> {
        let url = self.search_url();
        let mut req = ureq::post(&url).timeout(SEARCH_TIMEOUT);
        if let Some(key) = &self.api_key {
            req = req.set("Authorization", &format!("Bearer {key}"));
        }

        let resp = req.send_json(json!({ "query": {} }));

        match resp {
            Ok(r) if r.status() == 200 => {
                let body: Value = r.into_json().map_err(|e| {
                    AppError::new("HIVE_RESPONSE_INVALID", "Failed to decode case search response")
                        .with_details(e.to_string())
                })?;
                let cases = parse_case_list(body)?;
                info!(count = cases.len(), base_url = %self.base_url, "case search complete");
                Ok(cases)
            }
            Ok(r) => Err(
                AppError::new("HIVE_REQUEST_FAILED", "Case search request failed")
                    .with_details(format!("status={}", r.status())),
            ),
            Err(ureq::Error::Status(code, _)) => Err(
                AppError::new("HIVE_REQUEST_FAILED", "Case search request failed")
                    .with_details(format!("status={code}")),
            ),
            Err(e) => Err(AppError::new(
                "HIVE_REQUEST_FAILED",
                "Failed to reach TheHive",
            )
            .with_details(e.to_string())
            .with_retryable(true)),
        }
    }
}
