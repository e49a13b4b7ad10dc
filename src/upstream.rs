//! HTTP plumbing shared by the external source adapters.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use std::time::Duration;

use crate::config::UpstreamConfig;
use crate::error::UpstreamError;

static LEADING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("Invalid regex: LEADING_NUMBER"));

/// A client whose every request is bounded by `upstream.timeout_ms`.
pub fn build_client(config: &UpstreamConfig) -> anyhow::Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(config.timeout_ms))
        .build()?;
    Ok(client)
}

/// Joins the configured base URL and an endpoint path.
pub fn endpoint(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim().trim_end_matches('/'),
        path.trim().trim_start_matches('/')
    )
}

/// `GET url?params` and decode the body as JSON. Non-2xx is an error.
pub async fn get_json(
    client: &reqwest::Client,
    url: &str,
    params: &[(&str, String)],
) -> Result<Value, UpstreamError> {
    let response = client.get(url).query(params).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(UpstreamError::Status(status.as_u16()));
    }

    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| UpstreamError::Decode(e.to_string()))
}

/// First usable string among `keys`.
pub fn first_text(obj: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| text(obj.get(*k)))
}

/// First usable number among `keys`.
pub fn first_number(obj: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|k| number(obj.get(*k)))
}

/// A non-empty trimmed string. Numbers are rendered as text.
pub fn text(value: Option<&Value>) -> Option<String> {
    let s = match value? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!s.is_empty()).then_some(s)
}

/// A non-negative number from a JSON number or a numeric string such as
/// `"4.5"`, `"85%"` or `"12 ratings"`.
pub fn number(value: Option<&Value>) -> Option<f64> {
    let n = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            if s.trim_start().starts_with('-') {
                return None;
            }
            LEADING_NUMBER.find(s)?.as_str().parse().ok()?
        }
        _ => return None,
    };
    (n.is_finite() && n >= 0.0).then_some(n)
}
