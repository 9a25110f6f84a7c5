use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub stream_timeout: Option<u64>,
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Reduce whatever the user configured to the site root the `/api/*`
/// routes hang off.
pub fn normalize_base_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    let trimmed = trimmed
        .strip_suffix("/api/chat")
        .or_else(|| trimmed.strip_suffix("/api"))
        .unwrap_or(trimmed);
    trimmed.trim_end_matches('/').to_string()
}
