use url::Url;

use super::error::UploadError;

const CANONICAL_AUTOMATION_HOST: &str = "app.n8n.cloud";

/// Hostnames seen in pasted webhook addresses with one look-alike character swapped.
const AUTOMATION_HOST_MISSPELLINGS: [&str; 4] = [
    "app.n8n.cl0ud",
    "app.n8n.c1oud",
    "app.n8n.cioud",
    "app.nbn.cloud",
];

/// A routing target the user can pick in the client dropdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientProfile {
    pub id: String,
    pub label: String,
    pub webhook_override: Option<String>,
}

impl ClientProfile {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            webhook_override: None,
        }
    }

    pub fn with_webhook(mut self, webhook: impl Into<String>) -> Self {
        self.webhook_override = Some(webhook.into());
        self
    }
}

/// Picks the profile's override when set, otherwise the global default.
pub fn resolve_destination(profile: &ClientProfile, default: &Url) -> Result<Url, UploadError> {
    match profile
        .webhook_override
        .as_deref()
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
    {
        Some(raw) => parse_endpoint(raw).map_err(|reason| UploadError::InvalidDestination {
            client: profile.id.clone(),
            reason,
        }),
        None => Ok(default.clone()),
    }
}

/// Parses an absolute http(s) URL, fixing known host misspellings first.
pub fn parse_endpoint(raw: &str) -> Result<Url, String> {
    let mut url = Url::parse(raw.trim()).map_err(|e| format!("{raw}: {e}"))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("{raw}: scheme must be http or https"));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(format!("{raw}: missing host"));
    }

    if let Some(host) = url.host_str().map(str::to_string) {
        if let Some(fixed) = normalize_hostname(&host) {
            tracing::info!(from = %host, to = fixed, "corrected webhook hostname");
            url.set_host(Some(fixed))
                .map_err(|e| format!("{raw}: {e}"))?;
        }
    }

    Ok(url)
}

pub fn normalize_hostname(host: &str) -> Option<&'static str> {
    let host = host.to_ascii_lowercase();
    AUTOMATION_HOST_MISSPELLINGS
        .contains(&host.as_str())
        .then_some(CANONICAL_AUTOMATION_HOST)
}
