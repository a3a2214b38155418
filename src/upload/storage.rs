use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use url::Url;

use super::error::StorageError;

/// Object storage the uploaded file lands in.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(
        &self,
        key: &str,
        bytes: &[u8],
        content_type: &str,
        overwrite: bool,
    ) -> Result<(), StorageError>;

    fn public_url_for(&self, key: &str) -> Result<Url, StorageError>;
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StorageErrorBody {
    status_code: Option<String>,
    error: Option<String>,
    message: Option<String>,
}

/// Supabase Storage over its REST API.
#[derive(Clone)]
pub struct SupabaseStorage {
    client: reqwest::Client,
    base_url: Url,
    bucket: String,
    api_key: String,
}

impl SupabaseStorage {
    pub fn new(base_url: Url, bucket: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            bucket: bucket.into(),
            api_key: api_key.into(),
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, StorageError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let raw = format!("{}/storage/v1/{}", base, path);
        Url::parse(&raw).map_err(|e| StorageError::new(None, format!("invalid storage URL: {}", e)))
    }

    fn headers(&self, content_type: &str, overwrite: bool) -> Result<HeaderMap, StorageError> {
        let invalid = |e: reqwest::header::InvalidHeaderValue| {
            StorageError::new(None, format!("invalid header value: {}", e))
        };

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key)).map_err(invalid)?,
        );
        headers.insert(
            HeaderName::from_static("apikey"),
            HeaderValue::from_str(&self.api_key).map_err(invalid)?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_str(content_type).map_err(invalid)?);
        headers.insert(
            HeaderName::from_static("x-upsert"),
            HeaderValue::from_static(if overwrite { "true" } else { "false" }),
        );
        Ok(headers)
    }
}

#[async_trait]
impl BlobStore for SupabaseStorage {
    async fn put(
        &self,
        key: &str,
        bytes: &[u8],
        content_type: &str,
        overwrite: bool,
    ) -> Result<(), StorageError> {
        let url = self.endpoint(&format!("object/{}/{}", self.bucket, key))?;
        tracing::debug!(%url, size = bytes.len(), "uploading object");

        let response = self
            .client
            .post(url)
            .headers(self.headers(content_type, overwrite)?)
            .body(bytes.to_vec())
            .send()
            .await
            .map_err(|e| StorageError::new(None, format!("Failed to send request: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(parse_error_body(status.as_u16(), &body))
    }

    fn public_url_for(&self, key: &str) -> Result<Url, StorageError> {
        self.endpoint(&format!("object/public/{}/{}", self.bucket, key))
    }
}

/// The storage API reports the real status (e.g. 409) inside the JSON body.
fn parse_error_body(http_status: u16, body: &str) -> StorageError {
    match serde_json::from_str::<StorageErrorBody>(body) {
        Ok(parsed) => {
            let status = parsed
                .status_code
                .and_then(|code| code.parse::<u16>().ok())
                .unwrap_or(http_status);
            let message = match (parsed.error, parsed.message) {
                (Some(error), Some(message)) => format!("{}: {}", error, message),
                (None, Some(message)) => message,
                (Some(error), None) => error,
                (None, None) => format!("storage responded with HTTP {}", http_status),
            };
            StorageError::new(Some(status), message)
        }
        Err(_) if body.trim().is_empty() => {
            StorageError::new(Some(http_status), format!("storage responded with HTTP {}", http_status))
        }
        Err(_) => StorageError::new(Some(http_status), body.trim()),
    }
}

/// `{client}/{unix-millis}-{random}.{ext}`; the extension keeps the original, lowercased.
pub fn storage_key(client: &str, file_name: &str) -> String {
    let random = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{}/{}-{}.{}",
        client_slug(client),
        Utc::now().timestamp_millis(),
        &random[..12],
        file_extension(file_name)
    )
}

fn client_slug(client: &str) -> String {
    let slug: String = client
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    if slug.is_empty() {
        "unassigned".to_string()
    } else {
        slug
    }
}

fn file_extension(file_name: &str) -> String {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| "bin".to_string())
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[test]
    fn key_is_namespaced_and_keeps_extension() {
        let key = storage_key("retail", "Invoice.XLSX");
        let (client, rest) = key.split_once('/').unwrap();
        assert_eq!(client, "retail");
        assert!(rest.ends_with(".xlsx"));

        let (stamp, random) = rest.trim_end_matches(".xlsx").split_once('-').unwrap();
        assert!(stamp.parse::<i64>().is_ok());
        assert_eq!(random.len(), 12);
    }

    #[test]
    fn keys_differ_between_uploads() {
        assert_ne!(storage_key("retail", "a.csv"), storage_key("retail", "a.csv"));
    }

    #[test]
    fn missing_extension_defaults_to_bin() {
        assert_eq!(file_extension("README"), "bin");
        assert_eq!(file_extension("trailing."), "bin");
        assert_eq!(file_extension("data.tar.gz"), "gz");
        assert_eq!(client_slug("Retail Group/EU"), "retailgroupeu");
        assert_eq!(client_slug("../"), "unassigned");
    }

    #[test]
    fn public_url_points_at_public_object_path() {
        let storage = SupabaseStorage::new(
            Url::parse("https://abc.supabase.co/").unwrap(),
            "uploads",
            "anon",
        );
        let url = storage.public_url_for("retail/1-abc.csv").unwrap();
        assert_eq!(
            url.as_str(),
            "https://abc.supabase.co/storage/v1/object/public/uploads/retail/1-abc.csv"
        );
    }

    #[test]
    fn error_body_status_code_takes_precedence() {
        let err = parse_error_body(
            400,
            r#"{"statusCode":"409","error":"Duplicate","message":"The resource already exists"}"#,
        );
        assert_eq!(err.status, Some(409));
        assert!(err.is_duplicate());

        let err = parse_error_body(502, "<html>bad gateway</html>");
        assert_eq!(err.status, Some(502));
        assert!(!err.is_duplicate());
    }

    #[tokio::test]
    async fn put_sends_object_without_upsert() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/storage/v1/object/uploads/retail/1-abc.csv"))
            .and(header("x-upsert", "false"))
            .and(header("apikey", "anon-key"))
            .and(header("authorization", "Bearer anon-key"))
            .and(header("content-type", "text/csv"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
            .expect(1)
            .mount(&server)
            .await;
        let storage = SupabaseStorage::new(Url::parse(&server.uri()).unwrap(), "uploads", "anon-key");

        storage
            .put("retail/1-abc.csv", b"a,b\n", "text/csv", false)
            .await
            .expect("put");

        let requests = server.received_requests().await.expect("recording enabled");
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].body, b"a,b\n");
    }

    #[tokio::test]
    async fn put_reports_duplicate_from_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/storage/v1/object/uploads/retail/1-abc.csv"))
            .respond_with(ResponseTemplate::new(400).set_body_raw(
                r#"{"statusCode":"409","error":"Duplicate","message":"The resource already exists"}"#,
                "application/json",
            ))
            .mount(&server)
            .await;
        let storage = SupabaseStorage::new(Url::parse(&server.uri()).unwrap(), "uploads", "anon-key");

        let err = storage
            .put("retail/1-abc.csv", b"x", "text/csv", false)
            .await
            .unwrap_err();
        assert_eq!(err.status, Some(409));
        assert!(err.is_duplicate());
    }
}
