use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::upload::{parse_endpoint, ClientProfile};

pub const CONFIG_FILE: &str = "uploader.toml";
const DEFAULT_BUCKET: &str = "uploads";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing setting: {0}")]
    Missing(&'static str),
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("could not read {path}: {reason}")]
    File { path: String, reason: String },
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ClientSettings {
    pub id: String,
    pub label: Option<String>,
    pub webhook: Option<String>,
}

/// Raw settings as read from `uploader.toml` and the environment.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Settings {
    pub storage_url: Option<String>,
    pub storage_key: Option<String>,
    pub bucket: Option<String>,
    pub default_webhook: Option<String>,
    #[serde(default)]
    pub clients: Vec<ClientSettings>,
}

impl Settings {
    pub fn from_file(path: &Path) -> Result<Option<Self>, ConfigError> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ConfigError::File {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })
            }
        };
        toml::from_str(&raw)
            .map(Some)
            .map_err(|e| ConfigError::File {
                path: path.display().to_string(),
                reason: e.to_string(),
            })
    }

    /// Environment values win over the file. `lookup` is `std::env::var` outside tests.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let first = |names: &[&str]| names.iter().copied().find_map(|name| lookup(name));

        if let Some(v) = first(&["UPLOADER_STORAGE_URL", "SUPABASE_URL"]) {
            self.storage_url = Some(v);
        }
        if let Some(v) = first(&["UPLOADER_STORAGE_KEY", "SUPABASE_ANON_KEY"]) {
            self.storage_key = Some(v);
        }
        if let Some(v) = lookup("UPLOADER_BUCKET") {
            self.bucket = Some(v);
        }
        if let Some(v) = first(&["UPLOADER_WEBHOOK", "N8N_WEBHOOK"]) {
            self.default_webhook = Some(v);
        }

        if let Some(list) = lookup("UPLOADER_CLIENTS") {
            self.clients = list
                .split(',')
                .map(str::trim)
                .filter(|entry| !entry.is_empty())
                .map(|entry| match entry.split_once('=') {
                    Some((id, label)) => ClientSettings {
                        id: id.trim().to_string(),
                        label: Some(label.trim().to_string()),
                        webhook: None,
                    },
                    None => ClientSettings {
                        id: entry.to_string(),
                        label: None,
                        webhook: None,
                    },
                })
                .collect();
        }

        for client in &mut self.clients {
            let name = format!("UPLOADER_WEBHOOK_{}", client.id.to_uppercase().replace('-', "_"));
            if let Some(v) = lookup(&name) {
                client.webhook = Some(v);
            }
        }
    }
}

/// Validated configuration handed to the controller at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploaderConfig {
    pub storage_url: Url,
    pub storage_key: String,
    pub bucket: String,
    pub default_webhook: Url,
    pub clients: Vec<ClientProfile>,
}

impl UploaderConfig {
    pub fn from_settings(settings: Settings) -> Result<Self, ConfigError> {
        let storage_url = settings
            .storage_url
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("storage_url"))?;
        let storage_url = parse_endpoint(&storage_url).map_err(|reason| ConfigError::Invalid {
            field: "storage_url",
            reason,
        })?;

        let storage_key = settings
            .storage_key
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing("storage_key"))?;

        let bucket = settings
            .bucket
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_BUCKET.to_string());

        let default_webhook = settings
            .default_webhook
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("default_webhook"))?;
        let default_webhook =
            parse_endpoint(&default_webhook).map_err(|reason| ConfigError::Invalid {
                field: "default_webhook",
                reason,
            })?;

        let mut seen = HashSet::new();
        let mut clients = Vec::with_capacity(settings.clients.len());
        for client in settings.clients {
            let id = client.id.trim().to_string();
            if id.is_empty() {
                return Err(ConfigError::Invalid {
                    field: "clients",
                    reason: "client id must not be empty".into(),
                });
            }
            if !seen.insert(id.clone()) {
                return Err(ConfigError::Invalid {
                    field: "clients",
                    reason: format!("duplicate client id {}", id),
                });
            }
            let label = client
                .label
                .filter(|l| !l.trim().is_empty())
                .unwrap_or_else(|| id.to_uppercase());
            clients.push(ClientProfile {
                id,
                label,
                webhook_override: client.webhook,
            });
        }
        if clients.is_empty() {
            clients.push(ClientProfile::new("default", "Default"));
        }

        Ok(Self {
            storage_url,
            storage_key,
            bucket,
            default_webhook,
            clients,
        })
    }
}

pub fn load_config() -> Result<UploaderConfig, ConfigError> {
    let mut settings = Settings::from_file(Path::new(CONFIG_FILE))?.unwrap_or_default();
    settings.apply_env(|name| std::env::var(name).ok());
    UploaderConfig::from_settings(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    fn base_env() -> Vec<(&'static str, &'static str)> {
        vec![
            ("SUPABASE_URL", "https://abc.supabase.co"),
            ("SUPABASE_ANON_KEY", "anon"),
            ("N8N_WEBHOOK", "https://hooks.example.com/webhook/default"),
        ]
    }

    #[test]
    fn env_only_config_gets_defaults() {
        let mut settings = Settings::default();
        settings.apply_env(env(&base_env()));
        let config = UploaderConfig::from_settings(settings).expect("config");

        assert_eq!(config.bucket, "uploads");
        assert_eq!(config.storage_key, "anon");
        assert_eq!(config.clients, vec![ClientProfile::new("default", "Default")]);
    }

    #[test]
    fn clients_and_overrides_come_from_env() {
        let mut pairs = base_env();
        pairs.push(("UPLOADER_CLIENTS", "retail, north-east=North East ,"));
        pairs.push(("UPLOADER_WEBHOOK_NORTH_EAST", "https://hooks.example.com/ne"));
        let mut settings = Settings::default();
        settings.apply_env(env(&pairs));
        let config = UploaderConfig::from_settings(settings).expect("config");

        assert_eq!(
            config.clients,
            vec![
                ClientProfile::new("retail", "RETAIL"),
                ClientProfile::new("north-east", "North East")
                    .with_webhook("https://hooks.example.com/ne"),
            ]
        );
    }

    #[test]
    fn primary_names_win_over_aliases() {
        let mut pairs = base_env();
        pairs.push(("UPLOADER_WEBHOOK", "https://primary.example.com/hook"));
        let mut settings = Settings::default();
        settings.apply_env(env(&pairs));
        assert_eq!(
            settings.default_webhook.as_deref(),
            Some("https://primary.example.com/hook")
        );
    }

    #[test]
    fn file_settings_parse_and_env_overrides() {
        let raw = r#"
            storage_url = "https://file.supabase.co"
            storage_key = "from-file"
            bucket = "sheets"
            default_webhook = "https://app.n8n.cl0ud/webhook/x"

            [[clients]]
            id = "retail"

            [[clients]]
            id = "wholesale"
            label = "Wholesale"
            webhook = "not a url"
        "#;
        let mut settings: Settings = toml::from_str(raw).expect("toml");
        settings.apply_env(env(&[("UPLOADER_STORAGE_KEY", "from-env")]));
        let config = UploaderConfig::from_settings(settings).expect("config");

        assert_eq!(config.storage_key, "from-env");
        assert_eq!(config.bucket, "sheets");
        assert_eq!(config.default_webhook.as_str(), "https://app.n8n.cloud/webhook/x");
        assert_eq!(config.clients[1].webhook_override.as_deref(), Some("not a url"));
    }

    #[test]
    fn missing_and_invalid_values_are_rejected() {
        let err = UploaderConfig::from_settings(Settings::default()).unwrap_err();
        assert_eq!(err, ConfigError::Missing("storage_url"));

        let mut settings = Settings::default();
        settings.apply_env(env(&base_env()));
        settings.storage_key = Some("  ".into());
        assert_eq!(
            UploaderConfig::from_settings(settings).unwrap_err(),
            ConfigError::Missing("storage_key")
        );

        let mut settings = Settings::default();
        settings.apply_env(env(&base_env()));
        settings.default_webhook = Some("hooks.example.com".into());
        assert!(matches!(
            UploaderConfig::from_settings(settings),
            Err(ConfigError::Invalid { field: "default_webhook", .. })
        ));
    }

    #[test]
    fn duplicate_client_ids_are_rejected() {
        let mut pairs = base_env();
        pairs.push(("UPLOADER_CLIENTS", "retail,retail"));
        let mut settings = Settings::default();
        settings.apply_env(env(&pairs));
        assert!(matches!(
            UploaderConfig::from_settings(settings),
            Err(ConfigError::Invalid { field: "clients", .. })
        ));
    }

    #[test]
    fn missing_file_is_not_an_error() {
        assert_eq!(
            Settings::from_file(Path::new("/nonexistent/uploader.toml")),
            Ok(None)
        );
    }

    #[test]
    fn unreadable_file_is_reported() {
        let dir = tempfile::tempdir().expect("temp dir");

        let path = dir.path().join("binary.toml");
        fs::write(&path, [0xff, 0xfe, 0x00, 0x80]).expect("write");
        assert!(matches!(
            Settings::from_file(&path),
            Err(ConfigError::File { .. })
        ));

        let path = dir.path().join(CONFIG_FILE);
        fs::create_dir(&path).expect("dir in place of file");
        assert!(matches!(
            Settings::from_file(&path),
            Err(ConfigError::File { .. })
        ));
    }
}
