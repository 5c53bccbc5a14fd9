//! Configuration types, built from environment variables.

use std::path::PathBuf;

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::llm::{LlmBackend, LlmConfig};

/// Default bound on redraft attempts after the first draft.
pub const DEFAULT_MAX_REDRAFT_TRIES: u32 = 2;

/// Default base URL of the mailbox REST API.
pub const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.microsoft.com/v1.0";

/// How the service authenticates against the mailbox API.
#[derive(Debug, Clone)]
pub enum GraphAuth {
    /// Personal account: a bearer token obtained out of band.
    Delegated { access_token: SecretString },
    /// Organisation account: OAuth2 client credentials.
    Corporate {
        client_id: String,
        client_secret: SecretString,
        tenant_id: String,
    },
}

/// Mailbox API configuration.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    pub base_url: String,
    pub auth: GraphAuth,
    /// Path segment addressing the mailbox: `me` or `users/{email}`.
    pub user_id: String,
}

/// Drafting workflow configuration.
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// Redrafts allowed after the first attempt. Total attempts is this plus one.
    pub max_redraft_tries: u32,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_redraft_tries: DEFAULT_MAX_REDRAFT_TRIES,
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub log_dir: PathBuf,
}

/// Full service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub graph: GraphConfig,
    pub workflow: WorkflowConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    /// Build config from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Ok(Self {
            llm: llm_config(&get)?,
            graph: graph_config(&get)?,
            workflow: WorkflowConfig {
                max_redraft_tries: parse_or(&get, "MAX_REDRAFT_TRIES", DEFAULT_MAX_REDRAFT_TRIES)?,
            },
            server: ServerConfig {
                port: parse_or(&get, "PORT", 8080)?,
                log_dir: get("LOG_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("logs")),
            },
        })
    }
}

fn llm_config(get: &impl Fn(&str) -> Option<String>) -> Result<LlmConfig, ConfigError> {
    let backend_name = get("LLM_BACKEND").map(|b| b.to_lowercase());
    let backend = match backend_name.as_deref() {
        None | Some("gemini") => LlmBackend::Gemini,
        Some("openai") => LlmBackend::OpenAi,
        Some(other) => {
            return Err(ConfigError::InvalidValue {
                key: "LLM_BACKEND".into(),
                message: format!("unknown backend '{other}' (expected gemini or openai)"),
            });
        }
    };

    let api_key = get("LLM_API_KEY")
        .or_else(|| get("GOOGLE_AI_STUDIO_API_KEY"))
        .ok_or_else(|| ConfigError::MissingRequired {
            key: "LLM_API_KEY".into(),
            hint: "Set LLM_API_KEY (or GOOGLE_AI_STUDIO_API_KEY for Gemini).".into(),
        })?;

    let model = get("LLM_MODEL")
        .or_else(|| get("GEMINI_MODEL_NAME"))
        .ok_or_else(|| ConfigError::MissingRequired {
            key: "LLM_MODEL".into(),
            hint: "Set LLM_MODEL (or GEMINI_MODEL_NAME), e.g. gemini-2.0-flash.".into(),
        })?;

    Ok(LlmConfig {
        backend,
        api_key: SecretString::from(api_key),
        model,
    })
}

fn graph_config(get: &impl Fn(&str) -> Option<String>) -> Result<GraphConfig, ConfigError> {
    let base_url = get("GRAPH_BASE_URL").unwrap_or_else(|| DEFAULT_GRAPH_BASE_URL.to_string());
    let service_type = get("GRAPH_SERVICE_TYPE")
        .unwrap_or_else(|| "DELEGATED".to_string())
        .to_uppercase();

    match service_type.as_str() {
        "DELEGATED" => {
            let token = get("GRAPH_ACCESS_TOKEN").ok_or_else(|| ConfigError::MissingRequired {
                key: "GRAPH_ACCESS_TOKEN".into(),
                hint: "Delegated accounts need GRAPH_ACCESS_TOKEN (or set GRAPH_SERVICE_TYPE=CORPORATE).".into(),
            })?;
            Ok(GraphConfig {
                base_url,
                auth: GraphAuth::Delegated {
                    access_token: SecretString::from(token),
                },
                user_id: "me".to_string(),
            })
        }
        "CORPORATE" => {
            let require = |key: &str| {
                get(key).ok_or_else(|| ConfigError::MissingRequired {
                    key: key.to_string(),
                    hint: "Corporate accounts need CLIENT_ID, CLIENT_SECRET, TENANT_ID and USER_EMAIL."
                        .into(),
                })
            };
            let client_id = require("CLIENT_ID")?;
            let client_secret = require("CLIENT_SECRET")?;
            let tenant_id = require("TENANT_ID")?;
            let user_email = require("USER_EMAIL")?;
            Ok(GraphConfig {
                base_url,
                auth: GraphAuth::Corporate {
                    client_id,
                    client_secret: SecretString::from(client_secret),
                    tenant_id,
                },
                user_id: format!("users/{user_email}"),
            })
        }
        other => Err(ConfigError::InvalidValue {
            key: "GRAPH_SERVICE_TYPE".into(),
            message: format!("unknown service type '{other}' (expected DELEGATED or CORPORATE)"),
        }),
    }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        }),
    }
}
