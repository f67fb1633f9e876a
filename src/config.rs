use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

/// Which asset representation a deployment uses. Selected once at startup,
/// never mixed per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetBackend {
    /// Bytes on local disk, refs are `/uploads/...` paths.
    Disk,
    /// Refs are self-contained data URIs, no disk I/O.
    Inline,
}

#[derive(Debug, Clone)]
pub struct AiConfig {
    pub api_key: String,
    pub api_base: String,
    pub text_model: String,
    pub image_model: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    /// Public base URL prefixed onto disk-backed asset refs.
    pub base_url: String,
    pub upload_dir: PathBuf,
    pub asset_backend: AssetBackend,
    /// `None` when AI is disabled or no key is configured; the AI
    /// endpoints answer 501 in that case.
    pub ai: Option<AiConfig>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "listforge".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "listforge-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
            refresh_ttl_minutes: std::env::var("JWT_REFRESH_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24 * 14),
        };

        let base_url =
            std::env::var("BASE_URL").unwrap_or_else(|_| "http://localhost:8080".into());
        let upload_dir =
            PathBuf::from(std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".into()));

        let asset_backend = match std::env::var("ASSET_BACKEND")
            .unwrap_or_else(|_| "disk".into())
            .to_lowercase()
            .as_str()
        {
            "disk" => AssetBackend::Disk,
            "inline" => AssetBackend::Inline,
            other => anyhow::bail!("unknown ASSET_BACKEND: {other}"),
        };

        let disable_ai = std::env::var("DISABLE_AI")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(false);
        let ai = match std::env::var("AI_API_KEY") {
            Ok(api_key) if !disable_ai && !api_key.is_empty() => Some(AiConfig {
                api_key,
                api_base: std::env::var("AI_API_BASE")
                    .unwrap_or_else(|_| "https://api.openai.com/v1".into()),
                text_model: std::env::var("AI_TEXT_MODEL")
                    .unwrap_or_else(|_| "gpt-4o-mini".into()),
                image_model: std::env::var("AI_IMAGE_MODEL")
                    .unwrap_or_else(|_| "gemini-2.5-flash-image".into()),
            }),
            _ => None,
        };

        Ok(Self {
            database_url,
            jwt,
            base_url,
            upload_dir,
            asset_backend,
            ai,
        })
    }
}
