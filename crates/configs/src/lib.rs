use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub oauth: OAuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port(), worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self { Self { data_dir: default_data_dir() } }
}

/// Session signing and bootstrap settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// 必填：会话签名密钥（或 JWT_SECRET）
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_session_ttl")]
    pub session_ttl_hours: i64,
    #[serde(default)]
    pub cookie_secure: bool,
    /// 首次登录即获得 admin 角色的邮箱列表
    #[serde(default)]
    pub admin_emails: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            session_ttl_hours: default_session_ttl(),
            cookie_secure: false,
            admin_emails: Vec::new(),
        }
    }
}

/// OAuth 2.0 authorization-code provider endpoints (Google by default).
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthConfig {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default = "default_authorize_url")]
    pub authorize_url: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    #[serde(default = "default_userinfo_url")]
    pub userinfo_url: String,
    #[serde(default = "default_redirect_url")]
    pub redirect_url: String,
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            authorize_url: default_authorize_url(),
            token_url: default_token_url(),
            userinfo_url: default_userinfo_url(),
            redirect_url: default_redirect_url(),
            scopes: default_scopes(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    #[serde(default)]
    pub json: bool,
}

fn default_host() -> String { "127.0.0.1".into() }
fn default_port() -> u16 { 8080 }
fn default_data_dir() -> String { "data".into() }
fn default_session_ttl() -> i64 { 12 }
fn default_authorize_url() -> String { "https://accounts.google.com/o/oauth2/v2/auth".into() }
fn default_token_url() -> String { "https://oauth2.googleapis.com/token".into() }
fn default_userinfo_url() -> String { "https://openidconnect.googleapis.com/v1/userinfo".into() }
fn default_redirect_url() -> String { "http://127.0.0.1:8080/auth/callback".into() }
fn default_scopes() -> Vec<String> { vec!["openid".into(), "email".into(), "profile".into()] }

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

pub fn parse(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// 读取 config.toml；文件缺失时退回到默认值 + 环境变量
    pub fn load_and_validate() -> Result<Self> {
        let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        let mut cfg = if std::path::Path::new(&path).exists() { load_from_file(&path)? } else { AppConfig::default() };
        cfg.apply_env();
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Environment variables win over the file for secrets and bind address.
    pub fn apply_env(&mut self) {
        let env = |k: &str| std::env::var(k).ok().filter(|v| !v.trim().is_empty());
        if let Some(host) = env("SERVER_HOST") { self.server.host = host; }
        if let Some(port) = env("SERVER_PORT").and_then(|p| p.parse::<u16>().ok()) { self.server.port = port; }
        if let Some(w) = env("TOKIO_WORKER_THREADS").and_then(|v| v.parse::<usize>().ok()) {
            self.server.worker_threads = Some(w);
        }
        if let Some(dir) = env("DATA_DIR") { self.storage.data_dir = dir; }
        if let Some(secret) = env("JWT_SECRET") { self.auth.jwt_secret = secret; }
        if let Some(list) = env("ADMIN_EMAILS") {
            self.auth.admin_emails = list.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect();
        }
        if let Some(id) = env("OAUTH_CLIENT_ID") { self.oauth.client_id = id; }
        if let Some(secret) = env("OAUTH_CLIENT_SECRET") { self.oauth.client_secret = secret; }
        if let Some(url) = env("OAUTH_REDIRECT_URL") { self.oauth.redirect_url = url; }
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        // 归一化 server
        self.server.normalize()?;
        self.storage.validate()?;
        self.auth.normalize()?;
        self.oauth.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port 必须在 1..=65535 范围内"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        Ok(())
    }
}

impl StorageConfig {
    fn validate(&self) -> Result<()> {
        if self.data_dir.trim().is_empty() {
            return Err(anyhow!("storage.data_dir 不能为空"));
        }
        Ok(())
    }
}

impl AuthConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.jwt_secret.trim().is_empty() {
            return Err(anyhow!("auth.jwt_secret 不能为空（可通过 JWT_SECRET 设置）"));
        }
        if self.session_ttl_hours <= 0 {
            return Err(anyhow!("auth.session_ttl_hours 必须为正整数"));
        }
        for email in self.admin_emails.iter_mut() {
            *email = email.trim().to_lowercase();
        }
        self.admin_emails.retain(|e| !e.is_empty());
        Ok(())
    }
}

impl OAuthConfig {
    fn validate(&self) -> Result<()> {
        for (name, url) in [
            ("oauth.authorize_url", &self.authorize_url),
            ("oauth.token_url", &self.token_url),
            ("oauth.userinfo_url", &self.userinfo_url),
            ("oauth.redirect_url", &self.redirect_url),
        ] {
            let lower = url.to_lowercase();
            if !(lower.starts_with("http://") || lower.starts_with("https://")) {
                return Err(anyhow!("{name} 必须以 http:// 或 https:// 开头"));
            }
        }
        Ok(())
    }

    /// client_id 与 client_secret 均已配置
    pub fn is_configured(&self) -> bool {
        !self.client_id.trim().is_empty() && !self.client_secret.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "[auth]\njwt_secret = \"s3cret\"\n";

    #[test]
    fn secret_only_file_uses_defaults() -> Result<()> {
        let mut cfg = parse(SECRET)?;
        cfg.normalize_and_validate()?;
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.server.worker_threads, Some(4));
        assert_eq!(cfg.storage.data_dir, "data");
        assert_eq!(cfg.auth.session_ttl_hours, 12);
        assert_eq!(cfg.auth.jwt_secret, "s3cret");
        assert!(!cfg.oauth.is_configured());
        assert!(!cfg.logging.json);
        Ok(())
    }

    #[test]
    fn blank_jwt_secret_is_rejected() -> Result<()> {
        for content in ["", "[auth]\njwt_secret = \"\"\n", "[auth]\njwt_secret = \"   \"\n"] {
            let mut cfg = parse(content)?;
            let err = cfg.normalize_and_validate().unwrap_err();
            assert!(err.to_string().contains("jwt_secret"), "{err}");
        }
        Ok(())
    }

    #[test]
    fn partial_server_section_keeps_other_defaults() -> Result<()> {
        let mut cfg = parse(&format!("[server]\nport = 9000\n\n{SECRET}"))?;
        cfg.normalize_and_validate()?;
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.server.host, "127.0.0.1");

        let cfg = parse("[server]\nhost = \"0.0.0.0\"\n")?;
        assert_eq!(cfg.server.port, 8080);
        Ok(())
    }

    #[test]
    fn parses_sections_and_normalizes_admin_emails() -> Result<()> {
        let mut cfg = parse(
            r#"
            [server]
            host = ""
            port = 9000
            worker_threads = 0

            [auth]
            jwt_secret = "s3cret"
            admin_emails = [" Owner@Studio.com ", ""]

            [oauth]
            client_id = "id"
            client_secret = "secret"

            [logging]
            json = true
            "#,
        )?;
        cfg.normalize_and_validate()?;
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.server.worker_threads, Some(4));
        assert_eq!(cfg.auth.admin_emails, vec!["owner@studio.com".to_string()]);
        assert_eq!(cfg.auth.jwt_secret, "s3cret");
        assert!(cfg.oauth.is_configured());
        assert!(cfg.logging.json);
        Ok(())
    }

    #[test]
    fn rejects_invalid_values() {
        let mut cfg = parse(&format!("[server]\nhost = \"0.0.0.0\"\nport = 0\n\n{SECRET}")).unwrap();
        assert!(cfg.normalize_and_validate().is_err());

        let mut cfg = parse("[auth]\njwt_secret = \"s3cret\"\nsession_ttl_hours = 0\n").unwrap();
        assert!(cfg.normalize_and_validate().is_err());

        let mut cfg = parse(&format!("[oauth]\ntoken_url = \"ftp://x\"\n\n{SECRET}")).unwrap();
        assert!(cfg.normalize_and_validate().is_err());

        let mut cfg = parse(&format!("[storage]\ndata_dir = \" \"\n\n{SECRET}")).unwrap();
        assert!(cfg.normalize_and_validate().is_err());
    }
}
