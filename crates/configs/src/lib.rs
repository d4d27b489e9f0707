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
    pub admin: AdminConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
    /// Largest accepted request body; check images arrive inline as data URIs.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

/// 32 MiB.
pub const DEFAULT_MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8080,
            worker_threads: Some(4),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

/// Which storage adapter serves the three collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// One JSON document per collection under `data_dir`.
    #[default]
    File,
    /// One JSON value per collection in Redis.
    Redis,
    /// Postgres (or SQLite) through SeaORM.
    Sql,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::File => "file",
            Backend::Redis => "redis",
            Backend::Sql => "sql",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" | "json" => Ok(Backend::File),
            "redis" | "kv" => Ok(Backend::Redis),
            "sql" | "postgres" | "relational" => Ok(Backend::Sql),
            other => Err(anyhow!("unknown storage backend `{other}` (expected file, redis or sql)")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: Backend,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default)]
    pub seed_dir: Option<String>,
    #[serde(default = "default_true")]
    pub demo_users: bool,
    #[serde(default)]
    pub redis_url: String,
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default = "default_true")]
    pub auto_setup: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: Backend::File,
            data_dir: default_data_dir(),
            seed_dir: None,
            demo_users: true,
            redis_url: String::new(),
            key_prefix: default_key_prefix(),
            database: DatabaseConfig::default(),
            auto_setup: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            sqlx_logging: false,
        }
    }
}

/// Fixed administrator credentials. Compared in plaintext; not a security boundary.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    #[serde(default = "default_admin_user")]
    pub username: String,
    #[serde(default = "default_admin_pass")]
    pub password: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self { username: default_admin_user(), password: default_admin_pass() }
    }
}

fn default_true() -> bool { true }
fn default_max_body_bytes() -> usize { DEFAULT_MAX_BODY_BYTES }
fn default_data_dir() -> String { "data".into() }
fn default_key_prefix() -> String { "bank".into() }
fn default_admin_user() -> String { "admin".into() }
fn default_admin_pass() -> String { "admin123".into() }
fn default_max_connections() -> u32 { 5 }
fn default_min_connections() -> u32 { 1 }
fn default_connect_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 30 }

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load `config.toml` when present (defaults otherwise), apply process environment
    /// overrides, then normalize and validate.
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = match load_default() {
            Ok(cfg) => cfg,
            Err(e) if is_missing_file(&e) => AppConfig::default(),
            Err(e) => return Err(e),
        };
        cfg.apply_env(|key| std::env::var(key).ok())?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Apply environment overrides through `lookup` so callers (and tests) control the source.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = get("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = get("SERVER_PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| anyhow!("SERVER_PORT must be a port number, got `{port}`"))?;
        }
        if let Some(limit) = get("SERVER_MAX_BODY_BYTES") {
            self.server.max_body_bytes = limit
                .trim()
                .parse()
                .map_err(|_| anyhow!("SERVER_MAX_BODY_BYTES must be a byte count, got `{limit}`"))?;
        }
        if let Some(backend) = get("STORAGE_BACKEND") {
            self.storage.backend = Backend::parse(&backend)?;
        }
        if let Some(dir) = get("DATA_DIR") {
            self.storage.data_dir = dir;
        }
        if let Some(dir) = get("SEED_DIR") {
            self.storage.seed_dir = Some(dir);
        }
        if let Some(url) = get("REDIS_URL").or_else(|| get("KV_URL")) {
            self.storage.redis_url = url;
        }
        if let Some(url) = ["POSTGRES_URL_NON_POOLING", "POSTGRES_URL", "DATABASE_URL"]
            .iter()
            .find_map(|key| get(key))
        {
            self.storage.database.url = url;
        }
        if let Some(user) = get("ADMIN_USER") {
            self.admin.username = user;
        }
        if let Some(pass) = get("ADMIN_PASS") {
            self.admin.password = pass;
        }
        Ok(())
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.storage.validate()?;
        Ok(())
    }
}

fn is_missing_file(e: &anyhow::Error) -> bool {
    e.downcast_ref::<std::io::Error>()
        .map(|io| io.kind() == std::io::ErrorKind::NotFound)
        .unwrap_or(false)
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be within 1..=65535"));
        }
        if self.max_body_bytes == 0 {
            return Err(anyhow!("server.max_body_bytes must be positive"));
        }
        if let Some(w) = self.worker_threads {
            if w == 0 { self.worker_threads = Some(4); }
        } else {
            self.worker_threads = Some(4);
        }
        Ok(())
    }
}

impl StorageConfig {
    pub fn validate(&self) -> Result<()> {
        match self.backend {
            Backend::File => {
                if self.data_dir.trim().is_empty() {
                    return Err(anyhow!("storage.data_dir must not be empty"));
                }
            }
            Backend::Redis => {
                let lower = self.redis_url.to_lowercase();
                if !(lower.starts_with("redis://") || lower.starts_with("rediss://")) {
                    return Err(anyhow!("storage.redis_url must start with redis:// or rediss://; set it in config.toml or REDIS_URL"));
                }
            }
            Backend::Sql => self.database.validate()?,
        }
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("storage.database.url is empty; set it in config.toml or DATABASE_URL"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://") || lower.starts_with("sqlite:")) {
            return Err(anyhow!("storage.database.url must start with postgres://, postgresql:// or sqlite:"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("storage.database.min_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("storage.database.max_connections must be >= min_connections"));
        }
        if self.connect_timeout_secs == 0 {
            return Err(anyhow!("storage.database.connect_timeout_secs must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_select_file_backend_and_demo_admin() {
        let mut cfg = AppConfig::default();
        cfg.normalize_and_validate().unwrap();
        assert_eq!(cfg.storage.backend, Backend::File);
        assert_eq!(cfg.storage.data_dir, "data");
        assert_eq!(cfg.admin.username, "admin");
        assert_eq!(cfg.admin.password, "admin123");
        assert_eq!(cfg.server.worker_threads, Some(4));
    }

    #[test]
    fn toml_sections_are_optional() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [storage]
            backend = "sql"
            [storage.database]
            url = "sqlite::memory:"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.storage.backend, Backend::Sql);
        assert_eq!(cfg.storage.database.max_connections, 5);
        assert!(cfg.storage.auto_setup);
        assert_eq!(cfg.server.port, 8080);
    }

    #[test]
    fn env_overrides_take_precedence() {
        let mut cfg = AppConfig::default();
        cfg.apply_env(env(&[
            ("STORAGE_BACKEND", "redis"),
            ("KV_URL", "redis://127.0.0.1:6379"),
            ("ADMIN_USER", "root"),
            ("ADMIN_PASS", "s3cret"),
            ("SERVER_PORT", "9000"),
        ]))
        .unwrap();
        cfg.normalize_and_validate().unwrap();
        assert_eq!(cfg.storage.backend, Backend::Redis);
        assert_eq!(cfg.storage.redis_url, "redis://127.0.0.1:6379");
        assert_eq!(cfg.admin.username, "root");
        assert_eq!(cfg.admin.password, "s3cret");
        assert_eq!(cfg.server.port, 9000);
    }

    #[test]
    fn body_limit_defaults_and_env_override() {
        let mut cfg = AppConfig::default();
        assert_eq!(cfg.server.max_body_bytes, 32 * 1024 * 1024);
        cfg.apply_env(env(&[("SERVER_MAX_BODY_BYTES", "1048576")])).unwrap();
        cfg.normalize_and_validate().unwrap();
        assert_eq!(cfg.server.max_body_bytes, 1_048_576);

        assert!(cfg.apply_env(env(&[("SERVER_MAX_BODY_BYTES", "lots")])).is_err());
        cfg.server.max_body_bytes = 0;
        assert!(cfg.normalize_and_validate().is_err());
    }

    #[test]
    fn first_present_database_url_wins() {
        let mut cfg = AppConfig::default();
        cfg.apply_env(env(&[
            ("POSTGRES_URL", "postgres://a@localhost/bank"),
            ("DATABASE_URL", "postgres://b@localhost/bank"),
        ]))
        .unwrap();
        assert_eq!(cfg.storage.database.url, "postgres://a@localhost/bank");
    }

    #[test]
    fn sql_backend_requires_supported_url() {
        let mut cfg = AppConfig::default();
        cfg.storage.backend = Backend::Sql;
        assert!(cfg.normalize_and_validate().is_err());
        cfg.storage.database.url = "mysql://localhost/bank".into();
        assert!(cfg.normalize_and_validate().is_err());
        cfg.storage.database.url = "postgres://localhost/bank".into();
        assert!(cfg.normalize_and_validate().is_ok());
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let mut cfg = AppConfig::default();
        assert!(cfg.apply_env(env(&[("STORAGE_BACKEND", "mongo")])).is_err());
    }

    #[test]
    fn missing_config_file_is_detected() {
        let path = std::env::temp_dir().join(format!("missing_{}.toml", uuid::Uuid::new_v4()));
        let err = load_from_file(path.to_str().unwrap()).unwrap_err();
        assert!(is_missing_file(&err));
    }
}
