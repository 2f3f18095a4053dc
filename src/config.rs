//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `PDFQA__*` 覆盖（双下划线表示嵌套，如 `PDFQA__RUN__MAX_ATTEMPTS=120`）。
//! API Key 优先取 `[api] key`，否则读 `OPENAI_API_KEY`（启动时先加载工作目录下的 `.env`）。

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::core::StartupError;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub assistant: AssistantSection,
    pub run: RunSection,
    pub api: ApiSection,
}

/// [app] 段：待上传 PDF 所在目录
#[derive(Debug, Clone, Deserialize)]
pub struct AppSection {
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
        }
    }
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("Upload")
}

/// [assistant] 段：同名助手会被删除后重建
#[derive(Debug, Clone, Deserialize)]
pub struct AssistantSection {
    #[serde(default = "default_assistant_name")]
    pub name: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_description")]
    pub description: String,
    #[serde(default = "default_instructions")]
    pub instructions: String,
    /// 关联到 file_search 的向量库；默认为空（上传的文件不会自动挂到助手上）
    #[serde(default)]
    pub vector_store_ids: Vec<String>,
}

impl Default for AssistantSection {
    fn default() -> Self {
        Self {
            name: default_assistant_name(),
            model: default_model(),
            description: default_description(),
            instructions: default_instructions(),
            vector_store_ids: Vec::new(),
        }
    }
}

fn default_assistant_name() -> String {
    "my_assistant".to_string()
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_description() -> String {
    "AI Assistant for searching and answering questions from PDF documents".to_string()
}

fn default_instructions() -> String {
    "You are an AI assistant specialized in searching and answering questions from PDF documents.\n\
     Please find relevant information from the PDF documents to answer user questions accurately.\n\
     Always refer to the content of the PDF documents when providing answers."
        .to_string()
}

/// [run] 段：轮询间隔与上限（次数 / 总时长任一触达即超时）
#[derive(Debug, Clone, Deserialize)]
pub struct RunSection {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_max_wait_secs")]
    pub max_wait_secs: u64,
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            max_attempts: default_max_attempts(),
            max_wait_secs: default_max_wait_secs(),
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_max_attempts() -> u32 {
    600
}

fn default_max_wait_secs() -> u64 {
    600
}

/// [api] 段：端点、超时与可选的 Key
#[derive(Debug, Clone, Deserialize)]
pub struct ApiSection {
    pub base_url: Option<String>,
    /// 单次 HTTP 请求超时（秒）
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    pub key: Option<String>,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            base_url: None,
            request_timeout_secs: default_request_timeout(),
            key: None,
        }
    }
}

fn default_request_timeout() -> u64 {
    60
}

impl ApiSection {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl AppConfig {
    /// 解析 API Key：配置优先，其次 OPENAI_API_KEY；均缺失为致命错误
    pub fn api_key(&self) -> Result<String, StartupError> {
        resolve_api_key(self.api.key.as_deref(), std::env::var("OPENAI_API_KEY").ok())
    }
}

fn resolve_api_key(configured: Option<&str>, env: Option<String>) -> Result<String, StartupError> {
    let non_blank = |k: &str| {
        let k = k.trim();
        (!k.is_empty()).then(|| k.to_string())
    };
    configured
        .and_then(non_blank)
        .or_else(|| env.as_deref().and_then(non_blank))
        .ok_or(StartupError::MissingApiKey)
}

/// 加载 .env 到进程环境（已存在的变量不被覆盖），返回实际读取的文件
///
/// path 为 None 时从当前目录向上查找 `.env`；找不到不算错误。
pub fn load_dotenv(path: Option<&Path>) -> Option<PathBuf> {
    let loaded = match path {
        Some(p) => dotenvy::from_path(p).map(|_| p.to_path_buf()),
        None => dotenvy::dotenv(),
    };
    match loaded {
        Ok(p) => {
            tracing::debug!(path = %p.display(), "Loaded .env");
            Some(p)
        }
        Err(e) if e.not_found() => None,
        Err(e) => {
            tracing::warn!("Failed to load .env: {}", e);
            None
        }
    }
}

/// 从 config 目录加载配置，环境变量 PDFQA__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 PDFQA__*（双下划线表示嵌套键；vector_store_ids 以逗号分隔）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("PDFQA")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("assistant.vector_store_ids"),
    );

    let c = builder.build()?;
    c.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;

    /// 读写进程环境变量的测试串行执行
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.app.upload_dir, PathBuf::from("Upload"));
        assert_eq!(cfg.assistant.name, "my_assistant");
        assert!(cfg.assistant.vector_store_ids.is_empty());
        assert_eq!(cfg.run.poll_interval_ms, 1000);
        assert!(cfg.run.max_attempts > 0);
        assert_eq!(cfg.api.request_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_explicit_file_overrides_defaults() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[run]\npoll_interval_ms = 250\nmax_attempts = 3\n\n[assistant]\nname = \"docs_bot\""
        )
        .unwrap();

        let cfg = load_config(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(cfg.run.poll_interval_ms, 250);
        assert_eq!(cfg.run.max_attempts, 3);
        assert_eq!(cfg.assistant.name, "docs_bot");
        // 未覆盖的键仍取默认值
        assert_eq!(cfg.assistant.model, "gpt-3.5-turbo");
    }

    #[test]
    fn test_env_overrides_toml() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let vars = [
            ("PDFQA__RUN__MAX_ATTEMPTS", "7"),
            ("PDFQA__ASSISTANT__NAME", "env_bot"),
            ("PDFQA__ASSISTANT__VECTOR_STORE_IDS", "vs_a,vs_b"),
        ];
        for (k, v) in vars {
            std::env::set_var(k, v);
        }

        let cfg = load_config(None);
        for (k, _) in vars {
            std::env::remove_var(k);
        }
        let cfg = cfg.unwrap();

        assert_eq!(cfg.run.max_attempts, 7);
        assert_eq!(cfg.assistant.name, "env_bot");
        assert_eq!(cfg.assistant.vector_store_ids, vec!["vs_a", "vs_b"]);
        // 未设置的键仍来自 TOML / 默认值
        assert_eq!(cfg.run.poll_interval_ms, 1000);
    }

    #[test]
    fn test_dotenv_supplies_api_key() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let saved = std::env::var("OPENAI_API_KEY").ok();
        std::env::remove_var("OPENAI_API_KEY");

        let dir = tempfile::TempDir::new().unwrap();
        let env_file = dir.path().join(".env");
        std::fs::write(&env_file, "# local secrets\nOPENAI_API_KEY=sk-from-dotenv\n").unwrap();

        let loaded = load_dotenv(Some(&env_file));
        let key = AppConfig::default().api_key();

        std::env::remove_var("OPENAI_API_KEY");
        if let Some(v) = saved {
            std::env::set_var("OPENAI_API_KEY", v);
        }

        assert_eq!(loaded, Some(env_file));
        assert_eq!(key.unwrap(), "sk-from-dotenv");
    }

    #[test]
    fn test_missing_dotenv_is_not_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        assert_eq!(load_dotenv(Some(&dir.path().join(".env"))), None);
    }

    #[test]
    fn test_api_key_prefers_config() {
        let key = resolve_api_key(Some("sk-config"), Some("sk-env".into())).unwrap();
        assert_eq!(key, "sk-config");
        let key = resolve_api_key(None, Some("sk-env".into())).unwrap();
        assert_eq!(key, "sk-env");
    }

    #[test]
    fn test_missing_api_key_is_fatal() {
        assert!(matches!(
            resolve_api_key(None, None),
            Err(StartupError::MissingApiKey)
        ));
        assert!(matches!(
            resolve_api_key(Some("  "), None),
            Err(StartupError::MissingApiKey)
        ));
    }
}
