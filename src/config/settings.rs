// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

use crate::domain::models::session::Credentials;

/// 应用程序配置设置
///
/// 每个配置段都有内置默认值，文件与环境变量只需覆盖需要修改的项
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// 爬虫行为配置
    pub crawler: CrawlerSettings,
    /// 目标站点配置
    pub site: SiteSettings,
    /// 抓取后端配置
    pub engine: EngineSettings,
    /// 结果存储配置
    pub storage: StorageSettings,
    /// 登录配置
    pub auth: AuthSettings,
}

/// 爬虫配置设置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerSettings {
    /// 两次请求之间的最小间隔（秒）
    pub delay_secs: f64,
    /// 每个请求的最大尝试次数
    pub max_retries: u32,
    /// 首次重试前的退避时间（毫秒）
    pub retry_backoff_ms: u64,
    /// 单次请求超时（秒）
    pub timeout_secs: u64,
    pub user_agent: String,
    /// 匹配 robots.txt 时使用的爬虫标识
    pub robots_agent: String,
    /// 搜索结果最多翻页数
    pub max_search_pages: u32,
    /// 每个评论页最多保留的评论数
    pub reviews_per_page: usize,
    /// 搜索候选数量 = max_results × candidate_factor
    pub candidate_factor: usize,
}

impl Default for CrawlerSettings {
    fn default() -> Self {
        Self {
            delay_secs: 2.0,
            max_retries: 3,
            retry_backoff_ms: 1000,
            timeout_secs: 30,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            robots_agent: "prowl".to_string(),
            max_search_pages: 5,
            reviews_per_page: 10,
            candidate_factor: 2,
        }
    }
}

/// 站点配置设置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSettings {
    pub base_url: String,
    pub search_path: String,
    pub review_path: String,
    pub login_path: String,
    /// 登录成功后必须出现的 Cookie 名称
    pub auth_cookie: String,
    /// 会话有效期（秒）
    pub session_ttl_secs: i64,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            base_url: "https://www.amazon.com".to_string(),
            search_path: "/s".to_string(),
            review_path: "/product-reviews".to_string(),
            login_path: "/ap/signin".to_string(),
            auth_cookie: "session-token".to_string(),
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
        }
    }
}

const DEFAULT_SESSION_TTL_SECS: i64 = 24 * 60 * 60;
const MAX_SESSION_TTL_SECS: i64 = 365 * 24 * 60 * 60;

impl SiteSettings {
    /// 会话有效期；非正数回退到默认一天，超过一年按一年计
    pub fn session_ttl(&self) -> chrono::Duration {
        let secs = match self.session_ttl_secs {
            secs if secs <= 0 => {
                warn!(session_ttl_secs = secs, "Invalid session TTL, using default");
                DEFAULT_SESSION_TTL_SECS
            }
            secs if secs > MAX_SESSION_TTL_SECS => {
                warn!(session_ttl_secs = secs, "Session TTL too large, capping");
                MAX_SESSION_TTL_SECS
            }
            secs => secs,
        };
        chrono::Duration::try_seconds(secs).unwrap_or_else(|| chrono::Duration::days(1))
    }
}

/// 抓取后端类型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// 普通 HTTP 客户端
    #[default]
    Http,
    /// 无头浏览器
    Browser,
}

/// 抓取后端配置设置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub kind: EngineKind,
    /// 远程 Chrome 调试地址，仅 browser 后端使用
    pub remote_debugging_url: Option<String>,
}

/// 存储配置设置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// 结果文件目录
    pub data_dir: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
        }
    }
}

/// 登录配置设置
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    pub email: Option<String>,
    pub password: Option<String>,
    /// 会话状态文件
    pub session_file: String,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            email: None,
            password: None,
            session_file: "cookies.json".to_string(),
        }
    }
}

impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("session_file", &self.session_file)
            .finish()
    }
}

impl AuthSettings {
    /// 邮箱与密码都非空时返回登录凭据
    pub fn credentials(&self) -> Option<Credentials> {
        let email = self.email.as_deref().map(str::trim).filter(|e| !e.is_empty())?;
        let password = self.password.as_deref().filter(|p| !p.is_empty())?;
        Some(Credentials::new(email, password))
    }
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次叠加内置默认值、`config/default.toml`、`config/<APP_ENVIRONMENT>.toml`
    /// 与 `PROWL__` 前缀的环境变量（例如 `PROWL__AUTH__EMAIL`）
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        Self::load_from(Path::new("config"))
    }

    /// 从指定目录加载配置文件
    pub fn load_from(dir: &Path) -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Config::builder()
            .add_source(File::from(dir.join("default")).required(false))
            .add_source(File::from(dir.join(&env)).required(false))
            .add_source(Environment::with_prefix("PROWL").separator("__"));

        builder.build()?.try_deserialize()
    }
}
