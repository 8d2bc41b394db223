// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use thiserror::Error;

/// 默认请求超时
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// 引擎错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    /// 请求失败
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    /// 浏览器错误
    #[error("Browser error: {0}")]
    Browser(String),
    /// 超时
    #[error("Timeout")]
    Timeout,
    /// 其他错误
    #[error("Other error: {0}")]
    Other(String),
}

impl EngineError {
    /// 判断错误是否可重试
    ///
    /// # 返回值
    ///
    /// 网络连接失败、超时返回true，其余返回false
    pub fn is_retryable(&self) -> bool {
        match self {
            EngineError::RequestFailed(e) => {
                e.is_timeout() || e.is_connect() || e.is_request() || e.is_body()
            }
            EngineError::Timeout => true,
            EngineError::Browser(_) => true,
            EngineError::Other(_) => false,
        }
    }
}

/// 请求方法
#[derive(Debug, Clone, PartialEq)]
pub enum FetchMethod {
    Get,
    /// 以 `application/x-www-form-urlencoded` 提交表单
    PostForm(Vec<(String, String)>),
}

/// 抓取请求
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// 目标URL
    pub url: String,
    /// 请求方法
    pub method: FetchMethod,
    /// 额外请求头
    pub headers: HashMap<String, String>,
    /// 随请求发送的 Cookie
    pub cookies: BTreeMap<String, String>,
    /// 超时时间，未设置时由抓取网关填充
    pub timeout: Option<Duration>,
}

impl FetchRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: FetchMethod::Get,
            headers: HashMap::new(),
            cookies: BTreeMap::new(),
            timeout: None,
        }
    }

    pub fn post_form(url: impl Into<String>, fields: Vec<(String, String)>) -> Self {
        Self {
            method: FetchMethod::PostForm(fields),
            ..Self::get(url)
        }
    }

    pub fn with_cookies(mut self, cookies: &BTreeMap<String, String>) -> Self {
        self.cookies
            .extend(cookies.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// 实际生效的超时时间
    pub fn effective_timeout(&self) -> Duration {
        self.timeout.unwrap_or(DEFAULT_TIMEOUT)
    }
}

/// 页面内容
///
/// 所有抓取后端统一返回的结果，解析器与 robots 检查器只依赖它
#[derive(Debug, Clone, PartialEq)]
pub struct PageContent {
    /// 跟随重定向之后的最终URL
    pub url: String,
    /// HTTP状态码
    pub status: u16,
    /// 响应正文
    pub body: String,
    /// 请求结束后对最终URL可见的 Cookie
    pub cookies: BTreeMap<String, String>,
}

impl PageContent {
    pub fn new(url: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status,
            body: body.into(),
            cookies: BTreeMap::new(),
        }
    }

    /// 是否为 2xx 响应
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// 把 `Cookie` 请求头格式（`a=1; b=2`）解析为键值对
pub fn parse_cookie_header(header: &str) -> BTreeMap<String, String> {
    header
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            let name = name.trim();
            (!name.is_empty()).then(|| (name.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// 抓取引擎特质
///
/// 抓取后端（普通 HTTP 客户端或无头浏览器）的统一接口
#[async_trait]
pub trait ScraperEngine: Send + Sync {
    /// 执行一次请求，不做重试
    async fn fetch(&self, request: &FetchRequest) -> Result<PageContent, EngineError>;

    /// 引擎名称
    fn name(&self) -> &'static str;

    /// 释放引擎持有的资源，在一次爬取结束时调用
    async fn shutdown(&self) {}
}
