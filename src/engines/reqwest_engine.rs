// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::engines::traits::{
    parse_cookie_header, EngineError, FetchMethod, FetchRequest, PageContent, ScraperEngine,
};
use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;
use url::Url;

/// 抓取引擎
///
/// 基于reqwest实现的基本HTTP抓取引擎。每个请求使用独立的客户端和
/// Cookie 罐：请求携带的 Cookie 预先写入罐中，跟随重定向过程中服务端
/// 设置的 Cookie 也会被收集，最终一起返回到 `PageContent::cookies`。
pub struct ReqwestEngine {
    user_agent: String,
}

impl ReqwestEngine {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
        }
    }

    fn build_headers(request: &FetchRequest) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        for (k, v) in &request.headers {
            if let (Ok(k), Ok(v)) = (
                HeaderName::from_bytes(k.as_bytes()),
                HeaderValue::from_str(v),
            ) {
                headers.insert(k, v);
            }
        }
        headers
    }
}

#[async_trait]
impl ScraperEngine for ReqwestEngine {
    /// 执行HTTP抓取
    ///
    /// # 参数
    ///
    /// * `request` - 抓取请求
    ///
    /// # 返回值
    ///
    /// * `Ok(PageContent)` - 页面内容（任意状态码）
    /// * `Err(EngineError)` - 网络层错误
    async fn fetch(&self, request: &FetchRequest) -> Result<PageContent, EngineError> {
        let url = Url::parse(&request.url)
            .map_err(|e| EngineError::Other(format!("Invalid URL {}: {}", request.url, e)))?;

        let jar = Arc::new(Jar::default());
        for (name, value) in &request.cookies {
            jar.add_cookie_str(&format!("{}={}", name, value), &url);
        }

        // Each request gets a fresh client for cookie isolation
        let client = reqwest::Client::builder()
            .user_agent(self.user_agent.as_str())
            .timeout(request.effective_timeout())
            .cookie_provider(jar.clone())
            .build()?;

        let builder = match &request.method {
            FetchMethod::Get => client.get(url),
            FetchMethod::PostForm(fields) => client.post(url).form(fields),
        };

        let start = Instant::now();
        let response = builder.headers(Self::build_headers(request)).send().await?;

        let status = response.status().as_u16();
        let final_url = response.url().clone();
        let body = response.text().await?;

        let cookies = jar
            .cookies(&final_url)
            .and_then(|v| v.to_str().ok().map(parse_cookie_header))
            .unwrap_or_default();

        debug!(
            url = %final_url,
            status,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Fetched page"
        );

        Ok(PageContent {
            url: final_url.to_string(),
            status,
            body,
            cookies,
        })
    }

    /// 获取引擎名称
    fn name(&self) -> &'static str {
        "reqwest"
    }
}

#[cfg(test)]
#[path = "reqwest_engine_test.rs"]
mod tests;
