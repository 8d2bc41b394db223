// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::engines::traits::{EngineError, FetchMethod, FetchRequest, PageContent, ScraperEngine};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::network::CookieParam;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

fn browser_error(e: impl std::fmt::Display) -> EngineError {
    EngineError::Browser(e.to_string())
}

/// 浏览器引擎
///
/// 基于chromiumoxide实现的无头浏览器抓取引擎。浏览器在一次爬取开始时
/// 启动（或连接到远程实例），在 `shutdown` 中关闭；每个请求使用一个新标签页。
pub struct BrowserEngine {
    browser: Mutex<Option<Browser>>,
    handler: Mutex<Option<JoinHandle<()>>>,
    user_agent: String,
}

impl BrowserEngine {
    /// 启动本地浏览器或连接远程调试地址
    ///
    /// # 参数
    ///
    /// * `user_agent` - 标签页使用的 User-Agent
    /// * `remote_debugging_url` - 远程 Chrome 调试地址，为空时在本地启动
    pub async fn launch(
        user_agent: impl Into<String>,
        remote_debugging_url: Option<&str>,
    ) -> Result<Self, EngineError> {
        let (browser, mut handler) = if let Some(url) = remote_debugging_url {
            info!("Connecting to remote Chrome instance at: {}", url);
            Browser::connect(url).await.map_err(|e| {
                EngineError::Browser(format!("Failed to connect to remote Chrome: {}", e))
            })?
        } else {
            let config = BrowserConfig::builder()
                .no_sandbox()
                .request_timeout(Duration::from_secs(30))
                .arg("--disable-gpu")
                .arg("--disable-dev-shm-usage")
                .build()
                .map_err(EngineError::Browser)?;
            Browser::launch(config).await.map_err(browser_error)?
        };

        // Spawn a handler to process browser events
        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        Ok(Self {
            browser: Mutex::new(Some(browser)),
            handler: Mutex::new(Some(handle)),
            user_agent: user_agent.into(),
        })
    }

    async fn load(&self, page: &Page, request: &FetchRequest) -> Result<PageContent, EngineError> {
        page.set_user_agent(self.user_agent.as_str())
            .await
            .map_err(browser_error)?;

        if !request.cookies.is_empty() {
            let params = request
                .cookies
                .iter()
                .map(|(name, value)| {
                    CookieParam::builder()
                        .name(name.clone())
                        .value(value.clone())
                        .url(request.url.clone())
                        .build()
                        .map_err(EngineError::Browser)
                })
                .collect::<Result<Vec<_>, _>>()?;
            page.set_cookies(params).await.map_err(browser_error)?;
        }

        match &request.method {
            FetchMethod::Get => {
                page.goto(request.url.as_str()).await.map_err(browser_error)?;
            }
            FetchMethod::PostForm(fields) => {
                // Build and submit a form so the browser performs a real navigation
                let script = format!(
                    r#"(() => {{
                        const form = document.createElement('form');
                        form.method = 'POST';
                        form.action = {action};
                        for (const [name, value] of {fields}) {{
                            const input = document.createElement('input');
                            input.type = 'hidden';
                            input.name = name;
                            input.value = value;
                            form.appendChild(input);
                        }}
                        document.body.appendChild(form);
                        form.submit();
                    }})()"#,
                    action = serde_json::to_string(&request.url).map_err(browser_error)?,
                    fields = serde_json::to_string(fields).map_err(browser_error)?,
                );
                page.evaluate(script).await.map_err(browser_error)?;
                page.wait_for_navigation().await.map_err(browser_error)?;
            }
        }

        let body = page.content().await.map_err(browser_error)?;
        let url = page
            .url()
            .await
            .map_err(browser_error)?
            .unwrap_or_else(|| request.url.clone());
        let cookies: BTreeMap<String, String> = page
            .get_cookies()
            .await
            .map_err(browser_error)?
            .into_iter()
            .map(|c| (c.name, c.value))
            .collect();

        // The DevTools protocol does not expose the document status here
        Ok(PageContent {
            url,
            status: 200,
            body,
            cookies,
        })
    }
}

#[async_trait]
impl ScraperEngine for BrowserEngine {
    async fn fetch(&self, request: &FetchRequest) -> Result<PageContent, EngineError> {
        let guard = self.browser.lock().await;
        let browser = guard
            .as_ref()
            .ok_or_else(|| EngineError::Other("Browser has been shut down".to_string()))?;

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(browser_error)?;

        let result = tokio::time::timeout(request.effective_timeout(), self.load(&page, request))
            .await
            .unwrap_or(Err(EngineError::Timeout));

        if let Err(e) = page.close().await {
            warn!("Failed to close browser tab: {}", e);
        }
        result
    }

    fn name(&self) -> &'static str {
        "browser"
    }

    async fn shutdown(&self) {
        if let Some(mut browser) = self.browser.lock().await.take() {
            if let Err(e) = browser.close().await {
                warn!("Failed to close browser: {}", e);
            }
            if let Err(e) = browser.wait().await {
                warn!("Failed to wait for browser exit: {}", e);
            }
            info!("Browser closed");
        }
        if let Some(handle) = self.handler.lock().await.take() {
            handle.abort();
        }
    }
}
