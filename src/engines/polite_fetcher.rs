// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::settings::CrawlerSettings;
use crate::engines::traits::{FetchRequest, PageContent, ScraperEngine};
use crate::utils::errors::{CrawlError, FetchError};
use crate::utils::rate_limiter::RateLimiter;
use crate::utils::retry_policy::{is_retryable_status, RetryPolicy};
use crate::utils::robots::RobotsChecker;

/// 带重试的单次抓取
///
/// 每次尝试前都会等待限速器放行。网络错误、超时、408/429/5xx 按策略重试，
/// 其他 4xx 与不可重试的引擎错误立即失败。
pub async fn fetch_with_retry(
    engine: &dyn ScraperEngine,
    rate_limiter: &RateLimiter,
    policy: &RetryPolicy,
    request: &FetchRequest,
) -> Result<PageContent, FetchError> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        rate_limiter.wait_turn().await;

        let last_error = match engine.fetch(request).await {
            Ok(page) if is_retryable_status(page.status) => format!("HTTP {}", page.status),
            Ok(page) if page.status >= 400 => {
                return Err(FetchError::Status {
                    url: request.url.clone(),
                    status: page.status,
                });
            }
            Ok(page) => return Ok(page),
            Err(e) if e.is_retryable() => e.to_string(),
            Err(e) => {
                return Err(FetchError::Engine {
                    url: request.url.clone(),
                    message: e.to_string(),
                });
            }
        };

        if !policy.should_retry(attempt) {
            return Err(FetchError::Exhausted {
                url: request.url.clone(),
                attempts: attempt,
                last_error,
            });
        }

        let backoff = policy.calculate_backoff(attempt);
        warn!(
            url = %request.url,
            attempt,
            max_attempts = policy.max_retries,
            backoff_ms = backoff.as_millis() as u64,
            "Request failed ({}), retrying",
            last_error
        );
        tokio::time::sleep(backoff).await;
    }
}

/// 礼貌抓取网关
///
/// 所有对目标站点的请求都经过这里：先检查 robots.txt，再由共享限速器
/// 控制节奏，失败时按重试策略退避重试。
pub struct PoliteFetcher {
    engine: Arc<dyn ScraperEngine>,
    robots: RobotsChecker,
    rate_limiter: Arc<RateLimiter>,
    retry_policy: RetryPolicy,
    robots_agent: String,
    timeout: Duration,
}

impl PoliteFetcher {
    /// 创建抓取网关
    ///
    /// # 参数
    ///
    /// * `engine` - 抓取后端
    /// * `rate_limiter` - 共享限速器
    /// * `retry_policy` - 重试策略
    /// * `robots_agent` - 匹配 robots.txt 时使用的爬虫标识
    /// * `timeout` - 单次请求超时
    pub fn new(
        engine: Arc<dyn ScraperEngine>,
        rate_limiter: Arc<RateLimiter>,
        retry_policy: RetryPolicy,
        robots_agent: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let robots = RobotsChecker::new(
            engine.clone(),
            rate_limiter.clone(),
            retry_policy.clone(),
            timeout,
        );
        Self {
            engine,
            robots,
            rate_limiter,
            retry_policy,
            robots_agent: robots_agent.into(),
            timeout,
        }
    }

    /// 根据爬虫配置创建
    pub fn from_settings(
        engine: Arc<dyn ScraperEngine>,
        rate_limiter: Arc<RateLimiter>,
        settings: &CrawlerSettings,
    ) -> Self {
        Self::new(
            engine,
            rate_limiter,
            RetryPolicy::from_settings(settings),
            settings.robots_agent.clone(),
            Duration::from_secs(settings.timeout_secs),
        )
    }

    pub fn robots(&self) -> &RobotsChecker {
        &self.robots
    }

    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.rate_limiter
    }

    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    /// 抓取页面
    ///
    /// # 返回值
    ///
    /// * `Ok(PageContent)` - 2xx/3xx 页面
    /// * `Err(CrawlError::Policy)` - robots.txt 禁止，未发出请求
    /// * `Err(CrawlError::Fetch)` - 重试耗尽或不可重试的失败
    pub async fn fetch(&self, mut request: FetchRequest) -> Result<PageContent, CrawlError> {
        if !self.robots.is_allowed(&request.url, &self.robots_agent).await {
            warn!(url = %request.url, "Skipping URL disallowed by robots.txt");
            return Err(CrawlError::Policy { url: request.url });
        }

        if request.timeout.is_none() {
            request.timeout = Some(self.timeout);
        }

        Ok(fetch_with_retry(
            self.engine.as_ref(),
            &self.rate_limiter,
            &self.retry_policy,
            &request,
        )
        .await?)
    }

    /// 以 GET 抓取页面
    pub async fn get(&self, url: &str) -> Result<PageContent, CrawlError> {
        self.fetch(FetchRequest::get(url)).await
    }

    /// 若站点声明的 Crawl-delay 大于当前间隔，则提高限速间隔
    pub async fn honor_crawl_delay(&self, site_url: &str) {
        if let Some(delay) = self.robots.crawl_delay(site_url, &self.robots_agent).await {
            if delay > self.rate_limiter.min_interval().await {
                info!(delay_ms = delay.as_millis() as u64, "Honoring robots.txt Crawl-delay");
            }
            self.rate_limiter.raise_interval(delay).await;
        }
    }
}
