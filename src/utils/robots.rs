// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use robotstxt::DefaultMatcher;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use url::Url;

use crate::engines::polite_fetcher::fetch_with_retry;
use crate::engines::traits::{FetchRequest, ScraperEngine};
use crate::utils::rate_limiter::{RateLimiter, MAX_INTERVAL};
use crate::utils::retry_policy::RetryPolicy;

/// 某个站点的 robots.txt 规则
#[derive(Debug, Clone, PartialEq)]
enum RobotsRules {
    /// 站点没有 robots.txt
    AllowAll,
    /// 获取失败，按禁止处理
    DisallowAll,
    /// robots.txt 原文
    Rules(String),
}

/// Robots.txt检查器
///
/// 每次运行中每个站点只获取一次 robots.txt（惰性获取，按 origin 缓存）。
/// 获取失败时按“全部禁止”处理并记录警告，不会返回致命错误。
/// 规则匹配由 `robotstxt` 完成：最具体（最长）的规则优先。
pub struct RobotsChecker {
    /// 抓取后端
    engine: Arc<dyn ScraperEngine>,

    /// 共享限速器，robots.txt 请求同样受其约束
    rate_limiter: Arc<RateLimiter>,

    /// 重试策略
    retry_policy: RetryPolicy,

    /// 请求超时
    timeout: Duration,

    /// 按 origin 缓存的规则
    cache: Mutex<HashMap<String, Arc<RobotsRules>>>,
}

impl RobotsChecker {
    /// 创建新的Robots检查器实例
    pub fn new(
        engine: Arc<dyn ScraperEngine>,
        rate_limiter: Arc<RateLimiter>,
        retry_policy: RetryPolicy,
        timeout: Duration,
    ) -> Self {
        Self {
            engine,
            rate_limiter,
            retry_policy,
            timeout,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// 检查URL是否被允许访问
    ///
    /// # 参数
    ///
    /// * `url_str` - 待检查的URL
    /// * `user_agent` - 用于匹配 User-agent 分组的爬虫标识
    ///
    /// # 返回值
    ///
    /// 允许访问返回true；URL无效或 robots.txt 获取失败时返回false
    pub async fn is_allowed(&self, url_str: &str, user_agent: &str) -> bool {
        let url = match Url::parse(url_str) {
            Ok(url) => url,
            Err(e) => {
                warn!("Refusing to check invalid URL {}: {}", url_str, e);
                return false;
            }
        };

        match self.rules_for(&url).await.as_ref() {
            RobotsRules::AllowAll => true,
            RobotsRules::DisallowAll => false,
            RobotsRules::Rules(content) => {
                let mut matcher = DefaultMatcher::default();
                matcher.one_agent_allowed_by_robots(content, user_agent, url.as_str())
            }
        }
    }

    /// 获取适用于该爬虫标识的 Crawl-delay
    pub async fn crawl_delay(&self, url_str: &str, user_agent: &str) -> Option<Duration> {
        let url = Url::parse(url_str).ok()?;
        match self.rules_for(&url).await.as_ref() {
            RobotsRules::Rules(content) => parse_crawl_delay(content, user_agent),
            _ => None,
        }
    }

    /// 获取规则（带缓存）
    async fn rules_for(&self, url: &Url) -> Arc<RobotsRules> {
        let origin = url.origin().ascii_serialization();

        // Hold the lock across the fetch so one origin is fetched exactly once
        let mut cache = self.cache.lock().await;
        if let Some(rules) = cache.get(&origin) {
            return rules.clone();
        }

        let robots_url = format!("{}/robots.txt", origin);
        let request = FetchRequest::get(robots_url.as_str()).with_timeout(self.timeout);
        let rules = match fetch_with_retry(
            self.engine.as_ref(),
            &self.rate_limiter,
            &self.retry_policy,
            &request,
        )
        .await
        {
            Ok(page) => {
                debug!("Loaded robots.txt from {} ({} bytes)", robots_url, page.body.len());
                RobotsRules::Rules(page.body)
            }
            Err(e) if matches!(e.status(), Some(404) | Some(410)) => {
                debug!("No robots.txt at {}, allowing all paths", robots_url);
                RobotsRules::AllowAll
            }
            Err(e) => {
                warn!(
                    "Failed to fetch robots.txt from {}: {}; treating site as disallowed",
                    robots_url, e
                );
                RobotsRules::DisallowAll
            }
        };

        let rules = Arc::new(rules);
        cache.insert(origin, rules.clone());
        rules
    }
}

/// 解析Crawl-delay指令
///
/// 找到匹配的 User-agent 分组后读取其中的 Crawl-delay；
/// 具体分组优先于 `*` 分组。
fn parse_crawl_delay(content: &str, user_agent: &str) -> Option<Duration> {
    let mut current_agent_matched = false;
    let mut delay: Option<f64> = None;
    let mut specific_agent_found = false;
    let agent_token = product_token(user_agent);

    for line in content.lines() {
        let line = line.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }

        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().to_lowercase();
        let value = value.trim();

        if key == "user-agent" {
            if value == "*" {
                current_agent_matched = !specific_agent_found;
            } else if !agent_token.is_empty()
                && product_token(value).eq_ignore_ascii_case(agent_token)
            {
                if !specific_agent_found {
                    // Reset delay if we found a more specific agent
                    delay = None;
                }
                current_agent_matched = true;
                specific_agent_found = true;
            } else {
                current_agent_matched = false;
            }
        } else if key == "crawl-delay" && current_agent_matched {
            if let Ok(d) = value.parse::<f64>() {
                if d.is_finite() && d >= 0.0 {
                    delay = Some(d);
                }
            }
        }
    }

    delay.map(|d| {
        Duration::try_from_secs_f64(d)
            .ok()
            .filter(|delay| *delay <= MAX_INTERVAL)
            .unwrap_or_else(|| {
                warn!(crawl_delay = d, "Crawl-delay out of range, capping");
                MAX_INTERVAL
            })
    })
}

/// User-agent 的产品标识：开头的字母、`-` 和 `_`，如 `prowl/1.0` 中的 `prowl`
fn product_token(agent: &str) -> &str {
    let agent = agent.trim();
    let end = agent
        .find(|c: char| !(c.is_ascii_alphabetic() || c == '-' || c == '_'))
        .unwrap_or(agent.len());
    &agent[..end]
}
