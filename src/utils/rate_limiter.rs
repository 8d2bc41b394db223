// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

/// 最小间隔的上限，超出的配置或 Crawl-delay 会被截断
pub const MAX_INTERVAL: Duration = Duration::from_secs(3600);

/// 限速器内部状态
struct LimiterState {
    /// 两次请求之间的最小间隔
    min_interval: Duration,

    /// 上一次放行请求的时间
    last_permitted: Option<Instant>,
}

/// 速率限制器
///
/// 整个爬取过程共享同一个时钟：任意两次放行的请求之间至少间隔
/// `min_interval`，没有突发额度。实例通过 `Arc` 注入到每个会发起
/// 网络请求的组件中。
///
/// 计时基于 `tokio::time`，测试中可以用暂停的时钟精确控制。
pub struct RateLimiter {
    state: Mutex<LimiterState>,
}

impl RateLimiter {
    /// 创建新的速率限制器实例
    ///
    /// # 参数
    ///
    /// * `min_interval` - 两次请求之间的最小间隔
    pub fn new(min_interval: Duration) -> Self {
        Self {
            state: Mutex::new(LimiterState {
                min_interval: cap_interval(min_interval),
                last_permitted: None,
            }),
        }
    }

    /// 从秒数创建，负数或非有限值按 0 处理，过大的值截断到 [`MAX_INTERVAL`]
    pub fn from_secs_f64(secs: f64) -> Self {
        let interval = if secs.is_finite() {
            Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or(MAX_INTERVAL)
        } else {
            Duration::ZERO
        };
        Self::new(interval)
    }

    /// 等待轮到下一次请求
    ///
    /// 在每次对外请求之前调用。等待期间持有内部锁，因此即使被并发调用
    /// 也会依次放行。
    pub async fn wait_turn(&self) {
        let mut state = self.state.lock().await;
        if let Some(last) = state.last_permitted {
            let ready_at = last + state.min_interval;
            let now = Instant::now();
            if ready_at > now {
                debug!(wait_ms = (ready_at - now).as_millis() as u64, "Rate limiter waiting");
                tokio::time::sleep_until(ready_at).await;
            }
        }
        state.last_permitted = Some(Instant::now());
    }

    /// 当前最小间隔
    pub async fn min_interval(&self) -> Duration {
        self.state.lock().await.min_interval
    }

    /// 提高最小间隔（例如遵守 robots.txt 的 Crawl-delay），只增不减
    pub async fn raise_interval(&self, interval: Duration) {
        let interval = cap_interval(interval);
        let mut state = self.state.lock().await;
        if interval > state.min_interval {
            debug!(
                from_ms = state.min_interval.as_millis() as u64,
                to_ms = interval.as_millis() as u64,
                "Raising rate limiter interval"
            );
            state.min_interval = interval;
        }
    }
}

fn cap_interval(interval: Duration) -> Duration {
    if interval > MAX_INTERVAL {
        warn!(
            requested_secs = interval.as_secs(),
            max_secs = MAX_INTERVAL.as_secs(),
            "Rate limiter interval capped"
        );
        MAX_INTERVAL
    } else {
        interval
    }
}
