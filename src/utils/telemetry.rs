// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 初始化日志
///
/// 过滤规则取自 `RUST_LOG`，默认 `info,prowl=debug`；
/// `PROWL_LOG_FORMAT=json` 时输出 JSON 格式日志。重复初始化会被忽略。
///
/// 返回本次调用是否安装了全局订阅者。
pub fn init_telemetry() -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,prowl=debug".into());
    let json = std::env::var("PROWL_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    let result = if json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };

    if result.is_err() {
        tracing::debug!("Telemetry already initialized");
    }
    result.is_ok()
}
