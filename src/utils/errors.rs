// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use thiserror::Error;

use crate::domain::repositories::result_repository::StorageError;

/// 抓取层错误类型
///
/// 只有重试耗尽或遇到不可重试的响应时才会产生
#[derive(Error, Debug, Clone)]
pub enum FetchError {
    /// 可重试错误在重试耗尽后仍然失败
    #[error("Fetch of {url} failed after {attempts} attempts: {last_error}")]
    Exhausted {
        url: String,
        attempts: u32,
        last_error: String,
    },

    /// 不可重试的HTTP状态码
    #[error("Fetch of {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// 不可重试的引擎错误
    #[error("Fetch of {url} failed: {message}")]
    Engine { url: String, message: String },
}

impl FetchError {
    /// 返回失败请求的URL
    pub fn url(&self) -> &str {
        match self {
            FetchError::Exhausted { url, .. }
            | FetchError::Status { url, .. }
            | FetchError::Engine { url, .. } => url,
        }
    }

    /// 若错误由HTTP状态码引起，返回该状态码
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// 认证错误类型
///
/// 由编排器归类为“评论不可用”，不会中断整个爬取
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AuthError {
    #[error("未配置登录凭据")]
    MissingCredentials,

    #[error("登录页面中未找到登录表单")]
    LoginFormNotFound,

    #[error("登录被拒绝: {0}")]
    Rejected(String),

    #[error("登录页面不可用: {0}")]
    Unavailable(String),

    #[error("会话无效或已过期")]
    SessionInvalid,
}

/// 爬取错误类型
///
/// 覆盖抓取、解析、认证、robots 策略与存储五类错误
#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("抓取错误: {0}")]
    Fetch(#[from] FetchError),

    #[error("解析错误: {0}")]
    Parse(String),

    #[error("认证错误: {0}")]
    Auth(#[from] AuthError),

    #[error("robots.txt 禁止访问: {url}")]
    Policy { url: String },

    #[error("存储错误: {0}")]
    Storage(#[from] StorageError),

    #[error("无效参数: {0}")]
    Validation(String),
}

impl CrawlError {
    /// 是否为 robots.txt 策略拒绝
    pub fn is_policy(&self) -> bool {
        matches!(self, CrawlError::Policy { .. })
    }
}
