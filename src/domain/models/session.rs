// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 登录凭据
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// 会话的可序列化形式，用于跨运行复用登录状态
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub cookies: BTreeMap<String, String>,
    pub authenticated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// 认证会话
///
/// 只由会话管理器创建和失效；其他组件只读
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    cookies: BTreeMap<String, String>,
    authenticated_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    live: bool,
}

impl Session {
    pub fn new(cookies: BTreeMap<String, String>, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            cookies,
            authenticated_at: now,
            expires_at: now + ttl,
            live: true,
        }
    }

    pub fn from_state(state: SessionState) -> Self {
        Self {
            cookies: state.cookies,
            authenticated_at: state.authenticated_at,
            expires_at: state.expires_at,
            live: true,
        }
    }

    pub fn to_state(&self) -> SessionState {
        SessionState {
            cookies: self.cookies.clone(),
            authenticated_at: self.authenticated_at,
            expires_at: self.expires_at,
        }
    }

    pub fn cookies(&self) -> &BTreeMap<String, String> {
        &self.cookies
    }

    pub fn authenticated_at(&self) -> DateTime<Utc> {
        self.authenticated_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// 会话在给定时间是否仍然有效
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.live && now < self.expires_at
    }

    pub(crate) fn invalidate(&mut self) {
        self.live = false;
    }
}
