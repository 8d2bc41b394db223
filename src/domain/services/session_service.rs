// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::Utc;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::domain::models::session::{Credentials, Session, SessionState};
use crate::domain::models::site::SiteEndpoints;
use crate::domain::services::parser;
use crate::engines::polite_fetcher::PoliteFetcher;
use crate::engines::traits::FetchRequest;
use crate::utils::errors::{AuthError, CrawlError, FetchError};

#[derive(Default)]
struct SessionSlot {
    session: Option<Session>,
    failure: Option<AuthError>,
    login_attempted: bool,
}

/// 会话服务
///
/// 每次运行最多登录一次。登录成功的判据是认证 Cookie 出现；
/// 失败会被记住，同一次运行中后续调用直接返回同一个错误。
/// 本服务不读写文件，持久化由调用方通过 [`SessionService::save_state`] 完成。
pub struct SessionService {
    fetcher: Arc<PoliteFetcher>,
    endpoints: Arc<SiteEndpoints>,
    auth_cookie: String,
    ttl: chrono::Duration,
    slot: Mutex<SessionSlot>,
}

impl SessionService {
    pub fn new(
        fetcher: Arc<PoliteFetcher>,
        endpoints: Arc<SiteEndpoints>,
        auth_cookie: impl Into<String>,
        ttl: chrono::Duration,
    ) -> Self {
        Self {
            fetcher,
            endpoints,
            auth_cookie: auth_cookie.into(),
            ttl,
            slot: Mutex::new(SessionSlot::default()),
        }
    }

    /// 使用之前保存的会话状态
    pub fn with_restored(mut self, state: SessionState) -> Self {
        self.slot.get_mut().session = Some(Session::from_state(state));
        self
    }

    /// 会话是否可用：未失效、未过期且带有认证 Cookie
    pub fn is_valid(&self, session: &Session) -> bool {
        session.is_live(Utc::now()) && session.cookies().contains_key(&self.auth_cookie)
    }

    /// 确保已登录
    ///
    /// # 参数
    ///
    /// * `credentials` - 登录凭据；缓存的会话有效时不会用到
    pub async fn ensure_authenticated(
        &self,
        credentials: Option<&Credentials>,
    ) -> Result<Session, AuthError> {
        let mut slot = self.slot.lock().await;

        if let Some(session) = slot.session.as_ref().filter(|s| self.is_valid(s)) {
            return Ok(session.clone());
        }
        if let Some(failure) = &slot.failure {
            return Err(failure.clone());
        }
        if slot.login_attempted {
            return Err(AuthError::SessionInvalid);
        }

        let Some(credentials) = credentials else {
            warn!("No credentials configured, reviews are unavailable");
            slot.failure = Some(AuthError::MissingCredentials);
            return Err(AuthError::MissingCredentials);
        };

        slot.login_attempted = true;
        match self.login(credentials).await {
            Ok(session) => {
                info!(expires_at = %session.expires_at(), "Logged in");
                slot.session = Some(session.clone());
                Ok(session)
            }
            Err(e) => {
                warn!(error = %e, "Login failed, reviews are unavailable for this run");
                slot.session = None;
                slot.failure = Some(e.clone());
                Err(e)
            }
        }
    }

    /// 标记当前会话失效（例如抓取评论时被重定向到登录页）
    pub async fn invalidate(&self) {
        if let Some(session) = self.slot.lock().await.session.as_mut() {
            session.invalidate();
        }
    }

    /// 导出当前有效会话，供调用方持久化
    pub async fn save_state(&self) -> Option<SessionState> {
        self.slot
            .lock()
            .await
            .session
            .as_ref()
            .filter(|s| self.is_valid(s))
            .map(Session::to_state)
    }

    async fn login(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        let login_url = self
            .endpoints
            .login_url()
            .map_err(|e| AuthError::Unavailable(e.to_string()))?;

        let page = self
            .fetcher
            .get(login_url.as_str())
            .await
            .map_err(|e| AuthError::Unavailable(e.to_string()))?;
        let form = parser::parse_login_form(&page).ok_or(AuthError::LoginFormNotFound)?;

        let mut fields = form.hidden_fields;
        fields.push((form.email_field, credentials.email.clone()));
        fields.push((form.password_field, credentials.password.clone()));

        let request = FetchRequest::post_form(form.action, fields).with_cookies(&page.cookies);
        let response = self.fetcher.fetch(request).await.map_err(|e| match e {
            CrawlError::Fetch(FetchError::Status { status, .. })
                if status == 401 || status == 403 =>
            {
                AuthError::Rejected(format!("HTTP {}", status))
            }
            other => AuthError::Unavailable(other.to_string()),
        })?;

        let mut cookies = page.cookies;
        cookies.extend(response.cookies);
        if !cookies.contains_key(&self.auth_cookie) {
            return Err(AuthError::Rejected(format!(
                "auth cookie `{}` was not set",
                self.auth_cookie
            )));
        }

        Ok(Session::new(cookies, self.ttl))
    }
}
