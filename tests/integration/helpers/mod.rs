// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use prowl::application::use_cases::crawl_products::CrawlProductsUseCase;
use prowl::config::settings::Settings;
use prowl::domain::models::site::SiteEndpoints;
use prowl::engines::polite_fetcher::PoliteFetcher;
use prowl::engines::reqwest_engine::ReqwestEngine;
use prowl::infrastructure::storage::LocalStorage;
use prowl::utils::rate_limiter::RateLimiter;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const LOGIN_FORM: &str = r#"<html><body>
<form name="signIn" method="post" action="/ap/signin">
  <input type="hidden" name="appActionToken" value="token123">
  <input type="email" name="email">
  <input type="password" name="password">
</form>
</body></html>"#;

/// 模拟的零售站点与一个临时数据目录
#[allow(dead_code)]
pub struct TestSite {
    pub server: MockServer,
    pub data_dir: TempDir,
}

#[allow(dead_code)]
impl TestSite {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
            data_dir: tempfile::tempdir().expect("temp dir"),
        }
    }

    /// 指向模拟站点、无延迟、无退避的配置
    pub fn settings(&self) -> Settings {
        let mut settings = Settings::default();
        settings.site.base_url = self.server.uri();
        settings.crawler.delay_secs = 0.0;
        settings.crawler.max_retries = 2;
        settings.crawler.retry_backoff_ms = 0;
        settings.crawler.timeout_secs = 5;
        settings.storage.data_dir = self.data_dir.path().to_string_lossy().to_string();
        settings.auth.email = Some("buyer@example.com".to_string());
        settings.auth.password = Some("hunter2".to_string());
        settings
    }

    pub fn use_case(&self, settings: &Settings) -> CrawlProductsUseCase<LocalStorage> {
        let engine = Arc::new(ReqwestEngine::new(&settings.crawler.user_agent));
        let rate_limiter = Arc::new(RateLimiter::from_secs_f64(settings.crawler.delay_secs));
        let fetcher = Arc::new(PoliteFetcher::from_settings(
            engine,
            rate_limiter,
            &settings.crawler,
        ));
        let endpoints = Arc::new(SiteEndpoints::from_settings(&settings.site).expect("endpoints"));
        let repository = Arc::new(LocalStorage::from_settings(&settings.storage));
        CrawlProductsUseCase::new(fetcher, endpoints, repository, settings)
    }

    /// 已收到请求的路径，按到达顺序
    pub async fn requested_paths(&self) -> Vec<String> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .map(|r| r.url.path().to_string())
            .collect()
    }

    pub async fn serve_robots(&self, body: &str) {
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&self.server)
            .await;
    }

    /// 登录页返回表单；`grant` 为真时提交后设置认证 Cookie
    pub async fn serve_login(&self, grant: bool) {
        Mock::given(method("GET"))
            .and(path("/ap/signin"))
            .respond_with(html(LOGIN_FORM))
            .mount(&self.server)
            .await;

        let response = if grant {
            html("<html><body>Welcome back</body></html>")
                .insert_header("set-cookie", "session-token=tok; Path=/")
        } else {
            html("<html><body>There was a problem</body></html>")
        };
        Mock::given(method("POST"))
            .and(path("/ap/signin"))
            .respond_with(response)
            .mount(&self.server)
            .await;
    }
}

pub fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/html; charset=utf-8")
        .set_body_string(body)
}

/// 构造搜索结果页：(商品标识, 标题, 评分)
pub fn search_page(products: &[(&str, &str, f32)], has_next: bool) -> String {
    let mut body = String::from("<html><body><div class=\"s-main-slot\">");
    for (id, title, rating) in products {
        body.push_str(&format!(
            r#"<div data-component-type="s-search-result" data-asin="{id}">
                 <h2><a href="/dp/{id}"><span>{title}</span></a></h2>
                 <span class="a-icon-alt">{rating} out of 5 stars</span>
                 <span aria-label="1,024 ratings"></span>
                 <span class="a-price"><span class="a-offscreen">$49.99</span></span>
               </div>"#
        ));
    }
    body.push_str("</div>");
    if has_next {
        body.push_str(r#"<a class="s-pagination-next" href="/s?page=next">Next</a>"#);
    }
    body.push_str("</body></html>");
    body
}

/// 构造评论页
pub fn review_page(product_id: &str, count: usize, has_next: bool) -> String {
    let mut body = String::from("<html><body><div id=\"cm_cr-review_list\">");
    for i in 0..count {
        body.push_str(&format!(
            r#"<div data-hook="review">
                 <span class="a-profile-name">Reviewer {i}</span>
                 <i data-hook="review-star-rating"><span class="a-icon-alt">5.0 out of 5 stars</span></i>
                 <span data-hook="review-body"><span>Review {i} of {product_id}</span></span>
               </div>"#
        ));
    }
    body.push_str("</div>");
    if has_next {
        body.push_str(r#"<ul class="a-pagination"><li class="a-last"><a href="?pageNumber=next">Next page</a></li></ul>"#);
    }
    body.push_str("</body></html>");
    body
}
