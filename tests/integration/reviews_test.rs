// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::Utc;
use prowl::domain::models::crawl::{CrawlRequest, CrawlState};
use prowl::domain::models::session::SessionState;
use std::collections::BTreeMap;
use wiremock::matchers::{header_regex, method, path, path_regex, query_param};
use wiremock::Mock;

use super::helpers::{html, review_page, search_page, TestSite};

async fn serve_search(site: &TestSite) {
    Mock::given(method("GET"))
        .and(path("/s"))
        .respond_with(html(&search_page(
            &[
                ("B0REV00001", "Over-ear Headphones", 4.7),
                ("B0REV00002", "Earbuds", 4.3),
                ("B0REV00003", "Budget Headphones", 3.0),
            ],
            false,
        )))
        .mount(&site.server)
        .await;
}

async fn serve_reviews(site: &TestSite, product_id: &str) {
    // Every page advertises a next page, so only max_review_pages bounds the crawl
    Mock::given(method("GET"))
        .and(path(format!("/product-reviews/{}", product_id)))
        .and(header_regex("cookie", "session-token=tok"))
        .respond_with(html(&review_page(product_id, 3, true)))
        .mount(&site.server)
        .await;
}

fn request(max_review_pages: u32) -> CrawlRequest {
    CrawlRequest {
        keyword: "headphones".to_string(),
        min_rating: 4.0,
        max_results: 2,
        crawl_reviews: true,
        max_review_pages,
    }
}

/// 登录成功后评论随会话 Cookie 抓取，页数不超过上限
#[tokio::test]
async fn test_reviews_are_bounded_by_max_pages() {
    let site = TestSite::start().await;
    serve_search(&site).await;
    site.serve_login(true).await;
    serve_reviews(&site, "B0REV00001").await;
    serve_reviews(&site, "B0REV00002").await;

    let settings = site.settings();
    let mut use_case = site.use_case(&settings);

    let outcome = use_case.run(request(2)).await.expect("crawl succeeds");

    let products = &outcome.result.products;
    assert_eq!(products.len(), 2);
    for product in products {
        assert_eq!(product.reviews.len(), 6);
        assert!(product.reviews.iter().all(|r| r.product_id == product.id));
        assert_eq!(product.reviews[0].author, "Reviewer 0");
        assert_eq!(product.reviews[0].rating, Some(5.0));
    }
    assert!(outcome.result.metadata.reviews_available);
    assert_eq!(outcome.result.metadata.reviews_collected, 12);

    let review_requests = site
        .server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.url.path().starts_with("/product-reviews/"))
        .collect::<Vec<_>>();
    assert_eq!(review_requests.len(), 4);
    assert!(review_requests
        .iter()
        .all(|r| r.url.query().is_some_and(|q| !q.contains("pageNumber=3"))));
    // The filtered-out product is never reviewed
    assert!(!review_requests
        .iter()
        .any(|r| r.url.path().ends_with("B0REV00003")));

    let state = use_case.session_state().await.expect("session to persist");
    assert_eq!(state.cookies.get("session-token").map(String::as_str), Some("tok"));
}

/// 登录失败：评论不可用，但结果照常保存
#[tokio::test]
async fn test_auth_failure_saves_products_without_reviews() {
    let site = TestSite::start().await;
    serve_search(&site).await;
    site.serve_login(false).await;

    let settings = site.settings();
    let mut use_case = site.use_case(&settings);

    let outcome = use_case.run(request(2)).await.expect("crawl still succeeds");

    assert_eq!(use_case.state(), CrawlState::Saved);
    assert_eq!(outcome.result.products.len(), 2);
    assert!(outcome.result.products.iter().all(|p| p.reviews.is_empty()));
    assert!(!outcome.result.metadata.reviews_available);
    assert!(use_case.history().contains(&CrawlState::Authenticating));
    assert!(!use_case.history().contains(&CrawlState::CrawlingReviews));

    let paths = site.requested_paths().await;
    assert!(!paths.iter().any(|p| p.starts_with("/product-reviews/")));
    // One GET for the form, one POST for the credentials
    assert_eq!(paths.iter().filter(|p| *p == "/ap/signin").count(), 2);
    assert!(use_case.session_state().await.is_none());
}

/// 没有配置凭据时直接跳过评论
#[tokio::test]
async fn test_missing_credentials_skip_login() {
    let site = TestSite::start().await;
    serve_search(&site).await;

    let mut settings = site.settings();
    settings.auth.email = None;
    let mut use_case = site.use_case(&settings);

    let outcome = use_case.run(request(1)).await.unwrap();

    assert!(outcome.result.products.iter().all(|p| p.reviews.is_empty()));
    assert!(!site.requested_paths().await.iter().any(|p| p == "/ap/signin"));
}

/// 复用保存的会话时不再登录
#[tokio::test]
async fn test_restored_session_is_reused() {
    let site = TestSite::start().await;
    serve_search(&site).await;
    serve_reviews(&site, "B0REV00001").await;
    serve_reviews(&site, "B0REV00002").await;

    let now = Utc::now();
    let saved = SessionState {
        cookies: BTreeMap::from([("session-token".to_string(), "tok".to_string())]),
        authenticated_at: now,
        expires_at: now + chrono::Duration::hours(12),
    };

    let settings = site.settings();
    let mut use_case = site.use_case(&settings).with_restored_session(saved);

    let outcome = use_case.run(request(1)).await.unwrap();

    assert!(outcome.result.products.iter().all(|p| p.reviews.len() == 3));
    assert!(!site.requested_paths().await.iter().any(|p| p == "/ap/signin"));
}

/// 评论页被重定向到登录页：会话失效，剩余商品不再抓取评论
#[tokio::test]
async fn test_login_redirect_stops_review_crawl() {
    let site = TestSite::start().await;
    serve_search(&site).await;
    site.serve_login(true).await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/product-reviews/"))
        .and(query_param("pageNumber", "1"))
        .respond_with(html(super::helpers::LOGIN_FORM))
        .mount(&site.server)
        .await;

    let settings = site.settings();
    let mut use_case = site.use_case(&settings);

    let outcome = use_case.run(request(2)).await.unwrap();

    assert_eq!(use_case.state(), CrawlState::Saved);
    assert!(outcome.result.products.iter().all(|p| p.reviews.is_empty()));
    assert!(!outcome.result.metadata.reviews_available);
    let review_requests = site
        .requested_paths()
        .await
        .into_iter()
        .filter(|p| p.starts_with("/product-reviews/"))
        .count();
    assert_eq!(review_requests, 1);
    assert!(use_case.session_state().await.is_none());
}
