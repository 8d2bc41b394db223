// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use prowl::domain::models::crawl::{CrawlRequest, CrawlState};
use prowl::domain::repositories::result_repository::ResultRepository;
use prowl::infrastructure::storage::LocalStorage;
use prowl::utils::errors::CrawlError;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use super::helpers::{html, search_page, TestSite};

fn request(keyword: &str, min_rating: f32, max_results: usize, crawl_reviews: bool) -> CrawlRequest {
    CrawlRequest {
        keyword: keyword.to_string(),
        min_rating,
        max_results,
        crawl_reviews,
        max_review_pages: 2,
    }
}

/// 搜索“wireless headphones”，不抓评论：结果按评分过滤、截断并写入文件
#[tokio::test]
async fn test_wireless_headphones_without_reviews() {
    let site = TestSite::start().await;
    Mock::given(method("GET"))
        .and(path("/s"))
        .and(query_param("k", "wireless headphones"))
        .and(query_param("page", "1"))
        .respond_with(html(&search_page(
            &[
                ("B0WH000001", "Noise Cancelling Headphones", 4.6),
                ("B0WH000002", "Cheap Earbuds", 3.1),
                ("B0WH000003", "Sport Earbuds", 4.2),
                ("B0WH000004", "Studio Monitors", 4.8),
                ("B0WH000005", "Kids Headphones", 4.0),
                ("B0WH000006", "Gaming Headset", 2.9),
            ],
            false,
        )))
        .mount(&site.server)
        .await;

    let settings = site.settings();
    let mut use_case = site.use_case(&settings);

    let outcome = use_case
        .run(request("wireless headphones", 4.0, 3, false))
        .await
        .expect("crawl succeeds");

    let products = &outcome.result.products;
    assert_eq!(products.len(), 3);
    assert!(products.iter().all(|p| p.rating.unwrap_or(0.0) >= 4.0));
    assert!(products.iter().all(|p| p.reviews.is_empty()));
    let ids: Vec<&str> = products.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["B0WH000001", "B0WH000003", "B0WH000004"]);
    assert_eq!(products[0].review_count, 1024);
    assert_eq!(products[0].price.as_ref().map(|p| p.amount), Some(49.99));

    assert_eq!(use_case.state(), CrawlState::Saved);
    assert!(!site
        .requested_paths()
        .await
        .iter()
        .any(|p| p.starts_with("/product-reviews") || p.starts_with("/ap/signin")));

    // File name follows products_<YYYYMMDD>_<HHMMSS>.json
    let file_name = outcome.path.file_name().unwrap().to_string_lossy().to_string();
    assert!(file_name.starts_with("products_"));
    assert!(file_name.ends_with(".json"));
    assert_eq!(file_name.len(), "products_20240101_120000.json".len());
    assert!(outcome.path.starts_with(site.data_dir.path()));

    let storage = LocalStorage::from_settings(&settings.storage);
    let loaded = storage.load(&outcome.path).await.expect("file reads back");
    assert_eq!(&loaded, products);
}

/// 第二页失败时保留第一页的结果并正常保存
#[tokio::test]
async fn test_second_page_failure_keeps_first_page() {
    let site = TestSite::start().await;
    Mock::given(method("GET"))
        .and(path("/s"))
        .and(query_param("page", "1"))
        .respond_with(html(&search_page(
            &[
                ("B0PG000001", "First", 4.5),
                ("B0PG000002", "Second", 4.4),
            ],
            true,
        )))
        .mount(&site.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/s"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&site.server)
        .await;

    let settings = site.settings();
    let mut use_case = site.use_case(&settings);

    let outcome = use_case
        .run(request("cable", 4.0, 5, false))
        .await
        .expect("partial results are saved");

    assert_eq!(outcome.result.products.len(), 2);
    assert_eq!(use_case.state(), CrawlState::Saved);

    // Page 2 is retried up to max_retries attempts
    let page_two_attempts = site
        .server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.query().is_some_and(|q| q.contains("page=2")))
        .count();
    assert_eq!(page_two_attempts, settings.crawler.max_retries as usize);
}

/// 第一页就失败时整次爬取失败，不写文件
#[tokio::test]
async fn test_first_page_failure_fails_the_run() {
    let site = TestSite::start().await;
    Mock::given(method("GET"))
        .and(path("/s"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&site.server)
        .await;

    let settings = site.settings();
    let mut use_case = site.use_case(&settings);

    let err = use_case
        .run(request("cable", 4.0, 3, false))
        .await
        .expect_err("run fails");

    assert!(matches!(err, CrawlError::Fetch(_)));
    assert_eq!(use_case.state(), CrawlState::Failed);
    assert_eq!(std::fs::read_dir(site.data_dir.path()).unwrap().count(), 0);
}

/// 跨页重复的商品只保留第一次出现
#[tokio::test]
async fn test_duplicates_across_pages_are_dropped() {
    let site = TestSite::start().await;
    Mock::given(method("GET"))
        .and(path("/s"))
        .and(query_param("page", "1"))
        .respond_with(html(&search_page(
            &[("B0DUP00001", "Original", 4.5), ("B0DUP00002", "Other", 4.5)],
            true,
        )))
        .mount(&site.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/s"))
        .and(query_param("page", "2"))
        .respond_with(html(&search_page(
            &[("B0DUP00001", "Duplicate", 4.9), ("B0DUP00003", "Third", 4.5)],
            false,
        )))
        .mount(&site.server)
        .await;

    let settings = site.settings();
    let mut use_case = site.use_case(&settings);

    let outcome = use_case.run(request("lamp", 0.0, 5, false)).await.unwrap();

    let titles: Vec<&str> = outcome
        .result
        .products
        .iter()
        .map(|p| p.title.as_str())
        .collect();
    assert_eq!(titles, vec!["Original", "Other", "Third"]);
    assert_eq!(outcome.result.metadata.products_found, 3);
}

/// 没有商品满足评分要求时仍然写出空数组
#[tokio::test]
async fn test_no_matching_products_saves_empty_array() {
    let site = TestSite::start().await;
    Mock::given(method("GET"))
        .and(path("/s"))
        .respond_with(html(&search_page(&[("B0LOW00001", "Meh", 2.0)], false)))
        .mount(&site.server)
        .await;

    let settings = site.settings();
    let mut use_case = site.use_case(&settings);

    let outcome = use_case.run(request("lamp", 4.5, 3, true)).await.unwrap();

    assert!(outcome.result.products.is_empty());
    let written = std::fs::read_to_string(&outcome.path).unwrap();
    assert_eq!(serde_json::from_str::<serde_json::Value>(&written).unwrap(), serde_json::json!([]));
    // Nothing to review, so no login attempt
    assert!(!site.requested_paths().await.iter().any(|p| p == "/ap/signin"));
}
