// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::io::{self, BufRead, Write};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

use prowl::application::use_cases::crawl_products::{CrawlOutcome, CrawlProductsUseCase};
use prowl::config::settings::{EngineKind, Settings};
use prowl::domain::models::crawl::CrawlRequest;
use prowl::domain::models::site::SiteEndpoints;
use prowl::engines::browser_engine::BrowserEngine;
use prowl::engines::polite_fetcher::PoliteFetcher;
use prowl::engines::reqwest_engine::ReqwestEngine;
use prowl::engines::traits::ScraperEngine;
use prowl::infrastructure::session_store::SessionStore;
use prowl::infrastructure::storage::LocalStorage;
use prowl::utils::errors::CrawlError;
use prowl::utils::rate_limiter::RateLimiter;
use prowl::utils::telemetry;

/// 主函数
///
/// 读取交互输入，执行一次爬取并打印结果摘要
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init_telemetry();

    let settings = Settings::new()?;
    info!(engine = ?settings.engine.kind, base_url = %settings.site.base_url, "Configuration loaded");

    println!("Product Crawler");
    println!("{}", "=".repeat(30));
    let Some(request) = prompt_request()? else {
        println!("No keyword provided. Exiting.");
        return Ok(());
    };

    let engine: Arc<dyn ScraperEngine> = match settings.engine.kind {
        EngineKind::Http => Arc::new(ReqwestEngine::new(&settings.crawler.user_agent)),
        EngineKind::Browser => Arc::new(
            BrowserEngine::launch(
                &settings.crawler.user_agent,
                settings.engine.remote_debugging_url.as_deref(),
            )
            .await?,
        ),
    };
    info!(engine = engine.name(), "Fetch backend ready");

    let outcome = run(engine.clone(), &settings, request).await;
    engine.shutdown().await;

    let outcome = outcome?;
    print_summary(&outcome);
    Ok(())
}

async fn run(
    engine: Arc<dyn ScraperEngine>,
    settings: &Settings,
    request: CrawlRequest,
) -> Result<CrawlOutcome, CrawlError> {
    let rate_limiter = Arc::new(RateLimiter::from_secs_f64(settings.crawler.delay_secs));
    let fetcher = Arc::new(PoliteFetcher::from_settings(
        engine,
        rate_limiter,
        &settings.crawler,
    ));
    let endpoints = Arc::new(
        SiteEndpoints::from_settings(&settings.site)
            .map_err(|e| CrawlError::Validation(format!("invalid site.base_url: {}", e)))?,
    );
    let repository = Arc::new(LocalStorage::from_settings(&settings.storage));
    let session_store = SessionStore::new(&settings.auth.session_file);

    let mut use_case = CrawlProductsUseCase::new(fetcher, endpoints, repository, settings);
    if let Some(state) = session_store.load().await {
        info!(path = %session_store.path().display(), "Restored saved session");
        use_case = use_case.with_restored_session(state);
    }

    let outcome = use_case.run(request).await;

    if let Some(state) = use_case.session_state().await {
        if let Err(e) = session_store.save(&state).await {
            warn!(error = %e, "Failed to save session");
        }
    }

    outcome
}

fn prompt_request() -> io::Result<Option<CrawlRequest>> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let defaults = CrawlRequest::default();

    let keyword = prompt(&mut input, "Enter search keyword: ")?;
    if keyword.is_empty() {
        return Ok(None);
    }

    let min_rating = prompt_parsed(
        &mut input,
        "Enter minimum rating (0-5, default 4.0): ",
        defaults.min_rating,
    )?;
    let max_results = prompt_parsed(
        &mut input,
        "Enter max results (default 3): ",
        defaults.max_results,
    )?;
    let answer = prompt(&mut input, "Crawl reviews? (y/n, default y): ")?.to_lowercase();
    let crawl_reviews = matches!(answer.as_str(), "" | "y" | "yes");
    let max_review_pages = if crawl_reviews {
        prompt_parsed(
            &mut input,
            "Max review pages per product (default 2): ",
            defaults.max_review_pages,
        )?
    } else {
        0
    };

    let request = CrawlRequest {
        keyword,
        min_rating,
        max_results,
        crawl_reviews,
        max_review_pages,
    };

    println!();
    println!("Searching for: '{}'", request.keyword);
    println!("Minimum rating: {}", request.min_rating);
    println!("Max results: {}", request.max_results);
    println!("Crawl reviews: {}", request.crawl_reviews);
    if request.crawl_reviews {
        println!("Max review pages per product: {}", request.max_review_pages);
    }
    println!("{}", "-".repeat(30));

    Ok(Some(request))
}

fn prompt(input: &mut impl BufRead, message: &str) -> io::Result<String> {
    print!("{}", message);
    io::stdout().flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn prompt_parsed<T: FromStr + std::fmt::Display>(
    input: &mut impl BufRead,
    message: &str,
    default: T,
) -> io::Result<T> {
    let answer = prompt(input, message)?;
    if answer.is_empty() {
        return Ok(default);
    }
    match answer.parse() {
        Ok(value) => Ok(value),
        Err(_) => {
            println!("Invalid input '{}', using default {}", answer, default);
            Ok(default)
        }
    }
}

fn print_summary(outcome: &CrawlOutcome) {
    let products = &outcome.result.products;
    let metadata = &outcome.result.metadata;

    println!(
        "Found {} products for '{}' (saved to {})",
        products.len(),
        metadata.keyword,
        outcome.path.display()
    );
    for (i, product) in products.iter().enumerate() {
        println!("{}. {}", i + 1, product.title);
        match product.rating {
            Some(rating) => println!("   Rating: {:.1}", rating),
            None => println!("   Rating: N/A"),
        }
        match &product.price {
            Some(price) => println!("   Price: {:.2} {}", price.amount, price.currency),
            None => println!("   Price: N/A"),
        }
        if let Some(sample) = product.reviews.first() {
            println!("   Reviews: {} reviews crawled", product.reviews.len());
            println!(
                "   Sample review: '{}' by {}",
                sample.title.as_deref().unwrap_or("No title"),
                sample.author
            );
        }
        println!();
    }
    if metadata.min_rating > 0.0 && products.is_empty() {
        println!("No products met the minimum rating of {}", metadata.min_rating);
    }
}
