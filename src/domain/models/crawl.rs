// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::{Validate, ValidationError};

use crate::domain::models::product::Product;

/// 爬取请求
///
/// 一次爬取的全部输入参数，运行期间不可变
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_crawl_request"))]
pub struct CrawlRequest {
    /// 搜索关键词
    pub keyword: String,
    /// 最低评分（包含）
    #[validate(range(min = 0.0, max = 5.0))]
    pub min_rating: f32,
    /// 最多返回的商品数
    #[validate(range(min = 1))]
    pub max_results: usize,
    /// 是否抓取评论
    pub crawl_reviews: bool,
    /// 每个商品最多抓取的评论页数
    pub max_review_pages: u32,
}

impl Default for CrawlRequest {
    fn default() -> Self {
        Self {
            keyword: String::new(),
            min_rating: 4.0,
            max_results: 3,
            crawl_reviews: true,
            max_review_pages: 2,
        }
    }
}

impl CrawlRequest {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            ..Default::default()
        }
    }
}

fn validate_crawl_request(request: &CrawlRequest) -> Result<(), ValidationError> {
    if request.keyword.trim().is_empty() {
        return Err(ValidationError::new("empty_keyword"));
    }
    // NaN slips past the range check since every comparison with it is false
    if !request.min_rating.is_finite() {
        return Err(ValidationError::new("min_rating_must_be_finite"));
    }
    if request.crawl_reviews && request.max_review_pages == 0 {
        return Err(ValidationError::new("max_review_pages_must_be_positive"));
    }
    Ok(())
}

/// 爬取状态
///
/// `Idle → Searching → (Authenticating) → (CrawlingReviews) → Filtering → Saved`，
/// 不可恢复的错误进入 `Failed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlState {
    Idle,
    Searching,
    Authenticating,
    CrawlingReviews,
    Filtering,
    Saved,
    Failed,
}

impl CrawlState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CrawlState::Saved | CrawlState::Failed)
    }
}

impl fmt::Display for CrawlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CrawlState::Idle => "idle",
            CrawlState::Searching => "searching",
            CrawlState::Authenticating => "authenticating",
            CrawlState::CrawlingReviews => "crawling_reviews",
            CrawlState::Filtering => "filtering",
            CrawlState::Saved => "saved",
            CrawlState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// 爬取元数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlMetadata {
    pub keyword: String,
    pub min_rating: f32,
    pub max_results: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// 搜索阶段得到的候选商品数
    pub products_found: usize,
    /// 过滤截断后返回的商品数
    pub products_returned: usize,
    pub reviews_collected: usize,
    /// 是否成功抓取了评论（未请求或认证失败时为 false）
    pub reviews_available: bool,
}

/// 爬取结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlResult {
    pub products: Vec<Product>,
    pub metadata: CrawlMetadata,
}
