// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use validator::Validate;

use crate::config::settings::Settings;
use crate::domain::models::crawl::{CrawlMetadata, CrawlRequest, CrawlResult, CrawlState};
use crate::domain::models::product::Product;
use crate::domain::models::session::{Credentials, Session, SessionState};
use crate::domain::models::site::SiteEndpoints;
use crate::domain::repositories::result_repository::ResultRepository;
use crate::domain::services::review_service::ReviewService;
use crate::domain::services::search_service::SearchService;
use crate::domain::services::session_service::SessionService;
use crate::engines::polite_fetcher::PoliteFetcher;
use crate::utils::errors::CrawlError;

/// 一次成功爬取的结果
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub result: CrawlResult,
    /// 结果文件路径
    pub path: PathBuf,
}

/// 按最低评分过滤并截断，保持搜索结果顺序
pub fn select_products(
    products: Vec<Product>,
    min_rating: f32,
    max_results: usize,
) -> Vec<Product> {
    products
        .into_iter()
        .filter(|p| p.meets_rating(min_rating))
        .take(max_results)
        .collect()
}

/// 商品爬取用例
///
/// 编排 搜索 → 登录 → 抓取评论 → 过滤 → 保存 的完整流程，
/// 每次状态转换都会记录日志并写入历史。
pub struct CrawlProductsUseCase<R: ResultRepository> {
    fetcher: Arc<PoliteFetcher>,
    endpoints: Arc<SiteEndpoints>,
    search: SearchService,
    reviews: ReviewService,
    sessions: SessionService,
    repository: Arc<R>,
    credentials: Option<Credentials>,
    candidate_factor: usize,
    state: CrawlState,
    history: Vec<CrawlState>,
}

impl<R: ResultRepository> CrawlProductsUseCase<R> {
    pub fn new(
        fetcher: Arc<PoliteFetcher>,
        endpoints: Arc<SiteEndpoints>,
        repository: Arc<R>,
        settings: &Settings,
    ) -> Self {
        let search = SearchService::new(
            fetcher.clone(),
            endpoints.clone(),
            settings.crawler.max_search_pages,
        );
        let reviews = ReviewService::new(
            fetcher.clone(),
            endpoints.clone(),
            settings.crawler.reviews_per_page,
        );
        let sessions = SessionService::new(
            fetcher.clone(),
            endpoints.clone(),
            settings.site.auth_cookie.clone(),
            settings.site.session_ttl(),
        );

        Self {
            fetcher,
            endpoints,
            search,
            reviews,
            sessions,
            repository,
            credentials: settings.auth.credentials(),
            candidate_factor: settings.crawler.candidate_factor.max(1),
            state: CrawlState::Idle,
            history: vec![CrawlState::Idle],
        }
    }

    pub fn with_credentials(mut self, credentials: Option<Credentials>) -> Self {
        self.credentials = credentials;
        self
    }

    /// 复用之前保存的登录会话
    pub fn with_restored_session(mut self, state: SessionState) -> Self {
        self.sessions = self.sessions.with_restored(state);
        self
    }

    pub fn state(&self) -> CrawlState {
        self.state
    }

    /// 本次运行经过的全部状态
    pub fn history(&self) -> &[CrawlState] {
        &self.history
    }

    /// 导出当前有效会话，供调用方持久化
    pub async fn session_state(&self) -> Option<SessionState> {
        self.sessions.save_state().await
    }

    /// 执行一次爬取
    ///
    /// # 返回值
    ///
    /// * `Ok(CrawlOutcome)` - 结果已保存
    /// * `Err(CrawlError::Validation)` - 参数无效，未发出任何请求
    /// * `Err(CrawlError::Fetch)` - 第一页搜索结果抓取失败
    /// * `Err(CrawlError::Storage)` - 结果写入失败
    pub async fn run(&mut self, request: CrawlRequest) -> Result<CrawlOutcome, CrawlError> {
        request
            .validate()
            .map_err(|e| CrawlError::Validation(e.to_string()))?;

        let started_at = Utc::now();
        self.state = CrawlState::Idle;
        self.history = vec![CrawlState::Idle];

        self.transition(CrawlState::Searching);
        self.fetcher.honor_crawl_delay(self.endpoints.base().as_str()).await;

        let candidate_limit = request.max_results.saturating_mul(self.candidate_factor);
        let candidates = match self.search.search(&request.keyword, candidate_limit).await {
            Ok(products) => products,
            Err(e) => return Err(self.fail(e)),
        };
        let products_found = candidates.len();
        info!(
            keyword = %request.keyword,
            products_found,
            "Search finished"
        );

        // Reviews are only fetched for products that survive filtering
        let mut products = select_products(candidates, request.min_rating, request.max_results);
        let mut reviews_available = false;

        if request.crawl_reviews && !products.is_empty() {
            self.transition(CrawlState::Authenticating);
            match self
                .sessions
                .ensure_authenticated(self.credentials.as_ref())
                .await
            {
                Ok(session) => {
                    self.transition(CrawlState::CrawlingReviews);
                    reviews_available = self
                        .attach_reviews(&mut products, request.max_review_pages, &session)
                        .await;
                }
                Err(e) => {
                    warn!(error = %e, "Authentication failed, continuing without reviews");
                }
            }
        }

        self.transition(CrawlState::Filtering);
        let products = select_products(products, request.min_rating, request.max_results);

        let metadata = CrawlMetadata {
            keyword: request.keyword.clone(),
            min_rating: request.min_rating,
            max_results: request.max_results,
            started_at,
            finished_at: Utc::now(),
            products_found,
            products_returned: products.len(),
            reviews_collected: products.iter().map(|p| p.reviews.len()).sum(),
            reviews_available,
        };
        info!(
            products_returned = metadata.products_returned,
            reviews_collected = metadata.reviews_collected,
            reviews_available = metadata.reviews_available,
            "Filtered products"
        );

        let result = CrawlResult { products, metadata };
        match self.repository.save(&result).await {
            Ok(path) => {
                self.transition(CrawlState::Saved);
                Ok(CrawlOutcome { result, path })
            }
            Err(e) => Err(self.fail(e.into())),
        }
    }

    /// 为每个商品抓取评论；会话失效时停止，返回评论是否可用
    async fn attach_reviews(
        &self,
        products: &mut [Product],
        max_pages: u32,
        session: &Session,
    ) -> bool {
        for product in products.iter_mut() {
            match self.reviews.crawl_reviews(product, max_pages, session).await {
                Ok(reviews) => product.reviews = reviews,
                Err(CrawlError::Auth(e)) => {
                    warn!(
                        product_id = %product.id,
                        error = %e,
                        "Session rejected, skipping remaining reviews"
                    );
                    self.sessions.invalidate().await;
                    return false;
                }
                Err(e) => {
                    warn!(product_id = %product.id, error = %e, "Failed to crawl reviews");
                }
            }
        }
        true
    }

    fn transition(&mut self, next: CrawlState) {
        info!(from = %self.state, to = %next, "Crawl state changed");
        self.state = next;
        self.history.push(next);
    }

    fn fail(&mut self, error: CrawlError) -> CrawlError {
        warn!(error = %error, "Crawl failed");
        self.transition(CrawlState::Failed);
        error
    }
}
