// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::models::product::Product;
use crate::domain::models::review::Review;
use crate::domain::models::session::Session;
use crate::domain::models::site::SiteEndpoints;
use crate::domain::services::parser;
use crate::engines::polite_fetcher::PoliteFetcher;
use crate::engines::traits::FetchRequest;
use crate::utils::errors::{AuthError, CrawlError};

/// 评论服务
pub struct ReviewService {
    fetcher: Arc<PoliteFetcher>,
    endpoints: Arc<SiteEndpoints>,
    reviews_per_page: usize,
}

impl ReviewService {
    pub fn new(
        fetcher: Arc<PoliteFetcher>,
        endpoints: Arc<SiteEndpoints>,
        reviews_per_page: usize,
    ) -> Self {
        Self {
            fetcher,
            endpoints,
            reviews_per_page: reviews_per_page.max(1),
        }
    }

    /// 抓取一个商品的评论
    ///
    /// 最多抓取 `max_pages` 页，每页最多保留 `reviews_per_page` 条。
    /// 遇到空页、没有下一页或被重定向到登录页时提前停止；
    /// 中途抓取失败时返回已收集的评论。
    ///
    /// # 返回值
    ///
    /// * `Err(CrawlError::Auth(AuthError::SessionInvalid))` - 会话已失效，
    ///   或第一页就被重定向到登录页
    pub async fn crawl_reviews(
        &self,
        product: &Product,
        max_pages: u32,
        session: &Session,
    ) -> Result<Vec<Review>, CrawlError> {
        if !session.is_live(Utc::now()) {
            return Err(AuthError::SessionInvalid.into());
        }

        let mut reviews = Vec::new();
        for page_number in 1..=max_pages {
            let url = self
                .endpoints
                .review_url(&product.id, page_number)
                .map_err(|e| CrawlError::Validation(format!("invalid review URL: {}", e)))?;
            let request = FetchRequest::get(url.as_str()).with_cookies(session.cookies());

            let page = match self.fetcher.fetch(request).await {
                Ok(page) => page,
                Err(e) => {
                    warn!(
                        product_id = %product.id,
                        page = page_number,
                        error = %e,
                        "Review page failed, keeping {} reviews collected so far",
                        reviews.len()
                    );
                    break;
                }
            };

            if parser::looks_like_login_page(&page) {
                warn!(
                    product_id = %product.id,
                    page = page_number,
                    "Redirected to login page, session expired"
                );
                if page_number == 1 {
                    return Err(AuthError::SessionInvalid.into());
                }
                break;
            }

            let mut page_reviews = parser::parse_review_page(&page, &product.id);
            if page_reviews.is_empty() {
                debug!(product_id = %product.id, page = page_number, "Empty review page");
                break;
            }
            page_reviews.truncate(self.reviews_per_page);
            reviews.extend(page_reviews);

            if !parser::has_next_review_page(&page) {
                break;
            }
        }

        info!(
            product_id = %product.id,
            reviews = reviews.len(),
            "Collected reviews"
        );
        Ok(reviews)
    }
}
