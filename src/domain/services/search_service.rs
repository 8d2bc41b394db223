// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::models::product::Product;
use crate::domain::models::site::SiteEndpoints;
use crate::domain::services::parser;
use crate::engines::polite_fetcher::PoliteFetcher;
use crate::utils::errors::CrawlError;

/// 搜索服务
///
/// 按页抓取搜索结果，直到收集够数量、页面为空、没有下一页或达到页数上限
pub struct SearchService {
    fetcher: Arc<PoliteFetcher>,
    endpoints: Arc<SiteEndpoints>,
    max_pages: u32,
}

impl SearchService {
    pub fn new(fetcher: Arc<PoliteFetcher>, endpoints: Arc<SiteEndpoints>, max_pages: u32) -> Self {
        Self {
            fetcher,
            endpoints,
            max_pages: max_pages.max(1),
        }
    }

    /// 搜索商品
    ///
    /// 按商品标识去重（保留第一次出现）。第一页抓取失败视为整次爬取失败；
    /// 后续页面失败或被 robots.txt 禁止时停止翻页并保留已收集的结果。
    pub async fn search(
        &self,
        keyword: &str,
        max_results: usize,
    ) -> Result<Vec<Product>, CrawlError> {
        let mut products: Vec<Product> = Vec::new();
        let mut seen = HashSet::new();

        for page_number in 1..=self.max_pages {
            if products.len() >= max_results {
                break;
            }

            let url = self
                .endpoints
                .search_url(keyword, page_number)
                .map_err(|e| CrawlError::Validation(format!("invalid search URL: {}", e)))?;

            let page = match self.fetcher.get(url.as_str()).await {
                Ok(page) => page,
                // The fetcher already logged the denial
                Err(e) if e.is_policy() => break,
                Err(e) if page_number == 1 => return Err(e),
                Err(e) => {
                    warn!(
                        page = page_number,
                        error = %e,
                        "Search page failed, keeping {} products collected so far",
                        products.len()
                    );
                    break;
                }
            };

            let parsed = parser::parse_search_results(&page);
            if parsed.is_empty() {
                info!(page = page_number, "Search page has no products, stopping");
                break;
            }

            let mut added = 0;
            for product in parsed {
                if products.len() >= max_results {
                    break;
                }
                if seen.insert(product.id.clone()) {
                    products.push(product);
                    added += 1;
                }
            }
            info!(
                page = page_number,
                added,
                total = products.len(),
                "Parsed search results page"
            );

            if !parser::has_next_search_page(&page) {
                break;
            }
        }

        Ok(products)
    }
}
