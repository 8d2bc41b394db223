// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use url::Url;

use crate::config::settings::SiteSettings;

/// 目标站点的URL构造器
///
/// 搜索页：`<base><search_path>?k=<keyword>&page=<n>`
/// 评论页：`<base><review_path>/<id>?reviewerType=all_reviews&pageNumber=<n>`
#[derive(Debug, Clone)]
pub struct SiteEndpoints {
    base: Url,
    search_path: String,
    review_path: String,
    login_path: String,
}

impl SiteEndpoints {
    pub fn new(
        base_url: &str,
        search_path: &str,
        review_path: &str,
        login_path: &str,
    ) -> Result<Self, url::ParseError> {
        Ok(Self {
            base: Url::parse(base_url)?,
            search_path: search_path.to_string(),
            review_path: review_path.trim_end_matches('/').to_string(),
            login_path: login_path.to_string(),
        })
    }

    pub fn from_settings(settings: &SiteSettings) -> Result<Self, url::ParseError> {
        Self::new(
            &settings.base_url,
            &settings.search_path,
            &settings.review_path,
            &settings.login_path,
        )
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn search_url(&self, keyword: &str, page: u32) -> Result<Url, url::ParseError> {
        let mut url = self.base.join(&self.search_path)?;
        url.query_pairs_mut()
            .clear()
            .append_pair("k", keyword)
            .append_pair("page", &page.to_string());
        Ok(url)
    }

    pub fn review_url(&self, product_id: &str, page: u32) -> Result<Url, url::ParseError> {
        let mut url = self
            .base
            .join(&format!("{}/{}", self.review_path, product_id))?;
        url.query_pairs_mut()
            .clear()
            .append_pair("reviewerType", "all_reviews")
            .append_pair("pageNumber", &page.to_string());
        Ok(url)
    }

    pub fn login_url(&self) -> Result<Url, url::ParseError> {
        self.base.join(&self.login_path)
    }
}
