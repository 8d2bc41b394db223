// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};

use crate::domain::models::review::Review;

/// 价格
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    /// ISO 4217 货币代码，无法识别时为 `XXX`
    pub currency: String,
    pub amount: f64,
}

/// 商品
///
/// 由解析器从搜索结果片段构建；爬取评论后由编排器填充 `reviews`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// 站点分配的商品标识（例如 ASIN）
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    /// 评分，范围 [0, 5]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
    #[serde(default)]
    pub review_count: u32,
    /// 商品详情页URL
    pub url: String,
    #[serde(default)]
    pub reviews: Vec<Review>,
}

impl Product {
    pub fn new(id: impl Into<String>, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            price: None,
            rating: None,
            review_count: 0,
            url: url.into(),
            reviews: Vec::new(),
        }
    }

    pub fn with_price(mut self, currency: impl Into<String>, amount: f64) -> Self {
        self.price = Some(Price {
            currency: currency.into(),
            amount,
        });
        self
    }

    /// 设置评分，超出 [0, 5] 的值会被丢弃
    pub fn with_rating(mut self, rating: f32) -> Self {
        self.rating = (0.0..=5.0).contains(&rating).then_some(rating);
        self
    }

    pub fn with_review_count(mut self, review_count: u32) -> Self {
        self.review_count = review_count;
        self
    }

    /// 是否满足最低评分要求（包含边界）
    ///
    /// 没有解析到评分的商品按 0.0 处理
    pub fn meets_rating(&self, min_rating: f32) -> bool {
        self.rating.unwrap_or(0.0) >= min_rating
    }
}
