// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 用例模块
///
/// - 商品爬取（crawl_products）：一次完整的 搜索 → 评论 → 过滤 → 保存 流程
pub mod crawl_products;
