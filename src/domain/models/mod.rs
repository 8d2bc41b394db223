// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了系统的核心业务实体，包括：
/// - 商品（product）：搜索结果中解析出的商品记录
/// - 评论（review）：商品评论页中解析出的评论
/// - 会话（session）：登录后的认证状态及其可序列化形式
/// - 爬取（crawl）：一次爬取的请求参数、状态与结果
/// - 站点（site）：目标站点各类页面的URL构造
pub mod crawl;
pub mod product;
pub mod review;
pub mod session;
pub mod site;
