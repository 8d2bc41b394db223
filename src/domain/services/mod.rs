// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 包含的服务：
/// - 页面解析（parser）：从搜索页、评论页、登录页中提取结构化数据，不访问网络
/// - 搜索服务（search_service）：分页抓取搜索结果并去重
/// - 评论服务（review_service）：在登录会话下分页抓取商品评论
/// - 会话服务（session_service）：管理登录与会话有效性
pub mod parser;
pub mod review_service;
pub mod search_service;
pub mod session_service;
