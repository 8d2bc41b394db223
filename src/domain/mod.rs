// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 该模块包含系统的核心业务逻辑，包括：
/// - 领域模型（models）：商品、评论、会话与爬取请求/结果
/// - 仓库接口（repositories）：结果持久化抽象接口
/// - 服务（services）：解析、搜索、评论抓取与会话管理
pub mod models;
pub mod repositories;
pub mod services;
