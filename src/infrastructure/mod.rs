// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 实现领域层定义的持久化接口：
/// - 存储（storage）：把爬取结果写成带时间戳的 JSON 文件
/// - 会话存储（session_store）：在两次运行之间保存登录状态
pub mod session_store;
pub mod storage;
