// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库接口模块
///
/// 定义领域层的持久化抽象契约，具体实现由基础设施层提供：
/// - 结果仓库（result_repository）：保存与读取爬取结果
pub mod result_repository;
