// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 包含爬取流程的编排用例
pub mod application;

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含核心业务实体、解析器与各个爬取服务
pub mod domain;

/// 引擎模块
///
/// 实现网页抓取后端以及带 robots/限速/重试 的礼貌抓取网关
pub mod engines;

/// 基础设施模块
///
/// 提供结果文件与会话状态的持久化
pub mod infrastructure;

/// 工具模块
///
/// 提供限速、重试、robots.txt 检查、错误类型与遥测
pub mod utils;
