// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置模块
///
/// 处理爬虫、目标站点、抓取后端、存储与登录等配置
pub mod settings;
