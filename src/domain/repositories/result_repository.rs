// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::models::crawl::CrawlResult;
use crate::domain::models::product::Product;

/// 存储错误类型
#[derive(Error, Debug)]
pub enum StorageError {
    /// IO错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// 序列化错误
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// 结果仓库特质
///
/// 定义爬取结果的持久化接口；写入失败不重试
#[async_trait]
pub trait ResultRepository: Send + Sync {
    /// 保存爬取结果，返回写入的文件路径
    async fn save(&self, result: &CrawlResult) -> Result<PathBuf, StorageError>;

    /// 读取之前保存的商品列表
    async fn load(&self, path: &Path) -> Result<Vec<Product>, StorageError>;
}
