// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::config::settings::StorageSettings;
use crate::domain::models::crawl::CrawlResult;
use crate::domain::models::product::Product;
use crate::domain::repositories::result_repository::{ResultRepository, StorageError};

/// 本地文件系统存储实现
///
/// 结果写入 `<base_path>/products_<YYYYMMDD>_<HHMMSS>.json`，内容为格式化的商品数组
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn from_settings(settings: &StorageSettings) -> Self {
        Self::new(&settings.data_dir)
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// 以本地时间生成结果文件名
    pub fn file_name(finished_at: DateTime<Utc>) -> String {
        format!(
            "products_{}.json",
            finished_at.with_timezone(&Local).format("%Y%m%d_%H%M%S")
        )
    }
}

#[async_trait]
impl ResultRepository for LocalStorage {
    async fn save(&self, result: &CrawlResult) -> Result<PathBuf, StorageError> {
        fs::create_dir_all(&self.base_path).await?;

        let full_path = self
            .base_path
            .join(Self::file_name(result.metadata.finished_at));
        let data = serde_json::to_vec_pretty(&result.products)?;

        let mut file = fs::File::create(&full_path).await?;
        file.write_all(&data).await?;
        file.flush().await?;

        info!(
            path = %full_path.display(),
            products = result.products.len(),
            "Saved crawl results"
        );
        Ok(full_path)
    }

    async fn load(&self, path: &Path) -> Result<Vec<Product>, StorageError> {
        let data = fs::read(path).await?;
        Ok(serde_json::from_slice(&data)?)
    }
}
