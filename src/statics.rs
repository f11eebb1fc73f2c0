// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 静态文件协作者
//!
//! 分发器在尝试路由之前依次询问应用级静态根目录和内置的共享静态根目录。
//! 协作者只回答“找到：内容 + 类型”或“没找到”。

use std::{
    fs,
    path::{Component, Path, PathBuf},
    sync::Mutex,
};

use bytes::Bytes;
use log::{debug, warn};

use crate::{cache::FileCache, param::get_mime, util::percent_decode};

/// 目录请求时尝试的默认文件
const INDEX_FILE: &str = "index.html";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub content: Bytes,
    pub content_type: String,
}

pub trait StaticFiles: Send + Sync {
    fn lookup(&self, path: &str) -> Option<Asset>;
}

/// 以文件系统目录为根的静态文件服务
pub struct FsStatic {
    root: PathBuf,
    cache: Mutex<FileCache>,
}

impl FsStatic {
    pub fn new(root: impl Into<PathBuf>, cache_size: usize) -> Self {
        Self {
            root: root.into(),
            cache: Mutex::new(FileCache::from_capacity(cache_size)),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 把 URI 路径映射到根目录下的文件路径，拒绝任何越出根目录的尝试。
    fn resolve(&self, path: &str) -> Option<PathBuf> {
        let decoded = percent_decode(path)?;
        if decoded.contains('\0') || decoded.contains('\\') {
            return None;
        }
        let relative = Path::new(decoded.trim_start_matches('/'));
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            return None;
        }
        let full = self.root.join(relative);
        if full.is_dir() {
            Some(full.join(INDEX_FILE))
        } else {
            Some(full)
        }
    }

    fn read(&self, file: &Path) -> Option<Bytes> {
        let metadata = fs::metadata(file).ok()?;
        if !metadata.is_file() {
            return None;
        }
        let modified = metadata.modified().ok();

        let mut cache = match self.cache.lock() {
            Ok(lock) => lock,
            Err(poisoned) => {
                warn!("静态文件缓存锁被污染，恢复并继续");
                poisoned.into_inner()
            }
        };
        if let Some(time) = modified {
            if let Some(content) = cache.find(file, time) {
                debug!("静态文件缓存命中：{}", file.display());
                return Some(content);
            }
        }

        let content = match fs::read(file) {
            Ok(content) => Bytes::from(content),
            Err(e) => {
                warn!("无法读取静态文件{}：{}", file.display(), e);
                return None;
            }
        };
        if let Some(time) = modified {
            cache.push(file, content.clone(), time);
        }
        Some(content)
    }
}

impl StaticFiles for FsStatic {
    fn lookup(&self, path: &str) -> Option<Asset> {
        let file = self.resolve(path)?;
        let content = self.read(&file)?;
        let extension = file
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        debug!("静态文件：{} -> {}", path, file.display());
        Some(Asset {
            content,
            content_type: get_mime(extension).to_string(),
        })
    }
}
