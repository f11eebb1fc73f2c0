// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

use serde_derive::{Deserialize, Serialize};

use log::{error, warn};
use std::fs;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// 应用级静态根目录
    public_root: String,
    /// 内置的共享静态根目录
    shared_root: String,
    port: u16,
    worker_threads: usize,
    cache_size: usize,
    local: bool,
    max_request_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            public_root: "public".to_string(),
            shared_root: "static".to_string(),
            port: 7878,
            worker_threads: 0,
            cache_size: 5,
            local: true,
            max_request_size: 1024 * 1024,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// 读取 TOML 配置。文件缺失或无法解析时使用默认配置并记录日志。
    pub fn from_toml(filename: &str) -> Self {
        let raw = match fs::read_to_string(filename) {
            Ok(s) => s,
            Err(e) => {
                warn!("无法读取配置文件{}：{}，使用默认配置", filename, e);
                return Self::default().normalized();
            }
        };
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Self {
        let config: Config = match toml::from_str(raw) {
            Ok(t) => t,
            Err(e) => {
                error!("无法成功从配置文件构建配置对象，使用默认配置：{}", e);
                Config::new()
            }
        };
        config.normalized()
    }

    fn normalized(mut self) -> Self {
        if self.worker_threads == 0 {
            self.worker_threads = num_cpus::get();
        }
        if self.cache_size == 0 {
            warn!("cache_size被设置为0，但目前尚不支持禁用缓存，因此该值将被改为5。");
            self.cache_size = 5;
        }
        if self.max_request_size == 0 {
            warn!("max_request_size不能为0，使用默认值");
            self.max_request_size = Self::default().max_request_size;
        }
        self
    }
}

impl Config {
    pub fn public_root(&self) -> &str {
        &self.public_root
    }

    pub fn shared_root(&self) -> &str {
        &self.shared_root
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    pub fn cache_size(&self) -> usize {
        self.cache_size
    }

    pub fn local(&self) -> bool {
        self.local
    }

    pub fn max_request_size(&self) -> usize {
        self.max_request_size
    }
}
