// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # HTTP 请求描述模块
//!
//! 把 TCP 流中读到的原始字节解析为 `Request` 描述符，供分发器使用：
//! 1. 请求行（方法、请求目标、版本），请求目标在第一个 `?` 处拆分为路径与原始查询串。
//! 2. 标头按到达顺序保存，名称大小写不敏感，允许重复。
//! 3. 空行之后的字节作为请求体。
//!
//! 查询串只在处理器真正需要时才解码，编码非法时由分发器降级为 400。

use bytes::Bytes;
use log::error;
use serde_json::json;

use crate::{
    exception::Exception,
    param::*,
    util::{parse_query, Params},
};

#[derive(Debug, Clone)]
pub struct Request {
    /// 全局请求 ID，用于在多线程环境下追踪日志
    id: u128,
    method: HttpRequestMethod,
    /// 请求路径，总是以 `/` 开头，不含查询串
    path: String,
    /// 原始查询串（不含 `?`）
    query: String,
    version: HttpVersion,
    headers: Vec<(String, String)>,
    body: Bytes,
    /// 对端地址，仅用于诊断输出
    peer: Option<String>,
}

impl Request {
    /// 直接构造请求描述符，常用于测试或嵌入式调用。
    pub fn new(method: HttpRequestMethod, target: &str) -> Self {
        let (path, query) = split_target(target);
        Self {
            id: 0,
            method,
            path,
            query,
            version: HttpVersion::V1_1,
            headers: Vec::new(),
            body: Bytes::new(),
            peer: None,
        }
    }

    /// 从原始字节缓冲区构建 `Request`。
    ///
    /// # 错误
    /// - 报文不是 UTF-8：`RequestIsNotUtf8`
    /// - 请求行残缺或请求目标不是以 `/` 开头：`MalformedRequest`
    /// - 方法或版本不受支持：`UnSupportedRequestMethod` / `UnsupportedHttpVersion`
    pub fn try_from(buffer: &[u8], id: u128) -> Result<Self, Exception> {
        let (head, body) = match head_end(buffer) {
            Some(end) => (&buffer[..end], &buffer[end + HEAD_TERMINATOR.len()..]),
            None => (buffer, &[][..]),
        };
        let head = match std::str::from_utf8(head) {
            Ok(head) => head,
            Err(_) => {
                error!("[ID{}]无法解析HTTP请求", id);
                return Err(Exception::RequestIsNotUtf8);
            }
        };

        let mut lines = head.split(CRLF);
        let request_line = lines.next().unwrap_or_default();
        let parts: Vec<&str> = request_line.split(' ').filter(|p| !p.is_empty()).collect();
        if parts.len() != 3 {
            error!("[ID{}]HTTP请求行格式不正确：{}", id, request_line);
            return Err(Exception::MalformedRequest);
        }

        let method = match parts[0].parse::<HttpRequestMethod>() {
            Ok(method) => method,
            Err(e) => {
                error!("[ID{}]不支持的HTTP请求方法：{}", id, parts[0]);
                return Err(e);
            }
        };

        let version = match parts[2].to_uppercase().as_str() {
            "HTTP/1.1" => HttpVersion::V1_1,
            "HTTP/1.0" => HttpVersion::V1_0,
            other => {
                error!("[ID{}]不支持的HTTP协议版本：{}", id, other);
                return Err(Exception::UnsupportedHttpVersion);
            }
        };

        if !parts[1].starts_with('/') {
            error!("[ID{}]请求目标必须以'/'开头：{}", id, parts[1]);
            return Err(Exception::MalformedRequest);
        }
        let (path, query) = split_target(parts[1]);

        let mut headers = Vec::new();
        for line in lines.filter(|l| !l.is_empty()) {
            match line.split_once(':') {
                Some((name, value)) => {
                    headers.push((name.trim().to_string(), value.trim().to_string()))
                }
                None => {
                    error!("[ID{}]无法解析的标头行：{}", id, line);
                    return Err(Exception::MalformedRequest);
                }
            }
        }

        Ok(Self {
            id,
            method,
            path,
            query,
            version,
            headers,
            body: Bytes::copy_from_slice(body),
            peer: None,
        })
    }

    pub fn with_peer(mut self, peer: impl Into<String>) -> Self {
        self.peer = Some(peer.into());
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_id(mut self, id: u128) -> Self {
        self.id = id;
        self
    }
}

/// 标头与请求体之间的空行
pub const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";

/// 返回空行 `\r\n\r\n` 的起始位置，即报文头的长度；尚未读到空行时返回 `None`。
pub fn head_end(buffer: &[u8]) -> Option<usize> {
    buffer
        .windows(HEAD_TERMINATOR.len())
        .position(|w| w == HEAD_TERMINATOR)
}

fn split_target(target: &str) -> (String, String) {
    let (path, query) = target.split_once('?').unwrap_or((target, ""));
    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    };
    (path, query.to_string())
}

impl Request {
    pub fn id(&self) -> u128 {
        self.id
    }

    pub fn method(&self) -> HttpRequestMethod {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// 原始查询串
    pub fn query(&self) -> &str {
        &self.query
    }

    /// 解码后的查询参数
    pub fn query_params(&self) -> Result<Params, Exception> {
        parse_query(&self.query)
    }

    pub fn version(&self) -> HttpVersion {
        self.version
    }

    /// 第一个同名标头的值，名称大小写不敏感
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn user_agent(&self) -> &str {
        self.header("User-Agent").unwrap_or("")
    }

    pub fn peer(&self) -> Option<&str> {
        self.peer.as_deref()
    }

    /// 请求环境快照，仅在输出诊断信息时使用。
    pub fn environment(&self) -> serde_json::Value {
        json!({
            "id": self.id.to_string(),
            "method": self.method.as_str(),
            "path": self.path,
            "query": self.query,
            "version": self.version.to_string(),
            "headers": self.headers,
            "body_length": self.body.len(),
            "peer": self.peer(),
        })
    }
}
