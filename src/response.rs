// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! HTTP 响应描述符，以及把它写成 HTTP/1.1 报文的序列化逻辑。

use bytes::Bytes;
use chrono::prelude::*;

use crate::param::*;

#[derive(Debug, Clone)]
pub struct Response {
    status_code: u16,
    information: String,
    /// 有序标头，部分名称允许重复出现
    headers: Vec<(String, String)>,
    body: Bytes,
    /// HEAD 响应去掉响应体后仍保留原长度
    content_length: u64,
    date: DateTime<Utc>,
}

impl Response {
    pub fn new() -> Self {
        Self::with_status(200)
    }

    pub fn with_status(code: u16) -> Self {
        Self {
            status_code: code,
            information: status_text(code).to_string(),
            headers: Vec::new(),
            body: Bytes::new(),
            content_length: 0,
            date: Utc::now(),
        }
    }

    pub fn set_code(&mut self, code: u16) -> &mut Self {
        self.status_code = code;
        self.information = status_text(code).to_string();
        self
    }

    /// 替换同名标头（名称大小写不敏感）
    pub fn set_header(&mut self, name: &str, value: &str) -> &mut Self {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// 追加标头，不影响已有的同名标头
    pub fn append_header(&mut self, name: &str, value: &str) -> &mut Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn set_body(&mut self, body: impl Into<Bytes>) -> &mut Self {
        self.body = body.into();
        self.content_length = self.body.len() as u64;
        self
    }

    /// 丢弃响应体，`Content-Length` 仍按原长度输出
    pub fn strip_body(&mut self) -> &mut Self {
        self.body = Bytes::new();
        self
    }

    /// 序列化为 HTTP/1.1 报文
    pub fn as_bytes(&self) -> Vec<u8> {
        let mut head = format!(
            "{} {} {}{}",
            HttpVersion::V1_1,
            self.status_code,
            self.information,
            CRLF
        );
        for (name, value) in &self.headers {
            head.push_str(&format!("{}: {}{}", name, value, CRLF));
        }
        head.push_str(&format!("Content-Length: {}{}", self.content_length, CRLF));
        head.push_str(&format!("Date: {}{}", format_date(&self.date), CRLF));
        head.push_str(&format!("Server: {}{}", SERVER_NAME, CRLF));
        head.push_str(CRLF);
        [head.as_bytes(), &self.body[..]].concat()
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn information(&self) -> &str {
        &self.information
    }

    /// 第一个同名标头的值
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

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    pub fn content_length(&self) -> u64 {
        self.content_length
    }
}

fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc2822()
}
