// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! URI 工具函数：百分号编解码、查询字符串的解析与拼接、挂载前缀的拼接。

use std::collections::BTreeMap;

use crate::exception::Exception;

/// 路径参数与查询参数的统一映射类型，按键有序以保证输出稳定。
pub type Params = BTreeMap<String, String>;

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// 解码 `%XX` 转义。转义被截断、不是十六进制，或解码结果不是 UTF-8 时返回 `None`。
pub fn percent_decode(input: &str) -> Option<String> {
    if !input.contains('%') {
        return Some(input.to_string());
    }
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hi = hex_value(*bytes.get(i + 1)?)?;
            let lo = hex_value(*bytes.get(i + 2)?)?;
            out.push(hi << 4 | lo);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

/// 对单个路径段做百分号编码，只保留 RFC 3986 的非保留字符。
pub fn percent_encode_segment(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

fn decode_query_component(raw: &str, whole: &str) -> Result<String, Exception> {
    percent_decode(&raw.replace('+', " "))
        .ok_or_else(|| Exception::MalformedQuery(whole.to_string()))
}

/// 解析原始查询字符串。
///
/// `+` 视为空格；没有 `=` 的键映射为空串；重复的键以最后一次出现为准。
pub fn parse_query(raw: &str) -> Result<Params, Exception> {
    let mut params = Params::new();
    for pair in raw.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = decode_query_component(key, raw)?;
        let value = decode_query_component(value, raw)?;
        params.insert(key, value);
    }
    Ok(params)
}

/// 拼接查询字符串（不含前导 `?`）。
pub fn build_query<K, V>(pairs: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    pairs
        .iter()
        .map(|(k, v)| {
            format!(
                "{}={}",
                percent_encode_segment(k.as_ref()),
                percent_encode_segment(v.as_ref())
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// 拼接挂载前缀与子路径，各部分之间恰好一个 `/`，除根路径外不留尾随 `/`。
pub fn join_path(prefix: &str, sub: &str) -> String {
    let parts: Vec<&str> = prefix
        .split('/')
        .chain(sub.split('/'))
        .filter(|p| !p.is_empty())
        .collect();
    format!("/{}", parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_decode() {
        assert_eq!(percent_decode("hello").as_deref(), Some("hello"));
        assert_eq!(percent_decode("a%20b").as_deref(), Some("a b"));
        assert_eq!(percent_decode("%E4%BD%A0%E5%A5%BD").as_deref(), Some("你好"));
    }

    #[test]
    fn test_percent_decode_malformed() {
        assert_eq!(percent_decode("%"), None);
        assert_eq!(percent_decode("%4"), None);
        assert_eq!(percent_decode("%zz"), None);
        // 合法的转义但不是 UTF-8
        assert_eq!(percent_decode("%FF"), None);
    }

    #[test]
    fn test_percent_encode_segment() {
        assert_eq!(percent_encode_segment("a b/c"), "a%20b%2Fc");
        assert_eq!(percent_encode_segment("safe-._~"), "safe-._~");
        assert_eq!(percent_decode(&percent_encode_segment("你好 world")).as_deref(), Some("你好 world"));
    }

    #[test]
    fn test_parse_query() {
        let params = parse_query("page=2&q=rust+web&flag&&q2=%2Fx").unwrap();
        assert_eq!(params.get("page").map(String::as_str), Some("2"));
        assert_eq!(params.get("q").map(String::as_str), Some("rust web"));
        assert_eq!(params.get("flag").map(String::as_str), Some(""));
        assert_eq!(params.get("q2").map(String::as_str), Some("/x"));
        assert_eq!(params.len(), 4);
    }

    #[test]
    fn test_parse_query_malformed() {
        match parse_query("a=%zz") {
            Err(Exception::MalformedQuery(raw)) => assert_eq!(raw, "a=%zz"),
            other => panic!("Expected MalformedQuery, got {:?}", other),
        }
    }

    #[test]
    fn test_build_query() {
        assert_eq!(build_query(&[("page", "2"), ("q", "a b")]), "page=2&q=a%20b");
        assert_eq!(build_query::<&str, &str>(&[]), "");
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("/", "/"), "/");
        assert_eq!(join_path("/users", "/"), "/users");
        assert_eq!(join_path("/users/", ":id"), "/users/:id");
        assert_eq!(join_path("", "/about"), "/about");
        assert_eq!(join_path("/admin", "/users/:id/edit"), "/admin/users/:id/edit");
    }
}
