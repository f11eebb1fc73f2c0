// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 路径模式模块
//!
//! 把路由声明里的字面路径编译成类型化的段序列，并在两个方向上使用它：
//! 1. **匹配**：判断一个具体路径是否满足该模式，并提取（百分号解码后的）参数。
//! 2. **构建**：把参数值代回模式，得到规范路径，用于链接生成。
//!
//! ## 语法
//! - `users`：静态段，与路径片段逐字（区分大小写）比较。
//! - `:id`：必选参数，恰好消费一个非空片段。
//! - `:format?`：可选参数，存在就消费一个片段，否则不出现在结果里。
//! - `*path`：尾随参数，消费剩余的全部片段并以 `/` 重新连接，只能位于末尾。
//!
//! 可选参数按从左到右贪婪匹配、不回溯，因此可选段之后只允许继续出现可选段或尾随段。
//! 模式在注册时编译一次，之后不可变，被所有请求共享。

use std::{collections::HashSet, fmt};

use lazy_static::lazy_static;
use regex::Regex;

use crate::{
    exception::Exception,
    util::{percent_decode, percent_encode_segment, Params},
};

lazy_static! {
    static ref PARAM_NAME: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
}

/// 模式中的一段
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Static(String),
    Required(String),
    Optional(String),
    Trailing(String),
}

impl Segment {
    fn parse(token: &str) -> Result<Self, String> {
        let (segment, name) = if let Some(rest) = token.strip_prefix(':') {
            match rest.strip_suffix('?') {
                Some(name) => (Segment::Optional(name.to_string()), name),
                None => (Segment::Required(rest.to_string()), rest),
            }
        } else if let Some(name) = token.strip_prefix('*') {
            (Segment::Trailing(name.to_string()), name)
        } else {
            return Ok(Segment::Static(token.to_string()));
        };
        if !PARAM_NAME.is_match(name) {
            return Err(format!("invalid parameter name {:?}", name));
        }
        Ok(segment)
    }

    /// 参数段的名字，静态段返回 `None`
    pub fn param_name(&self) -> Option<&str> {
        match self {
            Segment::Static(_) => None,
            Segment::Required(name) | Segment::Optional(name) | Segment::Trailing(name) => {
                Some(name)
            }
        }
    }

    /// 忽略参数名后两段是否等价，用于判断两个模式是否指向同一组路径。
    fn same_shape(&self, other: &Segment) -> bool {
        match (self, other) {
            (Segment::Static(a), Segment::Static(b)) => a == b,
            (Segment::Required(_), Segment::Required(_))
            | (Segment::Optional(_), Segment::Optional(_))
            | (Segment::Trailing(_), Segment::Trailing(_)) => true,
            _ => false,
        }
    }
}

/// 编译后的路径模式
#[derive(Debug, Clone)]
pub struct PathPattern {
    source: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// 编译字面路径。
    ///
    /// # 错误
    /// 以下情况返回 `Exception::InvalidPattern`：
    /// - 路径不以 `/` 开头，或参数名不是合法标识符；
    /// - 尾随参数不是最后一段；
    /// - 参数名重复；
    /// - 可选参数之后出现静态段或必选参数。
    pub fn compile(literal: &str) -> Result<Self, Exception> {
        let invalid = |reason: String| Exception::InvalidPattern {
            pattern: literal.to_string(),
            reason,
        };
        if !literal.starts_with('/') {
            return Err(invalid("pattern must start with '/'".to_string()));
        }

        let mut segments: Vec<Segment> = Vec::new();
        let mut names = HashSet::new();
        let mut seen_optional = false;
        for token in literal.split('/').filter(|t| !t.is_empty()) {
            if matches!(segments.last(), Some(Segment::Trailing(_))) {
                return Err(invalid(
                    "trailing parameter must be the last segment".to_string(),
                ));
            }
            let segment = Segment::parse(token).map_err(&invalid)?;
            match segment {
                Segment::Static(_) | Segment::Required(_) if seen_optional => {
                    return Err(invalid(format!(
                        "segment {:?} follows an optional parameter",
                        token
                    )));
                }
                Segment::Optional(_) => seen_optional = true,
                _ => {}
            }
            if let Some(name) = segment.param_name() {
                if !names.insert(name.to_string()) {
                    return Err(invalid(format!("duplicate parameter name {:?}", name)));
                }
            }
            segments.push(segment);
        }

        Ok(Self {
            source: literal.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// 静态段数量，路由表用它在多个匹配之间择优。
    pub fn static_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Static(_)))
            .count()
    }

    /// 按声明顺序列出参数名
    pub fn param_names(&self) -> Vec<&str> {
        self.segments.iter().filter_map(Segment::param_name).collect()
    }

    /// 两个模式是否只在参数名上不同。
    pub fn is_equivalent(&self, other: &PathPattern) -> bool {
        self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|(a, b)| a.same_shape(b))
    }

    /// 用模式匹配具体路径，成功时返回捕获的参数。
    ///
    /// 空片段被忽略，所以 `/users/` 与 `/users` 等价。参数片段的百分号编码非法时视为不匹配。
    pub fn match_path(&self, path: &str) -> Option<Params> {
        let tokens: Vec<&str> = path.split('/').filter(|t| !t.is_empty()).collect();
        let mut params = Params::new();
        let mut cursor = 0;

        for segment in &self.segments {
            match segment {
                Segment::Static(text) => {
                    if tokens.get(cursor) != Some(&text.as_str()) {
                        return None;
                    }
                    cursor += 1;
                }
                Segment::Required(name) => {
                    let token = tokens.get(cursor)?;
                    params.insert(name.clone(), percent_decode(token)?);
                    cursor += 1;
                }
                Segment::Optional(name) => {
                    if let Some(token) = tokens.get(cursor) {
                        params.insert(name.clone(), percent_decode(token)?);
                        cursor += 1;
                    }
                }
                Segment::Trailing(name) => {
                    let rest = tokens[cursor..]
                        .iter()
                        .map(|t| percent_decode(t))
                        .collect::<Option<Vec<_>>>()?;
                    params.insert(name.clone(), rest.join("/"));
                    cursor = tokens.len();
                }
            }
        }

        if cursor == tokens.len() {
            Some(params)
        } else {
            None
        }
    }

    /// 把参数代回模式，渲染出具体路径。
    ///
    /// 参数值按路径段做百分号编码；尾随参数里的 `/` 保留为分隔符。
    ///
    /// # 错误
    /// - `MissingArgument`：必选参数缺失或为空；或某个可选参数缺失，但其后还有内容要输出。
    /// - `UnexpectedArgument`：`args` 中有任何段都不消费的键。查询参数应由调用方单独传递。
    pub fn build(&self, args: &Params) -> Result<String, Exception> {
        if let Some(extra) = args
            .keys()
            .find(|key| !self.segments.iter().any(|s| s.param_name() == Some(key.as_str())))
        {
            return Err(Exception::UnexpectedArgument {
                pattern: self.source.clone(),
                name: extra.clone(),
            });
        }

        let missing = |name: &str| Exception::MissingArgument {
            pattern: self.source.clone(),
            name: name.to_string(),
        };
        let value = |name: &str| args.get(name).map(String::as_str).filter(|v| !v.is_empty());

        let mut pieces: Vec<String> = Vec::with_capacity(self.segments.len());
        let mut gap: Option<&str> = None;
        for segment in &self.segments {
            let piece = match segment {
                Segment::Static(text) => Some(text.clone()),
                Segment::Required(name) => {
                    Some(percent_encode_segment(value(name).ok_or_else(|| missing(name))?))
                }
                Segment::Optional(name) => value(name).map(percent_encode_segment),
                Segment::Trailing(name) => value(name).map(|v| {
                    v.split('/')
                        .filter(|p| !p.is_empty())
                        .map(percent_encode_segment)
                        .collect::<Vec<_>>()
                        .join("/")
                }),
            };
            match piece {
                Some(piece) => {
                    if let Some(name) = gap {
                        return Err(missing(name));
                    }
                    if !piece.is_empty() {
                        pieces.push(piece);
                    }
                }
                None => {
                    if let Segment::Optional(name) = segment {
                        gap.get_or_insert(name);
                    }
                }
            }
        }

        Ok(format!("/{}", pieces.join("/")))
    }

    /// 按参数声明顺序接收位置参数并构建路径。
    pub fn build_positional(&self, values: &[&str]) -> Result<String, Exception> {
        let names = self.param_names();
        if values.len() > names.len() {
            return Err(Exception::UnexpectedArgument {
                pattern: self.source.clone(),
                name: format!("#{}", names.len()),
            });
        }
        let args: Params = names
            .iter()
            .zip(values)
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        self.build(&args)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
