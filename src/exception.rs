// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # Exception 模块
//!
//! 路由引擎在启动配置、请求解析与链接生成三个阶段可能产生的错误。
//!
//! - **启动期**：`InvalidPattern`、`DuplicateRoute`、`UnknownAction`、`UnknownController`
//!   都是致命的配置错误，只会在构建路由表时出现，请求处理期间不会再遇到。
//! - **请求期**：报文解析类错误与 `MalformedQuery` 会被转化为 400 响应。
//! - **链接生成**：`RouteNotFound`、`MissingArgument`、`UnexpectedArgument` 交给调用方处理，
//!   若继续向上传播则走通用的 500 路径。
//!
//! 404 与 405 不是错误，它们是路由匹配的一等结果，见 `router::MatchOutcome`。

use std::{error::Error, fmt};

use crate::param::HttpRequestMethod;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exception {
    /// 请求字节流不是合法的 UTF-8。
    RequestIsNotUtf8,
    /// 请求行或标头格式错误。
    MalformedRequest,
    /// 客户端使用了路由表不支持的 HTTP 方法。
    UnSupportedRequestMethod,
    /// 客户端使用了不支持的 HTTP 协议版本。
    UnsupportedHttpVersion,
    /// 请求报文超过配置的大小上限。
    RequestTooLarge(usize),
    /// 查询字符串中含有非法的百分号编码。
    MalformedQuery(String),
    /// 路由模式非法：尾随参数不在末尾、参数名重复、可选段之后出现必选段等。
    InvalidPattern { pattern: String, reason: String },
    /// 同一 (方法, 模式) 被注册了两次。
    DuplicateRoute {
        method: HttpRequestMethod,
        pattern: String,
    },
    /// 挂载语句引用了控制器没有声明的动作。
    UnknownAction {
        controller: &'static str,
        action: &'static str,
    },
    /// 路由指向了未注册的控制器。
    UnknownController(&'static str),
    /// 反向查找时，处理器引用没有对应的路由。
    RouteNotFound(String),
    /// 反向构建路径时缺少必需的参数。
    MissingArgument { pattern: String, name: String },
    /// 反向构建路径时传入了没有任何段消费的参数。
    UnexpectedArgument { pattern: String, name: String },
}

use Exception::*;

impl Exception {
    /// 错误种类的短名称，写入诊断日志时使用。
    pub fn kind(&self) -> &'static str {
        match self {
            RequestIsNotUtf8 => "RequestIsNotUtf8",
            MalformedRequest => "MalformedRequest",
            UnSupportedRequestMethod => "UnSupportedRequestMethod",
            UnsupportedHttpVersion => "UnsupportedHttpVersion",
            RequestTooLarge(_) => "RequestTooLarge",
            MalformedQuery(_) => "MalformedQuery",
            InvalidPattern { .. } => "InvalidPatternError",
            DuplicateRoute { .. } => "DuplicateRouteError",
            UnknownAction { .. } => "UnknownAction",
            UnknownController(_) => "UnknownController",
            RouteNotFound(_) => "RouteNotFoundError",
            MissingArgument { .. } => "MissingArgumentError",
            UnexpectedArgument { .. } => "UnexpectedArgument",
        }
    }

    /// 该错误在请求期出现时应映射到的状态码。
    pub fn status_code(&self) -> u16 {
        match self {
            RequestIsNotUtf8 | MalformedRequest | MalformedQuery(_) | UnsupportedHttpVersion => 400,
            RequestTooLarge(_) => 413,
            UnSupportedRequestMethod => 501,
            _ => 500,
        }
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestIsNotUtf8 => write!(f, "Request bytes can't be parsed in UTF-8"),
            MalformedRequest => write!(f, "Malformed request head"),
            UnSupportedRequestMethod => write!(f, "Unsupported request method"),
            UnsupportedHttpVersion => write!(f, "Unsupported HTTP version"),
            RequestTooLarge(limit) => write!(f, "Request exceeds {} bytes", limit),
            MalformedQuery(raw) => write!(f, "Malformed percent-encoding in query: {}", raw),
            InvalidPattern { pattern, reason } => {
                write!(f, "Invalid route pattern {}: {}", pattern, reason)
            }
            DuplicateRoute { method, pattern } => {
                write!(f, "Route {} {} is already registered", method, pattern)
            }
            UnknownAction { controller, action } => {
                write!(f, "Controller {} declares no action named {}", controller, action)
            }
            UnknownController(name) => write!(f, "No controller registered as {}", name),
            RouteNotFound(handler) => write!(f, "No route registered for {}", handler),
            MissingArgument { pattern, name } => {
                write!(f, "Missing argument {} for route {}", name, pattern)
            }
            UnexpectedArgument { pattern, name } => {
                write!(f, "Argument {} is not consumed by route {}", name, pattern)
            }
        }
    }
}

impl Error for Exception {}
