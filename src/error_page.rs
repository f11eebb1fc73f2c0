// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! 默认页面与 500 错误页。
//!
//! 处理器抛出的失败不会被分发器吞掉或重试，而是一路传到这里：
//! 记录诊断信息（时间戳、错误种类、消息、调用栈、请求环境），然后生成 500 响应。

use std::{backtrace::Backtrace, error::Error};

use chrono::Local;
use log::error;

use crate::{
    exception::Exception,
    param::{status_text, HttpRequestMethod, DEFAULT_CONTENT_TYPE},
    request::Request,
    response::Response,
};

/// 通用的默认响应体，例如 `<h1>Not Found</h1>`
pub fn default_page(status: u16) -> String {
    format!("<h1>{}</h1>", status_text(status))
}

/// 根据状态码生成带默认页面的完整响应
pub fn status_response(request: &Request, status: u16) -> Response {
    let mut response = Response::with_status(status);
    response
        .set_header("Content-Type", DEFAULT_CONTENT_TYPE)
        .set_body(default_page(status));
    if request.method() == HttpRequestMethod::Head {
        response.strip_body();
    }
    response
}

fn error_kind(failure: &(dyn Error + 'static)) -> String {
    match failure.downcast_ref::<Exception>() {
        Some(exception) => exception.kind().to_string(),
        None => "HandlerError".to_string(),
    }
}

/// 记录处理器失败并生成 500 响应
pub fn render(request: &Request, failure: &(dyn Error + 'static)) -> Response {
    let backtrace = Backtrace::capture();
    let mut causes = Vec::new();
    let mut source = failure.source();
    while let Some(cause) = source {
        causes.push(cause.to_string());
        source = cause.source();
    }
    error!(
        "[ID{}]{} {}: {} (caused by: {:?})\nenvironment: {}\nbacktrace:\n{}",
        request.id(),
        Local::now().format("%Y-%m-%d %H:%M:%S%.3f %Z"),
        error_kind(failure),
        failure,
        causes,
        request.environment(),
        backtrace
    );
    status_response(request, 500)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_page() {
        assert_eq!(default_page(404), "<h1>Not Found</h1>");
        assert_eq!(default_page(405), "<h1>Method Not Allowed</h1>");
    }

    #[test]
    fn test_render_produces_500() {
        let request = Request::new(HttpRequestMethod::Get, "/boom");
        let failure = Exception::RouteNotFound("users#gone".to_string());
        let response = render(&request, &failure);
        assert_eq!(response.status_code(), 500);
        assert_eq!(response.body_text(), "<h1>Internal Server Error</h1>");
        assert_eq!(response.header("Content-Type"), Some(DEFAULT_CONTENT_TYPE));
    }

    #[test]
    fn test_render_head_has_no_body() {
        let request = Request::new(HttpRequestMethod::Head, "/boom");
        let failure = "x".parse::<u8>().unwrap_err();
        let response = render(&request, &failure);
        assert_eq!(response.status_code(), 500);
        assert!(response.body().is_empty());
        assert!(response.content_length() > 0);
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(error_kind(&Exception::MalformedRequest), "MalformedRequest");
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk");
        assert_eq!(error_kind(&io), "HandlerError");
    }
}
