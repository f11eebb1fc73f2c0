// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 请求上下文与 halt
//!
//! `Context` 持有一次请求的全部可变输出状态（状态码、响应体、标头），处理器通过它读写；
//! 它只属于当前请求，请求结束即丢弃。
//!
//! 提前中断通过 `Interrupt` 实现：处理器返回 `Err(Halt)`，`?` 把它沿调用链向上传播，
//! 分发器的收尾步骤是唯一的消费者。halt 之后的处理器代码不会再执行，
//! 状态与响应体也就不会再被修改。

use std::{error::Error, fmt};

use bytes::Bytes;

use crate::{
    exception::Exception,
    param::HttpRequestMethod,
    request::Request,
    router::{HandlerRef, RouteTable},
    util::{build_query, Params},
};

/// 动作的返回值：正常返回的文本作为响应体，或一次中断
pub type ActionResult = Result<String, Interrupt>;

/// halt 携带的覆盖项，未设置的部分沿用上下文中已有的值
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Halt {
    status: Option<u16>,
    body: Option<Bytes>,
    headers: Vec<(String, String)>,
}

impl Halt {
    /// 不改变状态码与响应体的 halt，常用于只追加标头
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(code: u16) -> Self {
        Self {
            status: Some(code),
            ..Self::default()
        }
    }

    /// 302 跳转
    pub fn redirect(location: &str) -> Self {
        Self::status(302).with_header("Location", location)
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn status_code(&self) -> Option<u16> {
        self.status
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }
}

/// 处理器的非正常返回：halt，或交给外层错误页的失败。
#[derive(Debug)]
pub enum Interrupt {
    Halt(Halt),
    Error(Box<dyn Error + Send + Sync>),
}

impl From<Halt> for Interrupt {
    fn from(halt: Halt) -> Self {
        Interrupt::Halt(halt)
    }
}

impl<E> From<E> for Interrupt
where
    E: Error + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        Interrupt::Error(Box::new(error))
    }
}

impl fmt::Display for Interrupt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interrupt::Halt(halt) => write!(f, "halt({:?})", halt.status),
            Interrupt::Error(e) => write!(f, "{}", e),
        }
    }
}

pub struct Context<'a> {
    request: &'a Request,
    router: &'a RouteTable,
    params: Params,
    query: Params,
    status: Option<u16>,
    body: Option<Bytes>,
    headers: Vec<(String, String)>,
}

impl<'a> Context<'a> {
    pub(crate) fn new(request: &'a Request, router: &'a RouteTable) -> Self {
        Self {
            request,
            router,
            params: Params::new(),
            query: Params::new(),
            status: None,
            body: None,
            headers: Vec::new(),
        }
    }

    pub(crate) fn bind(&mut self, params: Params, query: Params) {
        self.params = params;
        self.query = query;
    }

    /// 把 halt 的覆盖项写入上下文
    pub(crate) fn apply(&mut self, halt: Halt) {
        if let Some(code) = halt.status {
            self.status = Some(code);
        }
        if let Some(body) = halt.body {
            self.body = Some(body);
        }
        for (name, value) in halt.headers {
            self.set_header(&name, &value);
        }
    }

    pub(crate) fn into_parts(self) -> (Option<u16>, Option<Bytes>, Vec<(String, String)>) {
        (self.status, self.body, self.headers)
    }

    pub fn request(&self) -> &Request {
        self.request
    }

    pub fn method(&self) -> HttpRequestMethod {
        self.request.method()
    }

    pub fn path(&self) -> &str {
        self.request.path()
    }

    /// 路由捕获的全部参数，包括动作没有声明的
    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn query(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    pub fn query_params(&self) -> &Params {
        &self.query
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn set_status(&mut self, code: u16) -> &mut Self {
        self.status = Some(code);
        self
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// 显式设置响应体；动作的返回值不会再覆盖它
    pub fn set_body(&mut self, body: impl Into<Bytes>) -> &mut Self {
        self.body = Some(body.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn set_header(&mut self, name: &str, value: &str) -> &mut Self {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn append_header(&mut self, name: &str, value: &str) -> &mut Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn set_content_type(&mut self, content_type: &str) -> &mut Self {
        self.set_header("Content-Type", content_type)
    }

    /// 由处理器引用生成链接
    pub fn path_for(&self, handler: HandlerRef, args: &Params) -> Result<String, Exception> {
        self.router.reverse(handler, args)
    }

    pub fn path_for_positional(
        &self,
        handler: HandlerRef,
        values: &[&str],
    ) -> Result<String, Exception> {
        self.router.reverse_positional(handler, values)
    }

    /// 生成链接并附加查询串，查询参数与路径参数分开传入
    pub fn url_for(
        &self,
        handler: HandlerRef,
        args: &Params,
        query: &[(&str, &str)],
    ) -> Result<String, Exception> {
        let path = self.router.reverse(handler, args)?;
        if query.is_empty() {
            Ok(path)
        } else {
            Ok(format!("{}?{}", path, build_query(query)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RouteTable {
        let mut table = RouteTable::new();
        table
            .register(HttpRequestMethod::Get, "/users/:id", HandlerRef::new("users", "show"))
            .unwrap();
        table
    }

    #[test]
    fn test_halt_builders() {
        let halt = Halt::status(403).with_body("nope").with_header("X-Reason", "acl");
        assert_eq!(halt.status_code(), Some(403));
        assert_eq!(halt.body().map(|b| b.as_ref()), Some(&b"nope"[..]));
        assert_eq!(halt.headers(), &[("X-Reason".to_string(), "acl".to_string())]);

        let redirect = Halt::redirect("/login");
        assert_eq!(redirect.status_code(), Some(302));
        assert_eq!(redirect.headers()[0].1, "/login");
    }

    #[test]
    fn test_question_mark_converts_into_interrupt() {
        fn guarded(allowed: bool) -> Result<u8, Interrupt> {
            if !allowed {
                return Err(Halt::status(401).into());
            }
            let n: u8 = "12".parse()?;
            Ok(n)
        }
        assert!(matches!(guarded(false), Err(Interrupt::Halt(_))));
        assert_eq!(guarded(true).unwrap(), 12);

        fn failing() -> Result<u8, Interrupt> {
            Ok("x".parse::<u8>()?)
        }
        assert!(matches!(failing(), Err(Interrupt::Error(_))));
    }

    #[test]
    fn test_apply_halt_overrides() {
        let request = Request::new(HttpRequestMethod::Get, "/users/1");
        let router = table();
        let mut ctx = Context::new(&request, &router);
        ctx.set_status(201).set_body("draft").set_header("X-Trace", "1");
        ctx.apply(Halt::status(404).with_header("x-trace", "2"));

        let (status, body, headers) = ctx.into_parts();
        assert_eq!(status, Some(404));
        assert_eq!(body, Some(Bytes::from("draft")));
        assert_eq!(headers, vec![("x-trace".to_string(), "2".to_string())]);
    }

    #[test]
    fn test_empty_halt_keeps_context_values() {
        let request = Request::new(HttpRequestMethod::Get, "/users/1");
        let router = table();
        let mut ctx = Context::new(&request, &router);
        ctx.set_status(202).set_body("queued");
        ctx.apply(Halt::new().with_header("Retry-After", "5"));

        let (status, body, headers) = ctx.into_parts();
        assert_eq!(status, Some(202));
        assert_eq!(body, Some(Bytes::from("queued")));
        assert_eq!(headers, vec![("Retry-After".to_string(), "5".to_string())]);
        assert_eq!(Halt::new(), Halt::default());
    }

    #[test]
    fn test_links() {
        let request = Request::new(HttpRequestMethod::Get, "/");
        let router = table();
        let ctx = Context::new(&request, &router);
        let show = HandlerRef::new("users", "show");
        let mut args = Params::new();
        args.insert("id".to_string(), "5".to_string());

        assert_eq!(ctx.path_for(show, &args).unwrap(), "/users/5");
        assert_eq!(ctx.path_for_positional(show, &["6"]).unwrap(), "/users/6");
        assert_eq!(
            ctx.url_for(show, &args, &[("tab", "posts")]).unwrap(),
            "/users/5?tab=posts"
        );
        assert!(matches!(
            ctx.path_for(HandlerRef::new("users", "edit"), &args),
            Err(Exception::RouteNotFound(_))
        ));
    }
}
