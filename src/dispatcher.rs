// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 请求分发状态机
//!
//! 每个请求按固定顺序经过以下状态：
//!
//! ```text
//! START ─ OPTIONS? ─> TRY_OPTIONS ────────────────────────────┐
//!   └──> TRY_STATIC(应用) ─> TRY_STATIC(共享) ─> TRY_ROUTE ─┬─> FINALIZE
//!                                                 └─> NOT_FOUND ─┤
//!                                                 HALTED ────────┘
//! ```
//!
//! 任何一步命中或 halt 都直接进入收尾；处理器失败不在这里消化，
//! 原样交给上层的错误页。

use std::error::Error;

use log::{debug, warn};

use crate::{
    app::Application,
    context::{Context, Halt, Interrupt},
    controller::Endpoint,
    error_page::default_page,
    exception::Exception,
    param::{join_methods, HttpRequestMethod, DEFAULT_CONTENT_TYPE},
    request::Request,
    response::Response,
    router::MatchOutcome,
    statics::StaticFiles,
};

pub type DispatchError = Box<dyn Error + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StaticRoot {
    App,
    Shared,
}

#[derive(Debug)]
enum State {
    Start,
    TryOptions,
    TryStatic(StaticRoot),
    TryRoute,
    NotFound,
    Halted(Halt),
    Finalize,
}

pub struct Dispatcher<'a> {
    app: &'a Application,
    request: &'a Request,
    ctx: Context<'a>,
    /// 匹配到路由时对应的控制器，用于选择默认页面
    matched: Option<&'a dyn Endpoint>,
}

impl<'a> Dispatcher<'a> {
    pub fn new(app: &'a Application, request: &'a Request) -> Self {
        Self {
            app,
            request,
            ctx: Context::new(request, &app.router),
            matched: None,
        }
    }

    pub fn dispatch(mut self) -> Result<Response, DispatchError> {
        let id = self.request.id();
        let mut state = State::Start;
        loop {
            debug!("[ID{}]分发状态：{:?}", id, state);
            state = match state {
                State::Start => self.start(),
                State::TryOptions => self.try_options(),
                State::TryStatic(root) => self.try_static(root),
                State::TryRoute => self.try_route()?,
                State::NotFound => self.not_found(),
                State::Halted(halt) => self.halted(halt),
                State::Finalize => return Ok(self.finalize()),
            };
        }
    }

    fn start(&self) -> State {
        if self.request.method() == HttpRequestMethod::Options {
            State::TryOptions
        } else {
            State::TryStatic(StaticRoot::App)
        }
    }

    fn try_options(&mut self) -> State {
        let allowed = self.app.router.allowed_methods(self.request.path());
        if allowed.is_empty() {
            return State::Halted(Halt::status(404));
        }
        self.ctx
            .set_status(200)
            .set_header("Allow", &join_methods(&allowed))
            .set_body("");
        State::Finalize
    }

    fn try_static(&mut self, root: StaticRoot) -> State {
        let next = match root {
            StaticRoot::App => State::TryStatic(StaticRoot::Shared),
            StaticRoot::Shared => State::TryRoute,
        };
        if !matches!(
            self.request.method(),
            HttpRequestMethod::Get | HttpRequestMethod::Head
        ) {
            return State::TryRoute;
        }
        let statics: Option<&dyn StaticFiles> = match root {
            StaticRoot::App => self.app.public.as_deref(),
            StaticRoot::Shared => self.app.shared.as_deref(),
        };
        match statics.and_then(|s| s.lookup(self.request.path())) {
            Some(asset) => {
                self.ctx
                    .set_status(200)
                    .set_content_type(&asset.content_type)
                    .set_body(asset.content);
                State::Finalize
            }
            None => next,
        }
    }

    fn try_route(&mut self) -> Result<State, DispatchError> {
        let app = self.app;
        let id = self.request.id();
        match app.router.find(self.request.method(), self.request.path()) {
            MatchOutcome::Matched { handler, params } => {
                let endpoint = app
                    .endpoints
                    .get(handler.controller)
                    .map(|e| e.as_ref())
                    .ok_or(Exception::UnknownController(handler.controller))?;
                self.matched = Some(endpoint);
                let query = match self.request.query_params() {
                    Ok(query) => query,
                    Err(e) => {
                        warn!("[ID{}]查询串无法解析：{}", id, e);
                        return Ok(State::Halted(Halt::status(400)));
                    }
                };
                debug!("[ID{}]匹配到{}，参数{:?}", id, handler, params);
                self.ctx.bind(params.clone(), query);
                match endpoint.invoke(handler.action, &mut self.ctx, &params) {
                    Ok(body) => {
                        if self.ctx.body().is_none() {
                            self.ctx.set_body(body);
                        }
                        Ok(State::Finalize)
                    }
                    Err(Interrupt::Halt(halt)) => Ok(State::Halted(halt)),
                    Err(Interrupt::Error(failure)) => Err(failure),
                }
            }
            MatchOutcome::MethodNotAllowed(allowed) => {
                self.ctx
                    .set_status(405)
                    .set_header("Allow", &join_methods(&allowed))
                    .set_body(default_page(405));
                Ok(State::Finalize)
            }
            MatchOutcome::NotFound => Ok(State::NotFound),
        }
    }

    fn not_found(&mut self) -> State {
        self.ctx.set_status(404).set_body(default_page(404));
        State::Finalize
    }

    /// halt 之后没有响应体的非 2xx 状态补上默认页面，控制器可以提供自己的版本
    fn halted(&mut self, halt: Halt) -> State {
        debug!(
            "[ID{}]halt：status={:?}",
            self.request.id(),
            halt.status_code()
        );
        self.ctx.apply(halt);
        let status = self.ctx.status().unwrap_or(200);
        let empty = self.ctx.body().map_or(true, |b| b.is_empty());
        if empty && !(200..300).contains(&status) {
            let body = self
                .matched
                .and_then(|e| e.default_body(status))
                .unwrap_or_else(|| default_page(status));
            self.ctx.set_body(body);
        }
        State::Finalize
    }

    fn finalize(self) -> Response {
        let method = self.request.method();
        let (status, body, headers) = self.ctx.into_parts();
        let mut response = Response::with_status(status.unwrap_or(200));
        for (name, value) in &headers {
            response.append_header(name, value);
        }
        let body = body.unwrap_or_default();
        if !body.is_empty() && response.header("Content-Type").is_none() {
            response.set_header("Content-Type", DEFAULT_CONTENT_TYPE);
        }
        response.set_body(body);
        if method == HttpRequestMethod::Head {
            response.strip_body();
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        context::ActionResult,
        controller::{Action, Args, Controller},
        router::HandlerRef,
        statics::Asset,
        util::Params,
    };
    use bytes::Bytes;
    use mockall::mock;
    use std::sync::atomic::{AtomicUsize, Ordering};

    mock! {
        Statics {}
        impl StaticFiles for Statics {
            fn lookup(&self, path: &str) -> Option<Asset>;
        }
    }

    static GUARD_REACHED: AtomicUsize = AtomicUsize::new(0);

    #[derive(Default)]
    struct Notes;

    impl Notes {
        fn index(&mut self, _ctx: &mut Context<'_>, _args: &Args) -> ActionResult {
            Ok("all notes".to_string())
        }

        fn show(&mut self, ctx: &mut Context<'_>, args: &Args) -> ActionResult {
            let id: u32 = args.parse("id")?.unwrap_or_default();
            if id == 0 {
                return Err(Halt::status(404).into());
            }
            ctx.set_header("X-Note", &id.to_string());
            Ok(format!("note {}", id))
        }

        fn guarded(&mut self, ctx: &mut Context<'_>, _args: &Args) -> ActionResult {
            GUARD_REACHED.fetch_add(1, Ordering::SeqCst);
            ctx.set_status(201);
            if ctx.query("token").is_none() {
                return Err(Halt::status(401).into());
            }
            GUARD_REACHED.fetch_add(100, Ordering::SeqCst);
            Ok("welcome".to_string())
        }

        fn moved(&mut self, ctx: &mut Context<'_>, _args: &Args) -> ActionResult {
            let target = ctx.path_for(HandlerRef::of::<Notes>("index"), &Params::new())?;
            Err(Halt::redirect(&target).into())
        }

        fn boom(&mut self, _ctx: &mut Context<'_>, _args: &Args) -> ActionResult {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk on fire").into())
        }
    }

    impl Controller for Notes {
        const NAME: &'static str = "notes";

        fn actions() -> Vec<Action<Self>> {
            vec![
                Action::new("index", &[], Self::index),
                Action::new("show", &["id"], Self::show),
                Action::new("guarded", &[], Self::guarded),
                Action::new("moved", &[], Self::moved),
                Action::new("boom", &[], Self::boom),
            ]
        }

        fn default_body(status: u16) -> Option<String> {
            (status == 404).then(|| "<p>note missing</p>".to_string())
        }
    }

    fn builder() -> crate::app::ApplicationBuilder {
        Application::builder().mount::<Notes, _>("/notes", |s| {
            s.get("/", "index")
                .get("/:id", "show")
                .post("/", "index")
                .get("/guarded", "guarded")
                .get("/moved", "moved")
                .get("/boom", "boom");
        })
    }

    fn app() -> Application {
        builder().build().unwrap()
    }

    fn dispatch(app: &Application, method: HttpRequestMethod, target: &str) -> Response {
        let request = Request::new(method, target);
        Dispatcher::new(app, &request).dispatch().unwrap()
    }

    #[test]
    fn test_matched_route() {
        let app = app();
        let response = dispatch(&app, HttpRequestMethod::Get, "/notes/7");
        assert_eq!(response.status_code(), 200);
        assert_eq!(response.body_text(), "note 7");
        assert_eq!(response.header("X-Note"), Some("7"));
        assert_eq!(response.header("Content-Type"), Some(DEFAULT_CONTENT_TYPE));
    }

    /// halt 之后的代码不执行，之前设置的状态被覆盖
    #[test]
    fn test_halt_stops_handler() {
        let app = app();
        let before = GUARD_REACHED.load(Ordering::SeqCst);
        let response = dispatch(&app, HttpRequestMethod::Get, "/notes/guarded");
        assert_eq!(response.status_code(), 401);
        assert_eq!(response.body_text(), "<h1>Unauthorized</h1>");
        assert_eq!(GUARD_REACHED.load(Ordering::SeqCst) - before, 1);
    }

    #[test]
    fn test_controller_default_body() {
        let app = app();
        let response = dispatch(&app, HttpRequestMethod::Get, "/notes/0");
        assert_eq!(response.status_code(), 404);
        assert_eq!(response.body_text(), "<p>note missing</p>");
    }

    #[test]
    fn test_redirect() {
        let app = app();
        let response = dispatch(&app, HttpRequestMethod::Get, "/notes/moved");
        assert_eq!(response.status_code(), 302);
        assert_eq!(response.header("Location"), Some("/notes"));
        assert_eq!(response.body_text(), "<h1>Found</h1>");
    }

    #[test]
    fn test_not_found() {
        let app = app();
        let response = dispatch(&app, HttpRequestMethod::Get, "/nothing/here");
        assert_eq!(response.status_code(), 404);
        assert_eq!(response.body_text(), "<h1>Not Found</h1>");
        assert!(response.header("Allow").is_none());
    }

    #[test]
    fn test_method_not_allowed() {
        let app = app();
        let response = dispatch(&app, HttpRequestMethod::Delete, "/notes");
        assert_eq!(response.status_code(), 405);
        assert_eq!(response.header("Allow"), Some("GET, HEAD, OPTIONS, POST"));
        assert_eq!(response.body_text(), "<h1>Method Not Allowed</h1>");
    }

    #[test]
    fn test_options() {
        let app = app();
        let response = dispatch(&app, HttpRequestMethod::Options, "/notes/3");
        assert_eq!(response.status_code(), 200);
        assert_eq!(response.header("Allow"), Some("GET, HEAD, OPTIONS"));
        assert!(response.body().is_empty());
        assert!(response.header("Content-Type").is_none());

        let response = dispatch(&app, HttpRequestMethod::Options, "/missing");
        assert_eq!(response.status_code(), 404);
        assert!(response.header("Allow").is_none());
        assert_eq!(response.body_text(), "<h1>Not Found</h1>");
    }

    #[test]
    fn test_head_uses_get_route_without_body() {
        let app = app();
        let response = dispatch(&app, HttpRequestMethod::Head, "/notes/7");
        assert_eq!(response.status_code(), 200);
        assert!(response.body().is_empty());
        assert_eq!(response.content_length(), "note 7".len() as u64);
    }

    #[test]
    fn test_malformed_query_is_bad_request() {
        let app = app();
        let response = dispatch(&app, HttpRequestMethod::Get, "/notes/guarded?token=%zz");
        assert_eq!(response.status_code(), 400);
        assert_eq!(response.body_text(), "<h1>Bad Request</h1>");
    }

    #[test]
    fn test_handler_failure_propagates() {
        let app = app();
        let request = Request::new(HttpRequestMethod::Get, "/notes/boom");
        let failure = Dispatcher::new(&app, &request).dispatch().unwrap_err();
        assert_eq!(failure.to_string(), "disk on fire");
    }

    /// 应用静态目录优先，其次共享目录，最后才是路由
    #[test]
    fn test_static_order() {
        let mut public = MockStatics::new();
        public
            .expect_lookup()
            .returning(|path| {
                (path == "/notes/7").then(|| Asset {
                    content: Bytes::from("static note"),
                    content_type: "text/plain;charset=utf-8".to_string(),
                })
            });
        let mut shared = MockStatics::new();
        shared
            .expect_lookup()
            .returning(|path| {
                (path == "/favicon.ico").then(|| Asset {
                    content: Bytes::from_static(b"\x00\x00\x01\x00"),
                    content_type: "image/x-icon".to_string(),
                })
            });
        let app = builder()
            .public_root(public)
            .shared_root(shared)
            .build()
            .unwrap();

        let response = dispatch(&app, HttpRequestMethod::Get, "/notes/7");
        assert_eq!(response.body_text(), "static note");
        assert_eq!(response.header("Content-Type"), Some("text/plain;charset=utf-8"));

        let response = dispatch(&app, HttpRequestMethod::Get, "/favicon.ico");
        assert_eq!(response.status_code(), 200);
        assert_eq!(response.header("Content-Type"), Some("image/x-icon"));

        let response = dispatch(&app, HttpRequestMethod::Get, "/notes/8");
        assert_eq!(response.body_text(), "note 8");
    }

    /// 非 GET/HEAD 请求不查询静态文件
    #[test]
    fn test_static_skipped_for_post() {
        let mut public = MockStatics::new();
        public.expect_lookup().never();
        let app = builder().public_root(public).build().unwrap();
        let response = dispatch(&app, HttpRequestMethod::Post, "/notes");
        assert_eq!(response.status_code(), 200);
        assert_eq!(response.body_text(), "all notes");
    }
}
