// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 应用装配
//!
//! 启动时通过 `ApplicationBuilder` 声明控制器挂载点与静态根目录，
//! `build` 一次性编译全部路由并检查配置错误。构建出的 `Application` 之后只读，
//! 可以放进 `Arc` 在所有工作线程间共享；每个请求由独立的 `Dispatcher` 处理。

use std::{collections::HashMap, time::Instant};

use log::{debug, info, warn};

use crate::{
    controller::{Controller, ControllerEndpoint, Endpoint},
    dispatcher::Dispatcher,
    error_page,
    exception::Exception,
    request::Request,
    response::Response,
    router::{HandlerRef, RouteTable, RouteTableBuilder, Scope},
    statics::StaticFiles,
    util::Params,
};

pub struct Application {
    pub(crate) router: RouteTable,
    pub(crate) endpoints: HashMap<&'static str, Box<dyn Endpoint>>,
    pub(crate) public: Option<Box<dyn StaticFiles>>,
    pub(crate) shared: Option<Box<dyn StaticFiles>>,
}

impl Application {
    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::default()
    }

    pub fn router(&self) -> &RouteTable {
        &self.router
    }

    /// 处理一个请求。处理器失败在这里被转换为 500。
    pub fn call(&self, request: &Request) -> Response {
        let start_time = Instant::now();
        let response = match Dispatcher::new(self, request).dispatch() {
            Ok(response) => response,
            Err(failure) => error_page::render(request, &*failure),
        };
        if (400..500).contains(&response.status_code()) {
            warn!(
                "[ID{}]{} {} -> {}",
                request.id(),
                request.method(),
                request.path(),
                response.status_code()
            );
        }
        info!(
            "[ID{}] {}, {}, {}, {}, {}, {}ms",
            request.id(),
            request.version(),
            request.path(),
            request.method(),
            response.status_code(),
            response.information(),
            start_time.elapsed().as_millis()
        );
        response
    }

    /// 在请求之外生成链接
    pub fn path_for(&self, handler: HandlerRef, args: &Params) -> Result<String, Exception> {
        self.router.reverse(handler, args)
    }
}

type EndpointFactory = fn() -> Box<dyn Endpoint>;

fn endpoint_for<C: Controller>() -> Box<dyn Endpoint> {
    Box::new(ControllerEndpoint::<C>::new())
}

#[derive(Default)]
pub struct ApplicationBuilder {
    routes: RouteTableBuilder,
    factories: Vec<(&'static str, EndpointFactory)>,
    public: Option<Box<dyn StaticFiles>>,
    shared: Option<Box<dyn StaticFiles>>,
}

impl ApplicationBuilder {
    /// 挂载控制器 `C`：`declare` 中声明的子路径都会加上 `prefix`。
    pub fn mount<C, F>(mut self, prefix: &str, declare: F) -> Self
    where
        C: Controller,
        F: FnOnce(&mut Scope<'_>),
    {
        self.routes.mount(prefix, C::NAME, declare);
        if !self.factories.iter().any(|(name, _)| *name == C::NAME) {
            self.factories.push((C::NAME, endpoint_for::<C>));
        }
        self
    }

    /// 应用级静态根目录，优先于共享根目录
    pub fn public_root(mut self, statics: impl StaticFiles + 'static) -> Self {
        self.public = Some(Box::new(statics));
        self
    }

    /// 内置的共享静态根目录
    pub fn shared_root(mut self, statics: impl StaticFiles + 'static) -> Self {
        self.shared = Some(Box::new(statics));
        self
    }

    /// 编译全部路由。任何配置错误都在这里以 `Err` 返回，不会留到请求期。
    pub fn build(self) -> Result<Application, Exception> {
        let endpoints: HashMap<&'static str, Box<dyn Endpoint>> = self
            .factories
            .iter()
            .map(|(name, factory)| (*name, factory()))
            .collect();

        for handler in self.routes.handlers() {
            let endpoint = endpoints
                .get(handler.controller)
                .ok_or(Exception::UnknownController(handler.controller))?;
            if !endpoint.has_action(handler.action) {
                return Err(Exception::UnknownAction {
                    controller: handler.controller,
                    action: handler.action,
                });
            }
        }

        let router = self.routes.build()?;
        debug!("路由表构建完成，共{}条路由", router.len());
        Ok(Application {
            router,
            endpoints,
            public: self.public,
            shared: self.shared,
        })
    }
}
