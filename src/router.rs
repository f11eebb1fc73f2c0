// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 路由表模块
//!
//! 路由表在启动时由挂载语句一次性构建，之后只读，可以不加锁地被任意多个请求并发访问。
//!
//! - 正向：`find(method, path)` 给出最佳匹配、405 或 404 三种结果之一。
//! - 反向：`reverse(handler, args)` 从处理器引用还原出规范路径。
//!
//! 多个模式同时匹配时，静态段更多的模式优先，其次是先注册的模式，
//! 因此 `/users/new` 总是先于 `/users/:id`。

use std::{collections::BTreeSet, collections::HashMap, fmt};

use log::debug;

use crate::{
    exception::Exception,
    param::HttpRequestMethod,
    pattern::PathPattern,
    util::{join_path, Params},
};

/// 处理器的稳定标识：控制器名 + 动作名。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerRef {
    pub controller: &'static str,
    pub action: &'static str,
}

impl HandlerRef {
    pub const fn new(controller: &'static str, action: &'static str) -> Self {
        Self { controller, action }
    }
}

impl fmt::Display for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.controller, self.action)
    }
}

/// 一条 (方法, 模式, 处理器) 绑定
#[derive(Debug, Clone)]
pub struct RouteEntry {
    method: HttpRequestMethod,
    pattern: PathPattern,
    handler: HandlerRef,
}

impl RouteEntry {
    pub fn method(&self) -> HttpRequestMethod {
        self.method
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    pub fn handler(&self) -> HandlerRef {
        self.handler
    }
}

/// 一次正向查找的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    Matched { handler: HandlerRef, params: Params },
    MethodNotAllowed(BTreeSet<HttpRequestMethod>),
    NotFound,
}

#[derive(Debug, Default)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
    reverse: HashMap<HandlerRef, usize>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> RouteTableBuilder {
        RouteTableBuilder::default()
    }

    /// 注册一条路由。模式先完成编译和查重，随后正向条目与反向索引一起写入。
    pub fn register(
        &mut self,
        method: HttpRequestMethod,
        pattern: &str,
        handler: HandlerRef,
    ) -> Result<(), Exception> {
        let pattern = PathPattern::compile(pattern)?;
        if self
            .entries
            .iter()
            .any(|e| e.method == method && e.pattern.is_equivalent(&pattern))
        {
            return Err(Exception::DuplicateRoute {
                method,
                pattern: pattern.as_str().to_string(),
            });
        }
        debug!("注册路由 {} {} -> {}", method, pattern, handler);
        self.reverse.entry(handler).or_insert(self.entries.len());
        self.entries.push(RouteEntry {
            method,
            pattern,
            handler,
        });
        Ok(())
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 查找请求对应的路由。
    ///
    /// HEAD 请求在没有显式 HEAD 路由时落到 GET 路由上。
    pub fn find(&self, method: HttpRequestMethod, path: &str) -> MatchOutcome {
        let mut any_match = false;
        let mut best: Option<(&RouteEntry, Params)> = None;
        let mut best_fallback: Option<(&RouteEntry, Params)> = None;

        for entry in &self.entries {
            let params = match entry.pattern.match_path(path) {
                Some(params) => params,
                None => continue,
            };
            any_match = true;
            let slot = if entry.method == method {
                &mut best
            } else if method == HttpRequestMethod::Head && entry.method == HttpRequestMethod::Get
            {
                &mut best_fallback
            } else {
                continue;
            };
            // 严格大于：静态段相同时保留先注册的条目
            let better = match slot {
                Some((current, _)) => {
                    entry.pattern.static_count() > current.pattern.static_count()
                }
                None => true,
            };
            if better {
                *slot = Some((entry, params));
            }
        }

        match best.or(best_fallback) {
            Some((entry, params)) => MatchOutcome::Matched {
                handler: entry.handler,
                params,
            },
            None if any_match => MatchOutcome::MethodNotAllowed(self.allowed_methods(path)),
            None => MatchOutcome::NotFound,
        }
    }

    /// 路径上可用的方法集合（有序、去重）。
    ///
    /// 只要有路由匹配，集合就包含 OPTIONS；存在 GET 时同时包含 HEAD。没有任何匹配时为空集。
    pub fn allowed_methods(&self, path: &str) -> BTreeSet<HttpRequestMethod> {
        let mut methods: BTreeSet<HttpRequestMethod> = self
            .entries
            .iter()
            .filter(|e| e.pattern.match_path(path).is_some())
            .map(|e| e.method)
            .collect();
        if methods.is_empty() {
            return methods;
        }
        if methods.contains(&HttpRequestMethod::Get) {
            methods.insert(HttpRequestMethod::Head);
        }
        methods.insert(HttpRequestMethod::Options);
        methods
    }

    /// 处理器引用注册时使用的模式（同一处理器注册多次时取第一次）。
    pub fn pattern_for(&self, handler: HandlerRef) -> Result<&PathPattern, Exception> {
        self.reverse
            .get(&handler)
            .map(|&index| &self.entries[index].pattern)
            .ok_or_else(|| Exception::RouteNotFound(handler.to_string()))
    }

    /// 反向查找：处理器引用 + 参数 -> 规范路径
    pub fn reverse(&self, handler: HandlerRef, args: &Params) -> Result<String, Exception> {
        self.pattern_for(handler)?.build(args)
    }

    /// 与 `reverse` 相同，但参数按模式中的声明顺序以位置传入。
    pub fn reverse_positional(
        &self,
        handler: HandlerRef,
        values: &[&str],
    ) -> Result<String, Exception> {
        self.pattern_for(handler)?.build_positional(values)
    }
}

#[derive(Debug)]
struct PendingRoute {
    method: HttpRequestMethod,
    pattern: String,
    handler: HandlerRef,
}

/// 路由表构建器：收集挂载语句，最后一次性写入不可变的路由表。
#[derive(Debug, Default)]
pub struct RouteTableBuilder {
    pending: Vec<PendingRoute>,
}

impl RouteTableBuilder {
    /// 以 `prefix` 为前缀，为名为 `controller` 的控制器声明一组路由。
    pub fn mount<F>(&mut self, prefix: &str, controller: &'static str, declare: F) -> &mut Self
    where
        F: FnOnce(&mut Scope<'_>),
    {
        let mut scope = Scope {
            prefix: join_path(prefix, "/"),
            controller,
            pending: &mut self.pending,
        };
        declare(&mut scope);
        self
    }

    /// 所有已声明路由的处理器引用，按声明顺序
    pub fn handlers(&self) -> impl Iterator<Item = HandlerRef> + '_ {
        self.pending.iter().map(|p| p.handler)
    }

    pub fn build(self) -> Result<RouteTable, Exception> {
        let mut table = RouteTable::new();
        for route in self.pending {
            table.register(route.method, &route.pattern, route.handler)?;
        }
        Ok(table)
    }
}

/// 挂载块内的注册上下文，所有路径都已加上外层前缀。
pub struct Scope<'a> {
    prefix: String,
    controller: &'static str,
    pending: &'a mut Vec<PendingRoute>,
}

impl Scope<'_> {
    pub fn route(
        &mut self,
        method: HttpRequestMethod,
        path: &str,
        action: &'static str,
    ) -> &mut Self {
        self.pending.push(PendingRoute {
            method,
            pattern: join_path(&self.prefix, path),
            handler: HandlerRef::new(self.controller, action),
        });
        self
    }

    pub fn get(&mut self, path: &str, action: &'static str) -> &mut Self {
        self.route(HttpRequestMethod::Get, path, action)
    }

    pub fn post(&mut self, path: &str, action: &'static str) -> &mut Self {
        self.route(HttpRequestMethod::Post, path, action)
    }

    pub fn put(&mut self, path: &str, action: &'static str) -> &mut Self {
        self.route(HttpRequestMethod::Put, path, action)
    }

    pub fn patch(&mut self, path: &str, action: &'static str) -> &mut Self {
        self.route(HttpRequestMethod::Patch, path, action)
    }

    pub fn delete(&mut self, path: &str, action: &'static str) -> &mut Self {
        self.route(HttpRequestMethod::Delete, path, action)
    }

    pub fn options(&mut self, path: &str, action: &'static str) -> &mut Self {
        self.route(HttpRequestMethod::Options, path, action)
    }

    pub fn head(&mut self, path: &str, action: &'static str) -> &mut Self {
        self.route(HttpRequestMethod::Head, path, action)
    }

    /// 嵌套挂载：子块内的路径再叠加一层前缀
    pub fn scope<F>(&mut self, prefix: &str, declare: F) -> &mut Self
    where
        F: FnOnce(&mut Scope<'_>),
    {
        let mut nested = Scope {
            prefix: join_path(&self.prefix, prefix),
            controller: self.controller,
            pending: &mut *self.pending,
        };
        declare(&mut nested);
        self
    }
}
