// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 控制器与动作描述
//!
//! 控制器在挂载时注册一份显式的动作表：动作名、按顺序声明的参数名、以及函数指针。
//! 分发器按处理器引用查表调用，不依赖任何运行时反射。
//! 每个请求都会构造一个新的控制器实例，请求之间不共享处理器状态。

use std::{collections::HashMap, fmt, str::FromStr};

use crate::{
    context::{ActionResult, Context, Interrupt},
    exception::Exception,
    router::HandlerRef,
    util::Params,
};

/// 动作函数指针
pub type ActionFn<C> = fn(&mut C, &mut Context<'_>, &Args) -> ActionResult;

/// 一个动作的签名描述
pub struct Action<C> {
    name: &'static str,
    params: &'static [&'static str],
    handler: ActionFn<C>,
}

impl<C> Action<C> {
    pub fn new(name: &'static str, params: &'static [&'static str], handler: ActionFn<C>) -> Self {
        Self {
            name,
            params,
            handler,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn params(&self) -> &'static [&'static str] {
        self.params
    }
}

impl<C> fmt::Debug for Action<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish()
    }
}

pub trait Controller: Default + 'static {
    /// 控制器在路由表中的名字
    const NAME: &'static str;

    fn actions() -> Vec<Action<Self>>;

    /// 为 halt 后没有响应体的非 2xx 状态提供自定义页面，返回 `None` 使用通用页面。
    fn default_body(_status: u16) -> Option<String> {
        None
    }
}

impl HandlerRef {
    pub fn of<C: Controller>(action: &'static str) -> Self {
        HandlerRef::new(C::NAME, action)
    }
}

/// 传给动作的参数：路由捕获的参数中、动作声明过的那些，按声明顺序排列。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Args {
    values: Vec<(&'static str, String)>,
}

impl Args {
    pub(crate) fn select(declared: &'static [&'static str], captured: &Params) -> Self {
        let values = declared
            .iter()
            .filter_map(|&name| captured.get(name).map(|v| (name, v.clone())))
            .collect();
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn positional(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(|(_, v)| v.as_str())
    }

    /// 把参数转换为目标类型；参数缺失返回 `Ok(None)`，转换失败交给外层处理。
    pub fn parse<T>(&self, name: &str) -> Result<Option<T>, Interrupt>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        match self.get(name) {
            Some(raw) => Ok(Some(raw.parse::<T>()?)),
            None => Ok(None),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// 擦除了具体控制器类型的调用入口，供应用按名字保存。
pub(crate) trait Endpoint: Send + Sync {
    fn has_action(&self, action: &str) -> bool;

    fn invoke(&self, action: &str, ctx: &mut Context<'_>, params: &Params) -> ActionResult;

    fn default_body(&self, status: u16) -> Option<String>;
}

pub(crate) struct ControllerEndpoint<C: Controller> {
    actions: HashMap<&'static str, Action<C>>,
}

impl<C: Controller> ControllerEndpoint<C> {
    pub(crate) fn new() -> Self {
        let actions = C::actions().into_iter().map(|a| (a.name, a)).collect();
        Self { actions }
    }
}

impl<C: Controller> Endpoint for ControllerEndpoint<C> {
    fn has_action(&self, action: &str) -> bool {
        self.actions.contains_key(action)
    }

    fn invoke(&self, action: &str, ctx: &mut Context<'_>, params: &Params) -> ActionResult {
        let entry = match self.actions.get(action) {
            Some(entry) => entry,
            None => {
                return Err(Exception::RouteNotFound(format!("{}#{}", C::NAME, action)).into())
            }
        };
        let args = Args::select(entry.params, params);
        let mut controller = C::default();
        (entry.handler)(&mut controller, ctx, &args)
    }

    fn default_body(&self, status: u16) -> Option<String> {
        C::default_body(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{param::HttpRequestMethod, request::Request, router::RouteTable};

    #[derive(Default)]
    struct Posts {
        calls: u32,
    }

    impl Posts {
        fn show(&mut self, _ctx: &mut Context<'_>, args: &Args) -> ActionResult {
            self.calls += 1;
            Ok(format!(
                "{}:{}:{}",
                args.len(),
                args.get("id").unwrap_or("-"),
                self.calls
            ))
        }
    }

    impl Controller for Posts {
        const NAME: &'static str = "posts";

        fn actions() -> Vec<Action<Self>> {
            vec![Action::new("show", &["id", "format"], Self::show)]
        }

        fn default_body(status: u16) -> Option<String> {
            (status == 404).then(|| "no such post".to_string())
        }
    }

    fn captured(pairs: &[(&str, &str)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    /// 未声明的参数不传入，缺席的可选参数也不传入
    #[test]
    fn test_args_select_filters_and_orders() {
        let args = Args::select(
            &["id", "format"],
            &captured(&[("format", "json"), ("id", "3"), ("junk", "x")]),
        );
        assert_eq!(args.len(), 2);
        assert_eq!(args.positional(0), Some("3"));
        assert_eq!(args.positional(1), Some("json"));
        assert_eq!(args.get("junk"), None);

        let args = Args::select(&["id", "format"], &captured(&[("id", "3")]));
        assert_eq!(args.len(), 1);
        assert_eq!(args.get("format"), None);
    }

    #[test]
    fn test_args_parse() {
        let args = Args::select(&["id"], &captured(&[("id", "42")]));
        assert_eq!(args.parse::<u32>("id").unwrap(), Some(42));
        assert_eq!(args.parse::<u32>("missing").unwrap(), None);

        let args = Args::select(&["id"], &captured(&[("id", "abc")]));
        assert!(matches!(args.parse::<u32>("id"), Err(Interrupt::Error(_))));
    }

    /// 每次调用都使用新的控制器实例
    #[test]
    fn test_endpoint_invokes_fresh_controller() {
        let endpoint = ControllerEndpoint::<Posts>::new();
        assert!(endpoint.has_action("show"));
        assert!(!endpoint.has_action("edit"));

        let request = Request::new(HttpRequestMethod::Get, "/posts/9");
        let router = RouteTable::new();
        let params = captured(&[("id", "9"), ("other", "1")]);
        for _ in 0..2 {
            let mut ctx = Context::new(&request, &router);
            let body = endpoint.invoke("show", &mut ctx, &params).unwrap();
            assert_eq!(body, "1:9:1");
        }
    }

    #[test]
    fn test_endpoint_default_body() {
        let endpoint = ControllerEndpoint::<Posts>::new();
        assert_eq!(endpoint.default_body(404).as_deref(), Some("no such post"));
        assert_eq!(endpoint.default_body(500), None);
    }

    #[test]
    fn test_handler_ref_of() {
        assert_eq!(HandlerRef::of::<Posts>("show"), HandlerRef::new("posts", "show"));
    }
}
