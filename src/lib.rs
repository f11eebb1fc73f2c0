// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

pub mod app;
pub mod cache;
pub mod config;
pub mod context;
pub mod controller;
pub mod dispatcher;
pub mod error_page;
pub mod exception;
pub mod param;
pub mod pattern;
pub mod request;
pub mod response;
pub mod router;
pub mod statics;
pub mod util;

pub use app::{Application, ApplicationBuilder};
pub use cache::FileCache;
pub use config::Config;
pub use context::{ActionResult, Context, Halt, Interrupt};
pub use controller::{Action, Args, Controller};
pub use exception::Exception;
pub use param::{HttpRequestMethod, HttpVersion};
pub use pattern::{PathPattern, Segment};
pub use request::Request;
pub use response::Response;
pub use router::{HandlerRef, MatchOutcome, RouteTable};
pub use statics::{Asset, FsStatic, StaticFiles};
pub use util::Params;
