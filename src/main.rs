// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 异步 Web 服务器
//!
//! 基于 Tokio 多线程运行时的服务端入口：
//! - 从 TOML 读取运行参数，从 YAML 初始化 log4rs
//! - 启动时一次性构建路由表，之后在所有连接间只读共享
//! - 每个连接读取一个完整请求，交给 `Application` 分发并写回响应

mod site;

use log::{debug, error, info, warn, LevelFilter};
use log4rs::{
    append::console::ConsoleAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
};
use tokio::{
    io::{AsyncReadExt, AsyncWrite, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    runtime::Builder,
};

use std::{
    net::{Ipv4Addr, SocketAddrV4},
    num::IntErrorKind,
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
};

use webrouter::{
    error_page,
    param::CRLF,
    request::{head_end, HEAD_TERMINATOR},
    Application, Config, Exception, HttpRequestMethod, Request,
};

const LOG_CONFIG: &str = "config/log4rs.yaml";
const SERVER_CONFIG: &str = "config/development.toml";

/// 日志配置文件缺失时退回到控制台输出
fn init_logging() {
    if log4rs::init_file(LOG_CONFIG, Default::default()).is_ok() {
        return;
    }
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} {h({l})} {m}{n}",
        )))
        .build();
    let config = log4rs::config::Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(LevelFilter::Info));
    match config {
        Ok(config) => {
            if let Err(e) = log4rs::init_config(config) {
                eprintln!("无法初始化日志系统：{}", e);
            }
        }
        Err(e) => eprintln!("无法构建默认日志配置：{}", e),
    }
    warn!("未找到{}，日志输出到控制台", LOG_CONFIG);
}

fn main() {
    init_logging();

    let config = Config::from_toml(SERVER_CONFIG);
    info!("配置文件已载入");
    info!("public root: {}", config.public_root());
    info!("shared root: {}", config.shared_root());

    let runtime = match Builder::new_multi_thread()
        .worker_threads(config.worker_threads())
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("无法创建异步运行时：{}", e);
            return;
        }
    };

    let app = match site::application(&config) {
        Ok(app) => Arc::new(app),
        Err(e) => {
            error!("路由配置错误：{}", e);
            return;
        }
    };
    info!("路由表构建完成，共{}条路由", app.router().len());
    for entry in app.router().entries() {
        debug!("  {} {} -> {}", entry.method(), entry.pattern(), entry.handler());
    }

    runtime.block_on(serve(app, config));
}

async fn serve(app: Arc<Application>, config: Config) {
    let port = config.port();
    let address = match config.local() {
        true => Ipv4Addr::new(127, 0, 0, 1),
        false => Ipv4Addr::new(0, 0, 0, 0),
    };
    info!("服务端将在{}:{}上监听Socket连接", address, port);
    let listener = match TcpListener::bind(SocketAddrV4::new(address, port)).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("无法绑定端口：{}，错误：{}", port, e);
            return;
        }
    };
    info!("端口{}绑定完成", port);

    let active_connection = Arc::new(AtomicU32::new(0));
    let max_request_size = config.max_request_size();
    let mut id: u128 = 0;

    loop {
        let (mut stream, addr) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(pair) => pair,
                Err(e) => {
                    warn!("接受连接失败：{}", e);
                    continue;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!(
                    "收到停机信号，正在退出，当前活跃连接数：{}",
                    active_connection.load(Ordering::SeqCst)
                );
                break;
            }
        };
        debug!("[ID{}]TCP连接已建立：{}", id, addr);

        let app = Arc::clone(&app);
        let active_connection = Arc::clone(&active_connection);
        tokio::spawn(async move {
            active_connection.fetch_add(1, Ordering::SeqCst);
            handle_connection(&mut stream, id, &app, max_request_size, addr.to_string()).await;
            active_connection.fetch_sub(1, Ordering::SeqCst);
        });
        id += 1;
    }
}

/// 读取一个完整的请求报文：报文头以及 `Content-Length` 指明的请求体
async fn read_request(
    stream: &mut TcpStream,
    max_request_size: usize,
) -> Result<Option<Vec<u8>>, Exception> {
    let mut buffer = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];
    let mut expected: Option<usize> = None;
    loop {
        let n = match stream.read(&mut chunk).await {
            Ok(n) => n,
            Err(_) => return Ok(None),
        };
        if n == 0 {
            return Ok(if buffer.is_empty() { None } else { Some(buffer) });
        }
        buffer.extend_from_slice(&chunk[..n]);
        if buffer.len() > max_request_size {
            return Err(Exception::RequestTooLarge(max_request_size));
        }
        if expected.is_none() {
            expected = expected_len(&buffer, max_request_size)?;
        }
        if let Some(total) = expected {
            if buffer.len() >= total {
                buffer.truncate(total);
                return Ok(Some(buffer));
            }
        }
    }
}

/// 报文头读完后计算整个请求的长度，超过 `max_request_size` 时返回 `RequestTooLarge`。
/// 报文头尚不完整时返回 `Ok(None)`。
fn expected_len(buffer: &[u8], max_request_size: usize) -> Result<Option<usize>, Exception> {
    let end = match head_end(buffer) {
        Some(end) => end,
        None => return Ok(None),
    };
    let body_len = content_length(&buffer[..end], max_request_size)?;
    end.checked_add(HEAD_TERMINATOR.len())
        .and_then(|head_len| head_len.checked_add(body_len))
        .filter(|total| *total <= max_request_size)
        .map(Some)
        .ok_or(Exception::RequestTooLarge(max_request_size))
}

/// 没有 `Content-Length` 时请求体长度为 0
fn content_length(head: &[u8], max_request_size: usize) -> Result<usize, Exception> {
    let value = String::from_utf8_lossy(head)
        .split(CRLF)
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("Content-Length"))
        .map(|(_, value)| value.trim().to_string());
    match value {
        None => Ok(0),
        Some(value) => match value.parse::<usize>() {
            Ok(len) => Ok(len),
            Err(e) if *e.kind() == IntErrorKind::PosOverflow => {
                Err(Exception::RequestTooLarge(max_request_size))
            }
            Err(_) => Err(Exception::MalformedRequest),
        },
    }
}

/// 请求无法进入分发流程时直接回写默认错误页，写失败只记录日志
async fn send_status<W: AsyncWrite + Unpin>(stream: &mut W, id: u128, status: u16) -> bool {
    let request = Request::new(HttpRequestMethod::Get, "/").with_id(id);
    let response = error_page::status_response(&request, status);
    match stream.write_all(&response.as_bytes()).await {
        Ok(()) => true,
        Err(e) => {
            warn!("[ID{}]发送错误响应失败：{}", id, e);
            false
        }
    }
}

async fn handle_connection(
    stream: &mut TcpStream,
    id: u128,
    app: &Application,
    max_request_size: usize,
    peer: String,
) {
    let buffer = match read_request(stream, max_request_size).await {
        Ok(Some(buffer)) => buffer,
        Ok(None) => return,
        Err(e) => {
            warn!("[ID{}]读取请求失败：{}", id, e);
            send_status(stream, id, e.status_code()).await;
            return;
        }
    };
    debug!("[ID{}]HTTP请求接收完毕，{}字节", id, buffer.len());

    let request = match Request::try_from(&buffer, id) {
        Ok(request) => request.with_peer(peer),
        Err(e) => {
            error!("[ID{}]解析HTTP请求失败: {}", id, e);
            send_status(stream, id, e.status_code()).await;
            return;
        }
    };

    let response = app.call(&request);
    let bytes = response.as_bytes();
    debug!("[ID{}]发送响应，长度: {}", id, bytes.len());
    if let Err(e) = stream.write_all(&bytes).await {
        error!("[ID{}]发送响应失败: {}", id, e);
        return;
    }
    let _ = stream.flush().await;
}
