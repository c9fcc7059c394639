//! HTTP JSON API
//!
//! Listens on `settings.server.bind:port` (default 127.0.0.1:8787):
//! - GET  /ping, /leaderboard, /missions, /rewards, /me
//! - POST /missions/complete, /rewards/redeem
//! - Admin catalog endpoints under /admin/*
//!
//! The caller's profile ID travels in `X-GreenCampus-User`; the upstream
//! gateway is responsible for having authenticated it.

mod handlers;

pub use handlers::{ApiRequest, ApiResponse, Router};

use std::io::Read;
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::{Result, anyhow};
use tiny_http::{Response, Server};
use tracing::{debug, error, info};

use crate::Campus;

const AUTH_HEADER: &str = "X-GreenCampus-Token";
const USER_HEADER: &str = "X-GreenCampus-User";
const MAX_BODY_BYTES: usize = 64 * 1024; // 64 KiB

/// A running API server
pub struct ApiServer {
    server: Arc<Server>,
    handle: Option<JoinHandle<()>>,
    addr: Option<SocketAddr>,
}

impl ApiServer {
    /// Address actually bound (useful with port 0)
    pub fn addr(&self) -> Option<SocketAddr> {
        self.addr
    }

    /// Stop accepting requests and wait for the server thread
    pub fn shutdown(mut self) {
        self.server.unblock();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Start the HTTP server in a background thread
pub fn start_http_server(
    campus: Campus,
    bind: &str,
    port: u16,
    auth_token: Option<String>,
) -> Result<ApiServer> {
    let bind_addr = format!("{bind}:{port}");
    let server = Server::http(&bind_addr)
        .map_err(|e| anyhow!("Failed to start server on {}: {}", bind_addr, e))?;
    let server = Arc::new(server);
    let addr = server.server_addr().to_ip();

    let auth_token = auth_token.filter(|t| !t.trim().is_empty());
    info!(
        "[greencampus:http] Server listening on http://{} (auth: {})",
        addr.map(|a| a.to_string()).unwrap_or(bind_addr),
        if auth_token.is_some() { "enabled" } else { "disabled" }
    );

    let router = Router::new(campus);
    let worker = server.clone();
    let handle = thread::spawn(move || serve(&worker, &router, auth_token.as_deref()));

    Ok(ApiServer {
        server,
        handle: Some(handle),
        addr,
    })
}

fn serve(server: &Server, router: &Router, auth_token: Option<&str>) {
    for mut request in server.incoming_requests() {
        let method = request.method().to_string();
        let url = request.url().to_string();
        let (path, query) = match url.split_once('?') {
            Some((path, query)) => (path.to_string(), Some(query.to_string())),
            None => (url.clone(), None),
        };

        if !is_authorized(&request, auth_token) {
            let response = Response::from_string("{\"error\":\"unauthorized\"}")
                .with_status_code(401)
                .with_header(json_content_type());
            let _ = request.respond(response);
            continue;
        }

        let body = if method == "POST" {
            match read_request_body(&mut request) {
                Ok(body) => body,
                Err(response) => {
                    let _ = request.respond(response);
                    continue;
                }
            }
        } else {
            String::new()
        };

        let api_request = ApiRequest {
            method,
            path,
            query,
            user_id: header_value(&request, USER_HEADER),
            body,
        };
        let response = router.dispatch(&api_request);
        debug!(
            "[greencampus:http] {} {} -> {}",
            api_request.method, api_request.path, response.status
        );
        respond_json(request, response.status, response.body);
    }
}

fn header_value(request: &tiny_http::Request, name: &'static str) -> Option<String> {
    request
        .headers()
        .iter()
        .find(|h| h.field.equiv(name))
        .map(|h| h.value.as_str().to_string())
}

fn is_authorized(request: &tiny_http::Request, expected: Option<&str>) -> bool {
    let Some(expected) = expected else {
        return true;
    };
    header_value(request, AUTH_HEADER).is_some_and(|v| v == expected)
}

fn json_content_type() -> tiny_http::Header {
    tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).unwrap()
}

fn read_request_body(
    request: &mut tiny_http::Request,
) -> Result<String, Response<std::io::Cursor<Vec<u8>>>> {
    let mut body = String::new();
    let mut reader = request.as_reader().take((MAX_BODY_BYTES + 1) as u64);
    if let Err(e) = reader.read_to_string(&mut body) {
        error!("[greencampus:http] Failed to read body: {}", e);
        let response = Response::from_string("{\"error\":\"bad_request\"}")
            .with_status_code(400)
            .with_header(json_content_type());
        return Err(response);
    }

    if body.len() > MAX_BODY_BYTES {
        let response = Response::from_string("{\"error\":\"payload_too_large\"}")
            .with_status_code(413)
            .with_header(json_content_type());
        return Err(response);
    }

    Ok(body)
}

fn respond_json(request: tiny_http::Request, status_code: u16, value: serde_json::Value) {
    let body =
        serde_json::to_string(&value).unwrap_or_else(|_| "{\"error\":\"serialize\"}".to_string());
    let response = Response::from_string(body)
        .with_status_code(status_code)
        .with_header(json_content_type());
    let _ = request.respond(response);
}
