use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::{Body, Incoming};
use hyper::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use matchit::Router;
use serde::Serialize;
use storefront_core::Credential;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::upstream::Upstream;

pub mod health;
pub mod product;
pub mod products;

/// Shared, read-only state handed to every endpoint.
pub struct AppState {
    pub upstream: Arc<dyn Upstream>,
    /// Reject product requests without a bearer credential
    pub require_credential: bool,
}

impl AppState {
    pub fn new(upstream: Arc<dyn Upstream>) -> Self {
        Self {
            upstream,
            require_credential: false,
        }
    }

    pub fn require_credential(mut self, required: bool) -> Self {
        self.require_credential = required;
        self
    }

    /// Applies the credential policy to the caller's credential.
    pub(crate) fn authorize(&self, credential: Option<Credential>) -> Result<Option<Credential>> {
        if self.require_credential && credential.is_none() {
            return Err(Error::Unauthorized);
        }
        Ok(credential)
    }
}

/// Route identifier
#[derive(Clone, Copy)]
enum Route {
    Health,
    Products,
    Product,
}

/// Routes requests to the product endpoints.
pub struct Gateway {
    state: AppState,
    router: Router<Route>,
}

impl Gateway {
    pub fn new(state: AppState) -> std::result::Result<Self, matchit::InsertError> {
        let mut router = Router::new();
        router.insert("/health", Route::Health)?;
        router.insert("/products", Route::Products)?;
        router.insert("/product", Route::Product)?;
        Ok(Self { state, router })
    }

    /// Handle one request. Every outcome, including failures, is a JSON response.
    pub async fn handle<B>(&self, req: Request<B>) -> Response<Full<Bytes>>
    where
        B: Body,
        B::Error: std::fmt::Display,
    {
        let (parts, body) = req.into_parts();
        let method = parts.method.clone();
        let path = parts.uri.path();

        debug!("{} {}", method, path);

        let route = match self.router.at(path) {
            Ok(matched) => *matched.value,
            Err(_) => return plain_response(StatusCode::NOT_FOUND, r#"{"error":"Not found"}"#),
        };

        let query = parse_query(parts.uri.query());
        let credential = bearer_credential(&parts.headers);
        let state = &self.state;

        let result = match (method, route) {
            (Method::GET, Route::Health) => health::health(),

            (Method::GET, Route::Products) => {
                products::list(state, query.get("search").map(String::as_str), credential).await
            }

            (Method::GET, Route::Product) => {
                product::get(state, query.get("product_id").map(String::as_str), credential).await
            }

            (Method::POST, Route::Product) => match read_body(body).await {
                Ok(bytes) => product::create(state, &bytes, credential).await,
                Err(e) => Err(e),
            },

            (Method::PUT, Route::Product) => match read_body(body).await {
                Ok(bytes) => product::update(state, &bytes, credential).await,
                Err(e) => Err(e),
            },

            (Method::DELETE, Route::Product) => match read_body(body).await {
                Ok(bytes) => product::delete(state, &bytes, credential).await,
                Err(e) => Err(e),
            },

            _ => {
                return plain_response(
                    StatusCode::METHOD_NOT_ALLOWED,
                    r#"{"error":"Method not allowed"}"#,
                )
            }
        };

        match result {
            Ok(response) => response,
            Err(e) => {
                debug!("{} {} failed: {}", parts.method, path, e);
                e.into_response()
            }
        }
    }
}

/// Serve the gateway on an already-bound listener.
pub async fn serve(listener: TcpListener, gateway: Arc<Gateway>) -> anyhow::Result<()> {
    loop {
        let (stream, remote_addr) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let gateway = Arc::clone(&gateway);

        tokio::spawn(async move {
            let service = service_fn(move |req: Request<Incoming>| {
                let gateway = Arc::clone(&gateway);
                async move { Ok::<_, Infallible>(gateway.handle(req).await) }
            });

            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                error!("Error serving connection from {}: {}", remote_addr, e);
            }
        });
    }
}

/// Run the HTTP server
pub async fn run(config: Config, upstream: Arc<dyn Upstream>) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.bind, config.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    let state = AppState::new(upstream).require_credential(config.auth.require_credential);
    let gateway = Arc::new(Gateway::new(state)?);

    info!("Gateway listening on http://{}", addr);
    serve(listener, gateway).await
}

/// Serialize `body` as a JSON response.
pub(crate) fn json_response<T: Serialize>(
    status: StatusCode,
    body: &T,
) -> std::result::Result<Response<Full<Bytes>>, serde_json::Error> {
    let body = serde_json::to_vec(body)?;
    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(response)
}

pub(crate) fn plain_response(status: StatusCode, body: &'static str) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from_static(body.as_bytes())));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

async fn read_body<B>(body: B) -> Result<Bytes>
where
    B: Body,
    B::Error: std::fmt::Display,
{
    body.collect()
        .await
        .map(|collected| collected.to_bytes())
        .map_err(|e| Error::BadRequest(format!("Failed to read request body: {}", e)))
}

fn bearer_credential(headers: &HeaderMap) -> Option<Credential> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(Credential::from_authorization)
}

/// Parse query string into key-value pairs
pub fn parse_query(query: Option<&str>) -> HashMap<String, String> {
    let mut map = HashMap::new();
    if let Some(q) = query {
        for part in q.split('&') {
            if let Some((key, value)) = part.split_once('=') {
                map.insert(urldecode(key), urldecode(value));
            }
        }
    }
    map
}

fn urldecode(s: &str) -> String {
    let mut decoded = Vec::with_capacity(s.len());
    let mut bytes = s.bytes();

    while let Some(b) = bytes.next() {
        match b {
            b'%' => {
                let hex: Vec<u8> = bytes.by_ref().take(2).collect();
                let byte = std::str::from_utf8(&hex)
                    .ok()
                    .filter(|h| h.len() == 2)
                    .and_then(|h| u8::from_str_radix(h, 16).ok());
                if let Some(byte) = byte {
                    decoded.push(byte);
                }
            }
            b'+' => decoded.push(b' '),
            _ => decoded.push(b),
        }
    }

    String::from_utf8_lossy(&decoded).into_owned()
}
