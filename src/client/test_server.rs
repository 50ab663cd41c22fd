//! 测试用的单连接 HTTP/1.1 服务
//!
//! 基于 hyper 的 http1 连接处理：接受一个连接，记录收到的请求，
//! 回写预设响应后关闭连接。

use std::sync::{Arc, Mutex};

use bytes::Bytes;
use http::{HeaderMap, Method};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub(crate) struct CannedResponse {
    pub status: u16,
    pub headers: Vec<(&'static str, String)>,
    pub body: Vec<u8>,
}

pub(crate) struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<String> {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }
}

/// 启动服务，返回基地址与请求记录
pub(crate) async fn serve_once(response: CannedResponse) -> (String, JoinHandle<RecordedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let recorded: Arc<Mutex<Option<RecordedRequest>>> = Arc::new(Mutex::new(None));
        let canned = Arc::new(response);

        let slot = recorded.clone();
        let service = service_fn(move |request: Request<Incoming>| {
            let slot = slot.clone();
            let canned = canned.clone();
            async move {
                let (parts, body) = request.into_parts();
                let body = body.collect().await?.to_bytes();
                *slot.lock().unwrap() = Some(RecordedRequest {
                    method: parts.method,
                    path: parts.uri.path().to_string(),
                    headers: parts.headers,
                    body,
                });

                let mut builder = Response::builder().status(canned.status);
                for (name, value) in &canned.headers {
                    builder = builder.header(*name, value.as_str());
                }
                let response = builder
                    .body(Full::new(Bytes::from(canned.body.clone())))
                    .unwrap();
                Ok::<_, hyper::Error>(response)
            }
        });

        http1::Builder::new()
            .keep_alive(false)
            .serve_connection(TokioIo::new(stream), service)
            .await
            .unwrap();

        let request = recorded.lock().unwrap().take();
        request.expect("连接关闭前没有收到请求")
    });

    (format!("http://{}", addr), handle)
}
