//! # REST 兜底传输
//!
//! `POST {baseUrl}/lifelog.LifelogService/<Method>`，请求体与响应体均为
//! protobuf JSON 映射。服务端流式方法的响应为 JSON 数组，每个元素对应一条消息。
//!
//! 非 2xx 响应若带有 `{ "code": <int>, "message": <string> }` 形式的错误体，
//! 按 gRPC 状态处理；否则作为 HTTP 错误返回响应文本。

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::header::{ACCEPT, CONTENT_TYPE};
use serde::Deserialize;

use super::{CONNECT_TIMEOUT, ClientError, RpcMethod, Transport, WireFormat, normalize_base_url};

/// 服务端错误体
#[derive(Debug, Deserialize)]
struct RestErrorBody {
    code: i32,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Clone)]
pub struct RestTransport {
    http: reqwest::Client,
    base_url: String,
}

impl RestTransport {
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let base_url = normalize_base_url(api_url)?;
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Transport(format!("创建 HTTP 客户端失败: {}", e)))?;
        Ok(Self { http, base_url })
    }
}

/// 把成功响应体拆分为消息列表
fn split_response(method: RpcMethod, body: Bytes) -> Result<Vec<Bytes>, ClientError> {
    if !method.is_server_streaming() {
        return Ok(vec![body]);
    }

    let items: Vec<serde_json::Value> = serde_json::from_slice(&body).map_err(|e| {
        ClientError::Decode(format!("{} 的响应不是 JSON 数组: {}", method.name(), e))
    })?;
    items
        .iter()
        .map(|item| {
            serde_json::to_vec(item)
                .map(Bytes::from)
                .map_err(|e| ClientError::Decode(e.to_string()))
        })
        .collect()
}

#[async_trait]
impl Transport for RestTransport {
    fn wire_format(&self) -> WireFormat {
        WireFormat::Json
    }

    async fn call(
        &self,
        method: RpcMethod,
        payload: Bytes,
        auth_token: Option<&str>,
    ) -> Result<Vec<Bytes>, ClientError> {
        let url = format!("{}{}", self.base_url, method.path());
        let mut request = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(payload);
        if let Some(token) = auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            if let Ok(error) = serde_json::from_slice::<RestErrorBody>(&body) {
                return Err(ClientError::Status {
                    code: error.code,
                    message: error.message,
                });
            }
            return Err(ClientError::Http {
                status: status.as_u16(),
                message: String::from_utf8_lossy(&body).trim().to_string(),
            });
        }

        split_response(method, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::LifelogClient;
    use crate::client::test_server::{CannedResponse, serve_once};
    use std::sync::Arc;

    #[test]
    fn test_streaming_body_split() {
        let body = Bytes::from_static(br#"[{"id":"a"},{"id":"b"}]"#);
        let items = split_response(RpcMethod::GetCameraFrames, body).unwrap();
        assert_eq!(items.len(), 2);

        let bad = Bytes::from_static(br#"{"id":"a"}"#);
        assert!(split_response(RpcMethod::GetCameraFrames, bad).is_err());
    }

    #[tokio::test]
    async fn test_client_over_rest() {
        let body = serde_json::json!({
            "loggers": [{ "name": "mic", "enabled": true, "dataPoints": "42" }],
            "systemStats": { "cpu_usage": "5%" }
        });
        let (base_url, server) = serve_once(CannedResponse {
            status: 200,
            headers: vec![("content-type", "application/json".to_string())],
            body: serde_json::to_vec(&body).unwrap(),
        })
        .await;

        let transport = RestTransport::new(&base_url, Duration::from_secs(5)).unwrap();
        let client = LifelogClient::new(Arc::new(transport));
        let response = client
            .get_logger_status(vec!["mic".to_string()])
            .await
            .unwrap();
        assert_eq!(response.loggers[0].data_points, 42);

        let request = server.await.unwrap();
        assert_eq!(request.method, http::Method::POST);
        assert_eq!(request.path, "/lifelog.LifelogService/GetLoggerStatus");
        let sent: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
        assert_eq!(sent["loggerNames"], serde_json::json!(["mic"]));
    }

    #[tokio::test]
    async fn test_error_body_maps_to_status() {
        let (base_url, server) = serve_once(CannedResponse {
            status: 404,
            headers: vec![],
            body: br#"{"code":5,"message":"no such logger"}"#.to_vec(),
        })
        .await;

        let transport = RestTransport::new(&base_url, Duration::from_secs(5)).unwrap();
        let err = transport
            .call(RpcMethod::ToggleLogger, Bytes::from_static(b"{}"), None)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), Some(5));
        assert!(err.to_string().contains("no such logger"));
        server.await.unwrap();
    }
}
