//! # gRPC-Web 传输
//!
//! 浏览器构建使用的通道：HTTP/1.1 POST，`content-type: application/grpc-web+proto`。
//!
//! ## 帧格式
//! 请求体与响应体都是长度前缀帧序列，每帧为：
//! `flag (1 字节) | length (4 字节，大端) | payload`
//! - `flag = 0x00`：数据帧，payload 为一条 protobuf 消息
//! - `flag = 0x80`：trailer 帧，payload 为 `key: value\r\n` 形式的文本头部
//!
//! 调用状态（`grpc-status` / `grpc-message`）可能出现在 trailer 帧中，
//! 也可能在 trailers-only 响应里直接出现在 HTTP 响应头中。

use std::time::Duration;

use async_trait::async_trait;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use http::HeaderMap;
use http::header::{ACCEPT, CONTENT_TYPE};

use super::{CONNECT_TIMEOUT, ClientError, RpcMethod, Transport, WireFormat, normalize_base_url};

const CONTENT_TYPE_GRPC_WEB: &str = "application/grpc-web+proto";

/// 帧头长度：flag + u32 长度
const FRAME_HEADER_LEN: usize = 5;

const FLAG_TRAILER: u8 = 0x80;
const FLAG_COMPRESSED: u8 = 0x01;

/// 将一条消息封装为数据帧
pub fn encode_frame(payload: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(FRAME_HEADER_LEN + payload.len());
    buf.put_u8(0x00);
    buf.put_u32(payload.len() as u32);
    buf.put_slice(payload);
    buf.freeze()
}

/// 响应体的解析结果
#[derive(Debug, Default, PartialEq)]
pub struct GrpcWebResponse {
    /// 按到达顺序排列的数据帧
    pub messages: Vec<Bytes>,
    /// trailer 帧中的 `grpc-status`
    pub status: Option<i32>,
    /// trailer 帧中的 `grpc-message`（已百分号解码）
    pub message: String,
}

/// 解析响应体中的全部帧
///
/// # 错误
/// 帧头或帧体被截断、出现压缩帧时返回 `ClientError::Decode`
pub fn decode_frames(mut body: Bytes) -> Result<GrpcWebResponse, ClientError> {
    let mut response = GrpcWebResponse::default();

    while body.has_remaining() {
        if body.remaining() < FRAME_HEADER_LEN {
            return Err(ClientError::Decode(format!(
                "gRPC-Web 帧头被截断（剩余 {} 字节）",
                body.remaining()
            )));
        }
        let flag = body.get_u8();
        let len = body.get_u32() as usize;
        if body.remaining() < len {
            return Err(ClientError::Decode(format!(
                "gRPC-Web 帧体被截断（声明 {} 字节，实际 {} 字节）",
                len,
                body.remaining()
            )));
        }
        let frame = body.split_to(len);

        if flag & FLAG_TRAILER != 0 {
            for (key, value) in parse_trailer_block(&frame) {
                match key.as_str() {
                    "grpc-status" => response.status = value.trim().parse().ok(),
                    "grpc-message" => response.message = percent_decode(&value),
                    _ => {}
                }
            }
        } else if flag & FLAG_COMPRESSED != 0 {
            return Err(ClientError::Decode("不支持压缩的 gRPC-Web 帧".to_string()));
        } else {
            response.messages.push(frame);
        }
    }

    Ok(response)
}

/// 解析 trailer 帧的文本头部，key 统一为小写
fn parse_trailer_block(block: &[u8]) -> Vec<(String, String)> {
    String::from_utf8_lossy(block)
        .split("\r\n")
        .filter_map(|line| {
            let (key, value) = line.split_once(':')?;
            Some((key.trim().to_ascii_lowercase(), value.trim().to_string()))
        })
        .collect()
}

fn percent_decode(value: &str) -> String {
    urlencoding::decode(value)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| value.to_string())
}

/// 读取 trailers-only 响应放在 HTTP 头中的调用状态
fn status_from_headers(headers: &HeaderMap) -> Option<(i32, String)> {
    let code = headers
        .get("grpc-status")?
        .to_str()
        .ok()?
        .trim()
        .parse::<i32>()
        .ok()?;
    let message = headers
        .get("grpc-message")
        .and_then(|v| v.to_str().ok())
        .map(percent_decode)
        .unwrap_or_default();
    Some((code, message))
}

/// gRPC-Web 传输
#[derive(Debug, Clone)]
pub struct GrpcWebTransport {
    http: reqwest::Client,
    base_url: String,
}

impl GrpcWebTransport {
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

#[async_trait]
impl Transport for GrpcWebTransport {
    fn wire_format(&self) -> WireFormat {
        WireFormat::Protobuf
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
            .header(CONTENT_TYPE, CONTENT_TYPE_GRPC_WEB)
            .header(ACCEPT, CONTENT_TYPE_GRPC_WEB)
            .header("x-grpc-web", "1")
            .body(encode_frame(&payload));
        if let Some(token) = auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let http_status = response.status();
        let header_status = status_from_headers(response.headers());

        // trailers-only：状态只在响应头中，body 为空；代理返回非 2xx 时也可能带有状态
        if let Some((code, message)) = &header_status {
            if *code != 0 {
                return Err(ClientError::Status {
                    code: *code,
                    message: message.clone(),
                });
            }
        }

        if !http_status.is_success() {
            return Err(ClientError::Http {
                status: http_status.as_u16(),
                message: http_status
                    .canonical_reason()
                    .unwrap_or("unknown")
                    .to_string(),
            });
        }

        let body = response.bytes().await?;
        let frames = decode_frames(body)?;

        let (code, message) = match (frames.status, header_status) {
            (Some(code), _) => (code, frames.message),
            (None, Some(status)) => status,
            (None, None) => {
                return Err(ClientError::Transport(format!(
                    "{} 的响应缺少 grpc-status",
                    method.name()
                )));
            }
        };
        if code != 0 {
            return Err(ClientError::Status { code, message });
        }

        log::debug!("{} 返回 {} 条消息", method.name(), frames.messages.len());
        Ok(frames.messages)
    }
}
