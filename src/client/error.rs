//! 客户端错误类型
//!
//! 服务调用只区分"是否成功"，不做重试或分类恢复；
//! 变体仅用于让调用方在界面上给出可读的错误文本。

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// 服务地址无法解析
    #[error("无效的服务地址 {0}")]
    InvalidEndpoint(String),

    /// 服务端返回非 OK 的 gRPC 状态
    #[error("服务调用失败（gRPC 状态 {code}）: {message}")]
    Status { code: i32, message: String },

    /// HTTP 层失败（REST / gRPC-Web 通道）
    #[error("HTTP 请求失败（{status}）: {message}")]
    Http { status: u16, message: String },

    /// 连接或读写失败
    #[error("传输失败: {0}")]
    Transport(String),

    #[error("请求超时（{0:?}）")]
    Timeout(Duration),

    #[error("编码请求失败: {0}")]
    Encode(String),

    /// 状态 OK 但负载无法解码
    #[error("解码响应失败: {0}")]
    Decode(String),

    /// 一元调用状态 OK 但没有任何消息
    #[error("服务端未返回响应消息")]
    EmptyResponse,
}

impl ClientError {
    /// 仅当错误来自服务端 gRPC 状态时返回状态码
    pub fn status_code(&self) -> Option<i32> {
        match self {
            ClientError::Status { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<tonic::Status> for ClientError {
    fn from(status: tonic::Status) -> Self {
        ClientError::Status {
            code: status.code() as i32,
            message: status.message().to_string(),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => ClientError::Http {
                status: status.as_u16(),
                message: err.to_string(),
            },
            None => ClientError::Transport(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_message_contains_text() {
        let err = ClientError::from(tonic::Status::not_found("logger 'mic' not found"));
        assert_eq!(err.status_code(), Some(tonic::Code::NotFound as i32));
        assert!(err.to_string().contains("logger 'mic' not found"));
    }
}
