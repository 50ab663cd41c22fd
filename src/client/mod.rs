//! # lifelog.LifelogService 客户端
//!
//! 每个方法的流程固定为：构造请求消息 → 按传输层的 wire 格式序列化 →
//! 发起一次网络调用 → 解码响应 → 返回 `Result`。
//! 不做重试、退避或连接池管理，任何失败都原样交给调用方展示。
//!
//! ## 传输层
//! - `grpc` - 原生 gRPC（HTTP/2，tonic channel）
//! - `grpc_web` - gRPC-Web（HTTP/1.1 + 长度前缀帧），浏览器构建使用的通道
//! - `rest` - `{baseUrl}/lifelog.LifelogService/<Method>` 的 JSON POST 兜底通道
//!
//! 三种传输都实现 `Transport` trait，客户端本身与具体通道无关，
//! 测试时可直接注入内存实现。
//!
//! ## 会话令牌
//! `login` / `register` 成功后保存服务端下发的 token，
//! 之后的每次调用以 `authorization: Bearer <token>` 携带；`logout` 清除。

pub mod error;
pub mod grpc;
pub mod grpc_web;
pub mod rest;

#[cfg(test)]
mod test_server;

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::models::settings::{InterfaceSettings, TransportKind};
use crate::proto::{self, LifelogMessage};
use crate::proto::{
    ActivitySummary, CameraFrameData, LoggerStatusRequest, LoggerStatusResponse, LoginRequest,
    LoginResponse, ProcessData, ProcessStatsRequest, ProcessStatsResponse, RegisterRequest,
    RegisterResponse, ScreenshotData, SearchRequest, SearchResponse, SnapshotRequest,
    SnapshotResponse, TimeRangeRequest, ToggleLoggerRequest, ToggleLoggerResponse, UserProfile,
    UserRequest,
};

pub use error::ClientError;

/// 服务地址环境变量
pub const API_URL_ENV: &str = "VITE_GRPC_API_URL";

/// 未配置服务地址时的默认值
pub const DEFAULT_API_URL: &str = "http://localhost:50051";

/// 建立连接的超时时间
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// 单次调用的默认超时时间
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(5);

/// LifelogService 的全部 RPC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RpcMethod {
    Search,
    GetScreenshots,
    GetProcesses,
    GetCameraFrames,
    GetActivitySummary,
    GetProcessStats,
    Login,
    Register,
    GetUserProfile,
    GetLoggerStatus,
    ToggleLogger,
    TakeSnapshot,
}

impl RpcMethod {
    pub const ALL: [RpcMethod; 12] = [
        RpcMethod::Search,
        RpcMethod::GetScreenshots,
        RpcMethod::GetProcesses,
        RpcMethod::GetCameraFrames,
        RpcMethod::GetActivitySummary,
        RpcMethod::GetProcessStats,
        RpcMethod::Login,
        RpcMethod::Register,
        RpcMethod::GetUserProfile,
        RpcMethod::GetLoggerStatus,
        RpcMethod::ToggleLogger,
        RpcMethod::TakeSnapshot,
    ];

    /// 方法名（proto 中的 PascalCase 名称）
    pub fn name(self) -> &'static str {
        match self {
            RpcMethod::Search => "Search",
            RpcMethod::GetScreenshots => "GetScreenshots",
            RpcMethod::GetProcesses => "GetProcesses",
            RpcMethod::GetCameraFrames => "GetCameraFrames",
            RpcMethod::GetActivitySummary => "GetActivitySummary",
            RpcMethod::GetProcessStats => "GetProcessStats",
            RpcMethod::Login => "Login",
            RpcMethod::Register => "Register",
            RpcMethod::GetUserProfile => "GetUserProfile",
            RpcMethod::GetLoggerStatus => "GetLoggerStatus",
            RpcMethod::ToggleLogger => "ToggleLogger",
            RpcMethod::TakeSnapshot => "TakeSnapshot",
        }
    }

    /// HTTP/2 请求路径 `/lifelog.LifelogService/<Method>`
    pub fn path(self) -> &'static str {
        match self {
            RpcMethod::Search => "/lifelog.LifelogService/Search",
            RpcMethod::GetScreenshots => "/lifelog.LifelogService/GetScreenshots",
            RpcMethod::GetProcesses => "/lifelog.LifelogService/GetProcesses",
            RpcMethod::GetCameraFrames => "/lifelog.LifelogService/GetCameraFrames",
            RpcMethod::GetActivitySummary => "/lifelog.LifelogService/GetActivitySummary",
            RpcMethod::GetProcessStats => "/lifelog.LifelogService/GetProcessStats",
            RpcMethod::Login => "/lifelog.LifelogService/Login",
            RpcMethod::Register => "/lifelog.LifelogService/Register",
            RpcMethod::GetUserProfile => "/lifelog.LifelogService/GetUserProfile",
            RpcMethod::GetLoggerStatus => "/lifelog.LifelogService/GetLoggerStatus",
            RpcMethod::ToggleLogger => "/lifelog.LifelogService/ToggleLogger",
            RpcMethod::TakeSnapshot => "/lifelog.LifelogService/TakeSnapshot",
        }
    }

    /// 服务端流式方法：响应为多条消息
    pub fn is_server_streaming(self) -> bool {
        matches!(
            self,
            RpcMethod::GetScreenshots | RpcMethod::GetProcesses | RpcMethod::GetCameraFrames
        )
    }
}

/// 请求与响应负载的序列化格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFormat {
    /// protobuf 二进制（gRPC、gRPC-Web）
    Protobuf,
    /// protobuf JSON 映射（REST）
    Json,
}

/// 一次 RPC 调用的传输通道
///
/// 实现方只负责搬运已序列化的负载：一元方法返回恰好一条消息，
/// 服务端流式方法返回流中的全部消息。非 OK 状态必须以
/// `ClientError::Status` 返回，不得返回部分数据。
#[async_trait]
pub trait Transport: Send + Sync {
    fn wire_format(&self) -> WireFormat;

    async fn call(
        &self,
        method: RpcMethod,
        payload: Bytes,
        auth_token: Option<&str>,
    ) -> Result<Vec<Bytes>, ClientError>;
}

/// 规范化服务地址：必须是 http(s) URL，去掉末尾的 `/`
pub fn normalize_base_url(url: &str) -> Result<String, ClientError> {
    let trimmed = url.trim().trim_end_matches('/');
    let host = trimmed
        .strip_prefix("http://")
        .or_else(|| trimmed.strip_prefix("https://"));
    match host {
        Some(host) if !host.is_empty() => Ok(trimmed.to_string()),
        _ => Err(ClientError::InvalidEndpoint(url.to_string())),
    }
}

/// LifelogService 客户端
pub struct LifelogClient {
    transport: Arc<dyn Transport>,
    timeout: Option<Duration>,
    token: RwLock<Option<String>>,
}

impl LifelogClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            timeout: None,
            token: RwLock::new(None),
        }
    }

    /// 为每次调用设置整体超时（含连接、发送、接收全部流消息）
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// 按界面设置构造客户端
    ///
    /// 原生 gRPC 通道采用惰性连接，必须在 tokio 运行时内调用。
    pub fn from_settings(settings: &InterfaceSettings) -> Result<Self, ClientError> {
        let timeout = settings.request_timeout();
        let transport: Arc<dyn Transport> = match settings.transport {
            TransportKind::Grpc => Arc::new(grpc::GrpcTransport::connect_lazy(
                &settings.api_url,
                timeout,
            )?),
            TransportKind::GrpcWeb => {
                Arc::new(grpc_web::GrpcWebTransport::new(&settings.api_url, timeout)?)
            }
            TransportKind::Rest => Arc::new(rest::RestTransport::new(&settings.api_url, timeout)?),
        };
        log::info!(
            "服务客户端已创建: {} ({:?})",
            settings.api_url,
            settings.transport
        );
        Ok(Self::new(transport).with_timeout(timeout))
    }

    /// 当前会话令牌
    pub fn session_token(&self) -> Option<String> {
        self.token.read().ok().and_then(|t| t.clone())
    }

    pub fn set_session_token(&self, token: Option<String>) {
        if let Ok(mut guard) = self.token.write() {
            *guard = token;
        }
    }

    /// 清除会话令牌（本地登出，不访问服务端）
    pub fn logout(&self) {
        self.set_session_token(None);
    }

    // ======== 通用调用路径 ========

    fn encode_payload<M: LifelogMessage>(&self, message: &M) -> Result<Bytes, ClientError> {
        match self.transport.wire_format() {
            WireFormat::Protobuf => Ok(proto::encode(message)),
            WireFormat::Json => serde_json::to_vec(message)
                .map(Bytes::from)
                .map_err(|e| ClientError::Encode(format!("{}: {}", M::NAME, e))),
        }
    }

    fn decode_payload<M: LifelogMessage>(&self, payload: &[u8]) -> Result<M, ClientError> {
        match self.transport.wire_format() {
            WireFormat::Protobuf => proto::decode(payload).map_err(ClientError::Decode),
            WireFormat::Json => serde_json::from_slice(payload)
                .map_err(|e| ClientError::Decode(format!("{}: {}", M::NAME, e))),
        }
    }

    /// 发起调用并解码全部响应消息；任意一条解码失败即整体失败
    async fn invoke<Req, Resp>(
        &self,
        method: RpcMethod,
        request: &Req,
    ) -> Result<Vec<Resp>, ClientError>
    where
        Req: LifelogMessage,
        Resp: LifelogMessage,
    {
        let payload = self.encode_payload(request)?;
        let token = self.session_token();
        let call = self.transport.call(method, payload, token.as_deref());

        let frames = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| ClientError::Timeout(limit))??,
            None => call.await?,
        };

        frames
            .iter()
            .map(|frame| self.decode_payload::<Resp>(frame))
            .collect()
    }

    async fn unary<Req, Resp>(&self, method: RpcMethod, request: &Req) -> Result<Resp, ClientError>
    where
        Req: LifelogMessage,
        Resp: LifelogMessage,
    {
        self.invoke(method, request)
            .await?
            .into_iter()
            .next()
            .ok_or(ClientError::EmptyResponse)
    }

    // ======== LifelogService 方法 ========

    pub async fn search(&self, request: SearchRequest) -> Result<SearchResponse, ClientError> {
        self.unary(RpcMethod::Search, &request).await
    }

    pub async fn get_screenshots(
        &self,
        range: TimeRangeRequest,
    ) -> Result<Vec<ScreenshotData>, ClientError> {
        self.invoke(RpcMethod::GetScreenshots, &range).await
    }

    pub async fn get_processes(
        &self,
        range: TimeRangeRequest,
    ) -> Result<Vec<ProcessData>, ClientError> {
        self.invoke(RpcMethod::GetProcesses, &range).await
    }

    pub async fn get_camera_frames(
        &self,
        range: TimeRangeRequest,
    ) -> Result<Vec<CameraFrameData>, ClientError> {
        self.invoke(RpcMethod::GetCameraFrames, &range).await
    }

    pub async fn get_activity_summary(
        &self,
        range: TimeRangeRequest,
    ) -> Result<ActivitySummary, ClientError> {
        self.unary(RpcMethod::GetActivitySummary, &range).await
    }

    pub async fn get_process_stats(
        &self,
        request: ProcessStatsRequest,
    ) -> Result<ProcessStatsResponse, ClientError> {
        self.unary(RpcMethod::GetProcessStats, &request).await
    }

    /// 登录；成功时保存会话令牌
    ///
    /// `success: false` 属于业务结果，原样返回给调用方读取 `error_message`。
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ClientError> {
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let response: LoginResponse = self.unary(RpcMethod::Login, &request).await?;
        if response.success && !response.token.is_empty() {
            self.set_session_token(Some(response.token.clone()));
        }
        Ok(response)
    }

    /// 注册；成功且服务端下发令牌时直接进入登录状态
    pub async fn register(
        &self,
        request: RegisterRequest,
    ) -> Result<RegisterResponse, ClientError> {
        let response: RegisterResponse = self.unary(RpcMethod::Register, &request).await?;
        if response.success && !response.token.is_empty() {
            self.set_session_token(Some(response.token.clone()));
        }
        Ok(response)
    }

    pub async fn get_user_profile(&self, user_id: &str) -> Result<UserProfile, ClientError> {
        let request = UserRequest {
            user_id: user_id.to_string(),
        };
        self.unary(RpcMethod::GetUserProfile, &request).await
    }

    /// 查询 logger 状态；`logger_names` 为空时查询全部
    pub async fn get_logger_status(
        &self,
        logger_names: Vec<String>,
    ) -> Result<LoggerStatusResponse, ClientError> {
        let request = LoggerStatusRequest { logger_names };
        self.unary(RpcMethod::GetLoggerStatus, &request).await
    }

    pub async fn toggle_logger(
        &self,
        logger_name: &str,
        enable: bool,
    ) -> Result<ToggleLoggerResponse, ClientError> {
        let request = ToggleLoggerRequest {
            logger_name: logger_name.to_string(),
            enable,
        };
        self.unary(RpcMethod::ToggleLogger, &request).await
    }

    pub async fn take_snapshot(
        &self,
        loggers: Vec<String>,
        options: HashMap<String, String>,
    ) -> Result<SnapshotResponse, ClientError> {
        let request = SnapshotRequest { loggers, options };
        self.unary(RpcMethod::TakeSnapshot, &request).await
    }
}
