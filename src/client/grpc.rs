//! # 原生 gRPC 传输
//!
//! 基于 tonic channel（HTTP/2）。负载在进入传输层之前已经完成 protobuf 编码，
//! 因此这里使用透传字节的 codec，不再二次编解码。
//!
//! channel 采用惰性连接：构造时不发起连接，第一次调用时才建立，
//! 服务端未启动时界面仍可正常打开。

use std::time::Duration;

use async_trait::async_trait;
use bytes::{Buf, BufMut, Bytes};
use futures_util::TryStreamExt;
use http::uri::PathAndQuery;
use tonic::codec::{Codec, DecodeBuf, Decoder, EncodeBuf, Encoder};
use tonic::metadata::MetadataValue;
use tonic::transport::{Channel, Endpoint};
use tonic::Status;

use super::{CONNECT_TIMEOUT, ClientError, RpcMethod, Transport, WireFormat, normalize_base_url};

/// 透传字节的 codec
#[derive(Debug, Clone, Copy, Default)]
struct RawCodec;

#[derive(Debug, Clone, Copy, Default)]
struct RawEncoder;

#[derive(Debug, Clone, Copy, Default)]
struct RawDecoder;

impl Codec for RawCodec {
    type Encode = Bytes;
    type Decode = Bytes;
    type Encoder = RawEncoder;
    type Decoder = RawDecoder;

    fn encoder(&mut self) -> Self::Encoder {
        RawEncoder
    }

    fn decoder(&mut self) -> Self::Decoder {
        RawDecoder
    }
}

impl Encoder for RawEncoder {
    type Item = Bytes;
    type Error = Status;

    fn encode(&mut self, item: Self::Item, dst: &mut EncodeBuf<'_>) -> Result<(), Self::Error> {
        dst.put(item);
        Ok(())
    }
}

impl Decoder for RawDecoder {
    type Item = Bytes;
    type Error = Status;

    fn decode(&mut self, src: &mut DecodeBuf<'_>) -> Result<Option<Self::Item>, Self::Error> {
        let len = src.remaining();
        Ok(Some(src.copy_to_bytes(len)))
    }
}

/// 原生 gRPC 传输
#[derive(Debug, Clone)]
pub struct GrpcTransport {
    channel: Channel,
}

impl GrpcTransport {
    /// 创建惰性连接的 channel
    ///
    /// # 参数
    /// - `api_url` - 服务地址（如 `http://localhost:50051`）
    /// - `timeout` - 单次调用超时
    ///
    /// # 错误
    /// 地址不是合法的 http(s) URI 时返回 `ClientError::InvalidEndpoint`
    pub fn connect_lazy(api_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let url = normalize_base_url(api_url)?;
        let endpoint = Endpoint::from_shared(url)
            .map_err(|e| ClientError::InvalidEndpoint(format!("{}: {}", api_url, e)))?
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(timeout);

        Ok(Self {
            channel: endpoint.connect_lazy(),
        })
    }
}

#[async_trait]
impl Transport for GrpcTransport {
    fn wire_format(&self) -> WireFormat {
        WireFormat::Protobuf
    }

    async fn call(
        &self,
        method: RpcMethod,
        payload: Bytes,
        auth_token: Option<&str>,
    ) -> Result<Vec<Bytes>, ClientError> {
        let mut grpc = tonic::client::Grpc::new(self.channel.clone());
        grpc.ready()
            .await
            .map_err(|e| ClientError::Transport(format!("连接服务失败: {}", e)))?;

        let mut request = tonic::Request::new(payload);
        if let Some(token) = auth_token {
            let value: MetadataValue<_> = format!("Bearer {}", token)
                .parse()
                .map_err(|e| ClientError::Encode(format!("无效的会话令牌: {}", e)))?;
            request.metadata_mut().insert("authorization", value);
        }

        let path = PathAndQuery::from_static(method.path());

        if method.is_server_streaming() {
            let response = grpc.server_streaming(request, path, RawCodec).await?;
            let messages: Vec<Bytes> = response.into_inner().try_collect().await?;
            Ok(messages)
        } else {
            let response = grpc.unary(request, path, RawCodec).await?;
            Ok(vec![response.into_inner()])
        }
    }
}
