//! # logger 状态与快照
//!
//! 模块面板的数据：查询 logger 状态（带短期缓存，多个面板轮询时共用结果）、
//! 切换 logger、触发快照。切换与快照成功后缓存立即失效。

use std::collections::HashMap;

use crate::client::{ClientError, LifelogClient};
use crate::proto::{LoggerStatusResponse, SnapshotResponse, ToggleLoggerResponse};
use crate::services::cache::AppCache;

/// 查询 logger 状态，TTL 内直接返回缓存
pub async fn logger_status(
    client: &LifelogClient,
    cache: &AppCache,
    names: Vec<String>,
) -> Result<LoggerStatusResponse, ClientError> {
    if let Some(cached) = cache.get_logger_status(&names) {
        return Ok(cached);
    }

    let response = client.get_logger_status(names.clone()).await?;
    cache.set_logger_status(&names, response.clone());
    Ok(response)
}

pub async fn toggle_logger(
    client: &LifelogClient,
    cache: &AppCache,
    name: &str,
    enable: bool,
) -> Result<ToggleLoggerResponse, ClientError> {
    let response = client.toggle_logger(name, enable).await?;
    cache.invalidate_logger_status();
    if !response.success {
        log::warn!("切换 logger {} 失败: {}", name, response.error_message);
    }
    Ok(response)
}

pub async fn take_snapshot(
    client: &LifelogClient,
    cache: &AppCache,
    loggers: Vec<String>,
    options: HashMap<String, String>,
) -> Result<SnapshotResponse, ClientError> {
    let response = client.take_snapshot(loggers, options).await?;
    cache.invalidate_logger_status();
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::MockTransport;
    use crate::client::{RpcMethod, WireFormat};
    use crate::proto::{self, LoggerStatus};

    fn client_with_counter() -> (LifelogClient, std::sync::Arc<MockTransport>) {
        let transport = MockTransport::new(WireFormat::Protobuf, |method, _| match method {
            RpcMethod::GetLoggerStatus => Ok(vec![proto::encode(&LoggerStatusResponse {
                loggers: vec![LoggerStatus {
                    name: "screen".to_string(),
                    enabled: true,
                    running: true,
                    data_points: 7,
                    ..Default::default()
                }],
                ..Default::default()
            })]),
            RpcMethod::ToggleLogger => Ok(vec![proto::encode(&ToggleLoggerResponse {
                success: true,
                ..Default::default()
            })]),
            _ => Err(ClientError::Status {
                code: 12,
                message: "unimplemented".to_string(),
            }),
        });
        (LifelogClient::new(transport.clone()), transport)
    }

    fn count(transport: &MockTransport, method: RpcMethod) -> usize {
        transport
            .calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, _, _)| *m == method)
            .count()
    }

    #[tokio::test]
    async fn test_status_is_cached_until_toggle() {
        let (client, transport) = client_with_counter();
        let cache = AppCache::new();

        let first = logger_status(&client, &cache, vec![]).await.unwrap();
        let second = logger_status(&client, &cache, vec![]).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.loggers[0].data_points, 7);
        assert_eq!(count(&transport, RpcMethod::GetLoggerStatus), 1);

        toggle_logger(&client, &cache, "screen", false).await.unwrap();
        logger_status(&client, &cache, vec![]).await.unwrap();
        assert_eq!(count(&transport, RpcMethod::GetLoggerStatus), 2);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let (client, _) = client_with_counter();
        let cache = AppCache::new();

        let err = take_snapshot(&client, &cache, vec![], HashMap::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unimplemented"));
    }
}
