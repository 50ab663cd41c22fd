//! # lifelog.LifelogService 协议消息
//!
//! 本模块提供服务端协议的全部消息类型及其两种表示之间的转换：
//! - **二进制**：标准 protobuf wire 格式（`prost`），供 gRPC / gRPC-Web 使用
//! - **JSON 对象**：protobuf JSON 映射（`serde_json`），供 REST 通道和前端 IPC 使用
//!
//! ## 对外操作
//! - `encode` / `decode` - 二进制编解码
//! - `to_object` / `from_object` - JSON 对象转换
//! - `verify` - 结构校验：JSON 对象能否作为指定消息类型解析，返回失败原因
//!
//! ## 约定
//! - 缺失字段取 proto3 默认值
//! - `bytes` 字段在 JSON 中为 base64 字符串
//! - `int64` 字段在 JSON 中输出数字，输入接受数字或十进制字符串

pub mod json;
pub mod lifelog;

use bytes::Bytes;
use prost::Message;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub use lifelog::*;

/// 服务全名，用于拼接 RPC 路径
pub const SERVICE: &str = "lifelog.LifelogService";

/// 所有 lifelog 消息类型的公共约束
///
/// 同时具备二进制编解码（`prost::Message`）和 JSON 映射（serde）能力，
/// 客户端的泛型调用路径只依赖此 trait。
pub trait LifelogMessage:
    Message + Default + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// 消息全名（如 `lifelog.LoggerStatus`）
    const NAME: &'static str;
}

macro_rules! lifelog_messages {
    ($($ty:ident),* $(,)?) => {
        $(
            impl LifelogMessage for $ty {
                const NAME: &'static str = concat!("lifelog.", stringify!($ty));
            }
        )*
    };
}

lifelog_messages!(
    TimeRangeRequest,
    TimeStamped,
    SearchRequest,
    SearchResult,
    SearchResponse,
    ScreenshotData,
    ProcessData,
    ProcessStatsRequest,
    ProcessStatsSummary,
    ProcessStatsResponse,
    CameraFrameData,
    ActivitySummary,
    ActivityPeriod,
    LoginRequest,
    LoginResponse,
    RegisterRequest,
    RegisterResponse,
    UserRequest,
    UserProfile,
    LoggerStatusRequest,
    LoggerStatus,
    LoggerStatusResponse,
    ToggleLoggerRequest,
    ToggleLoggerResponse,
    SnapshotRequest,
    SnapshotResponse,
);

/// 将消息编码为 protobuf 二进制
pub fn encode<M: LifelogMessage>(message: &M) -> Bytes {
    Bytes::from(message.encode_to_vec())
}

/// 从 protobuf 二进制解码消息
///
/// # 错误
/// 字节流不是合法的 `M` 编码（截断、wire 类型不符、非法 varint）时返回错误
pub fn decode<M: LifelogMessage>(buf: &[u8]) -> Result<M, String> {
    M::decode(buf).map_err(|e| format!("解码 {} 失败: {}", M::NAME, e))
}

/// 将消息转换为 JSON 对象（protobuf JSON 映射，camelCase 字段名）
pub fn to_object<M: LifelogMessage>(message: &M) -> Result<Value, String> {
    serde_json::to_value(message).map_err(|e| format!("序列化 {} 失败: {}", M::NAME, e))
}

/// 从 JSON 对象构造消息
///
/// 缺失字段取默认值；字段类型不符时返回错误。
pub fn from_object<M: LifelogMessage>(object: Value) -> Result<M, String> {
    serde_json::from_value(object).map_err(|e| format!("解析 {} 失败: {}", M::NAME, e))
}

/// 校验 JSON 对象的结构
///
/// # 返回值
/// - `None` - 对象可以作为 `M` 解析
/// - `Some(reason)` - 第一处结构错误的描述
pub fn verify<M: LifelogMessage>(object: &Value) -> Option<String> {
    if !object.is_object() {
        return Some(format!("{}: 期望 JSON 对象", M::NAME));
    }
    serde_json::from_value::<M>(object.clone())
        .err()
        .map(|e| format!("{}: {}", M::NAME, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_logger_status() -> LoggerStatus {
        LoggerStatus {
            name: "mic".to_string(),
            enabled: true,
            running: false,
            last_active: "2024-05-01T10:00:00Z".to_string(),
            data_points: 42,
            error: String::new(),
        }
    }

    #[test]
    fn test_toggle_logger_request_round_trip() {
        let request = ToggleLoggerRequest {
            logger_name: "screen".to_string(),
            enable: true,
        };
        let decoded: ToggleLoggerRequest = decode(&encode(&request)).unwrap();
        assert_eq!(decoded.logger_name, "screen");
        assert!(decoded.enable);
    }

    #[test]
    fn test_logger_status_object_round_trip() {
        let status = sample_logger_status();
        let object = to_object(&status).unwrap();
        assert_eq!(object["dataPoints"], json!(42));
        assert_eq!(verify::<LoggerStatus>(&object), None);

        let restored: LoggerStatus = from_object(object).unwrap();
        assert_eq!(restored.data_points, 42);
        assert_eq!(restored, status);
    }

    #[test]
    fn test_int64_accepts_decimal_string() {
        let restored: LoggerStatus =
            from_object(json!({ "name": "mic", "dataPoints": "42" })).unwrap();
        assert_eq!(restored.data_points, 42);

        // 超出 JavaScript 安全整数范围的值
        let big: LoggerStatus =
            from_object(json!({ "dataPoints": "9007199254740993" })).unwrap();
        assert_eq!(big.data_points, 9_007_199_254_740_993);
    }

    #[test]
    fn test_search_result_oneof() {
        let text = SearchResult {
            r#type: "ocr".to_string(),
            source_id: "shot-1".to_string(),
            relevance_score: 0.5,
            data: Some(search_result::Data::TextData("hello".to_string())),
            ..Default::default()
        };
        let object = to_object(&text).unwrap();
        assert_eq!(object["textData"], json!("hello"));
        assert_eq!(object["type"], json!("ocr"));
        assert!(object.get("binaryData").is_none());
        assert_eq!(from_object::<SearchResult>(object).unwrap(), text);

        let binary = SearchResult {
            data: Some(search_result::Data::BinaryData(vec![1, 2, 3])),
            ..Default::default()
        };
        let object = to_object(&binary).unwrap();
        assert_eq!(object["binaryData"], json!("AQID"));
        assert_eq!(decode::<SearchResult>(&encode(&binary)).unwrap(), binary);
        assert_eq!(from_object::<SearchResult>(object).unwrap(), binary);
    }

    #[test]
    fn test_search_result_rejects_mistyped_branch() {
        assert!(verify::<SearchResult>(&json!({ "textData": 5 })).is_some());
        assert!(verify::<SearchResult>(&json!({ "binaryData": "!!!not-base64" })).is_some());
        assert!(verify::<SearchResult>(&json!({ "binaryData": 7 })).is_some());
        assert!(from_object::<SearchResult>(json!({ "textData": 5 })).is_err());
        assert!(
            from_object::<SearchResult>(json!({ "textData": "a", "binaryData": "AQID" })).is_err()
        );

        let empty: SearchResult = from_object(json!({ "type": "ocr", "textData": null })).unwrap();
        assert_eq!(empty.data, None);
        assert_eq!(empty.r#type, "ocr");
    }

    #[test]
    fn test_nested_messages_round_trip() {
        let mut system_stats = std::collections::HashMap::new();
        system_stats.insert("cpu_usage".to_string(), "5%".to_string());
        let response = LoggerStatusResponse {
            loggers: vec![sample_logger_status()],
            system_stats,
        };
        let decoded: LoggerStatusResponse = decode(&encode(&response)).unwrap();
        assert_eq!(decoded, response);

        let summary = ActivitySummary {
            time_range: Some(TimeRangeRequest {
                start_time: "2024-05-01T00:00:00Z".to_string(),
                end_time: "2024-05-02T00:00:00Z".to_string(),
                limit: 10,
                offset: 0,
            }),
            total_screenshots: 7,
            ..Default::default()
        };
        let object = to_object(&summary).unwrap();
        assert_eq!(verify::<ActivitySummary>(&object), None);
        assert_eq!(from_object::<ActivitySummary>(object).unwrap(), summary);
    }

    #[test]
    fn test_verify_reports_type_mismatch() {
        assert!(verify::<ToggleLoggerRequest>(&json!({ "enable": "yes" })).is_some());
        assert!(verify::<ToggleLoggerRequest>(&json!("screen")).is_some());
        assert!(verify::<TimeRangeRequest>(&json!({ "limit": 1.5 })).is_some());
        assert_eq!(verify::<ToggleLoggerRequest>(&json!({})), None);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode::<LoggerStatus>(&[0xff, 0xff]).is_err());
        // 字段 1 声明长度 10，实际只有 2 字节
        assert!(decode::<LoggerStatus>(&[0x0a, 0x0a, b'm', b'i']).is_err());
    }

    #[test]
    fn test_message_names() {
        assert_eq!(LoggerStatus::NAME, "lifelog.LoggerStatus");
        assert_eq!(SnapshotResponse::NAME, "lifelog.SnapshotResponse");
    }
}
