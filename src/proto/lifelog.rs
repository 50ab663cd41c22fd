//! `lifelog` 包的全部消息类型
//!
//! 与 `proto/lifelog.proto` 一一对应，字段编号与 wire 类型以该文件为准。
//! 结构体形态与 `prost-build` 的生成结果保持一致（`prost::Message` 派生自带
//! `Default` 与 `Debug`），额外派生 serde 以提供 protobuf JSON 映射（camelCase 字段名）。

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimeRangeRequest {
    #[prost(string, tag = "1")]
    pub start_time: String,
    #[prost(string, tag = "2")]
    pub end_time: String,
    #[prost(int32, tag = "3")]
    pub limit: i32,
    #[prost(int32, tag = "4")]
    pub offset: i32,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimeStamped {
    #[prost(string, tag = "1")]
    pub timestamp: String,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchRequest {
    #[prost(string, tag = "1")]
    pub query: String,
    #[prost(string, repeated, tag = "2")]
    pub data_sources: Vec<String>,
    #[prost(message, optional, tag = "3")]
    pub time_range: Option<TimeRangeRequest>,
    #[prost(bool, tag = "4")]
    pub use_llm: bool,
}

/// 单条搜索命中
///
/// 负载为 oneof：二进制（截图、摄像头帧）或文本（OCR、上传文本）。
/// JSON 中两个分支平铺为 `binaryData` / `textData` 之一；
/// 分支类型不符或同时出现两个分支时解析失败。
#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "SearchResultJson")]
pub struct SearchResult {
    #[prost(string, tag = "1")]
    pub r#type: String,
    #[prost(string, tag = "2")]
    pub timestamp: String,
    #[prost(string, tag = "3")]
    pub source_id: String,
    #[prost(map = "string, string", tag = "4")]
    pub metadata: HashMap<String, String>,
    #[prost(float, tag = "7")]
    pub relevance_score: f32,
    #[prost(oneof = "search_result::Data", tags = "5, 6")]
    #[serde(flatten)]
    pub data: Option<search_result::Data>,
}

/// `SearchResult` 的 JSON 输入形态，oneof 的两个分支各自按类型严格解析
#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SearchResultJson {
    r#type: String,
    timestamp: String,
    source_id: String,
    metadata: HashMap<String, String>,
    relevance_score: f32,
    #[serde(deserialize_with = "crate::proto::json::base64_bytes_opt::deserialize")]
    binary_data: Option<Vec<u8>>,
    text_data: Option<String>,
}

impl TryFrom<SearchResultJson> for SearchResult {
    type Error = String;

    fn try_from(json: SearchResultJson) -> Result<Self, Self::Error> {
        let data = match (json.binary_data, json.text_data) {
            (Some(_), Some(_)) => {
                return Err("binaryData 与 textData 不能同时出现".to_string());
            }
            (Some(bytes), None) => Some(search_result::Data::BinaryData(bytes)),
            (None, Some(text)) => Some(search_result::Data::TextData(text)),
            (None, None) => None,
        };
        Ok(Self {
            r#type: json.r#type,
            timestamp: json.timestamp,
            source_id: json.source_id,
            metadata: json.metadata,
            relevance_score: json.relevance_score,
            data,
        })
    }
}

pub mod search_result {
    use serde::{Deserialize, Serialize};

    #[derive(Clone, PartialEq, prost::Oneof, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub enum Data {
        #[prost(bytes = "vec", tag = "5")]
        #[serde(with = "crate::proto::json::base64_bytes")]
        BinaryData(Vec<u8>),
        #[prost(string, tag = "6")]
        TextData(String),
    }
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchResponse {
    #[prost(message, repeated, tag = "1")]
    pub results: Vec<SearchResult>,
    #[prost(int32, tag = "2")]
    pub total_results: i32,
    #[prost(string, tag = "3")]
    pub search_id: String,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScreenshotData {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub timestamp: String,
    #[prost(bytes = "vec", tag = "3")]
    #[serde(with = "crate::proto::json::base64_bytes")]
    pub image_data: Vec<u8>,
    #[prost(string, tag = "4")]
    pub mime_type: String,
    #[prost(map = "string, string", tag = "5")]
    pub metadata: HashMap<String, String>,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessData {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub timestamp: String,
    #[prost(string, tag = "3")]
    pub process_name: String,
    #[prost(string, tag = "4")]
    pub window_title: String,
    #[prost(int32, tag = "5")]
    pub pid: i32,
    #[prost(float, tag = "6")]
    pub cpu_usage: f32,
    #[prost(float, tag = "7")]
    pub memory_usage: f32,
    #[prost(bool, tag = "8")]
    pub is_focused: bool,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessStatsRequest {
    #[prost(message, optional, tag = "1")]
    pub time_range: Option<TimeRangeRequest>,
    #[prost(string, tag = "2")]
    pub process_name: String,
    #[prost(bool, tag = "3")]
    pub aggregate: bool,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessStatsSummary {
    #[prost(string, tag = "1")]
    pub process_name: String,
    /// 累计活跃时长（秒）
    #[prost(double, tag = "2")]
    pub total_active_time: f64,
    #[prost(double, tag = "3")]
    pub average_cpu_usage: f64,
    #[prost(double, tag = "4")]
    pub average_memory_usage: f64,
    #[prost(int32, tag = "5")]
    pub focus_count: i32,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessStatsResponse {
    #[prost(message, repeated, tag = "1")]
    pub summaries: Vec<ProcessStatsSummary>,
    /// 小时（"00"-"23"）→ 活跃秒数
    #[prost(map = "string, double", tag = "2")]
    pub usage_by_hour: HashMap<String, f64>,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CameraFrameData {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub timestamp: String,
    #[prost(bytes = "vec", tag = "3")]
    #[serde(with = "crate::proto::json::base64_bytes")]
    pub image_data: Vec<u8>,
    #[prost(string, tag = "4")]
    pub mime_type: String,
    #[prost(map = "string, string", tag = "5")]
    pub metadata: HashMap<String, String>,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActivitySummary {
    #[prost(message, optional, tag = "1")]
    pub time_range: Option<TimeRangeRequest>,
    #[prost(message, repeated, tag = "2")]
    pub activity_periods: Vec<ActivityPeriod>,
    #[prost(map = "string, double", tag = "3")]
    pub app_usage: HashMap<String, f64>,
    #[prost(int32, tag = "4")]
    pub total_screenshots: i32,
    #[prost(int32, tag = "5")]
    pub total_camera_frames: i32,
    #[prost(map = "string, int32", tag = "6")]
    pub total_by_logger: HashMap<String, i32>,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActivityPeriod {
    #[prost(string, tag = "1")]
    pub start_time: String,
    #[prost(string, tag = "2")]
    pub end_time: String,
    #[prost(string, tag = "3")]
    pub primary_activity: String,
    #[prost(map = "string, double", tag = "4")]
    pub apps_used: HashMap<String, f64>,
    #[prost(double, tag = "5")]
    pub activity_level: f64,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoginRequest {
    #[prost(string, tag = "1")]
    pub username: String,
    #[prost(string, tag = "2")]
    pub password: String,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoginResponse {
    #[prost(string, tag = "1")]
    pub token: String,
    #[prost(bool, tag = "2")]
    pub success: bool,
    #[prost(string, tag = "3")]
    pub error_message: String,
    #[prost(message, optional, tag = "4")]
    pub user_profile: Option<UserProfile>,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterRequest {
    #[prost(string, tag = "1")]
    pub username: String,
    #[prost(string, tag = "2")]
    pub password: String,
    #[prost(string, tag = "3")]
    pub email: String,
    #[prost(string, tag = "4")]
    pub display_name: String,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterResponse {
    #[prost(bool, tag = "1")]
    pub success: bool,
    #[prost(string, tag = "2")]
    pub error_message: String,
    #[prost(string, tag = "3")]
    pub token: String,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserRequest {
    #[prost(string, tag = "1")]
    pub user_id: String,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    #[prost(string, tag = "1")]
    pub user_id: String,
    #[prost(string, tag = "2")]
    pub username: String,
    #[prost(string, tag = "3")]
    pub display_name: String,
    #[prost(string, tag = "4")]
    pub email: String,
    #[prost(string, tag = "5")]
    pub created_at: String,
    #[prost(map = "string, bool", tag = "6")]
    pub settings: HashMap<String, bool>,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggerStatusRequest {
    /// 为空时查询全部 logger
    #[prost(string, repeated, tag = "1")]
    pub logger_names: Vec<String>,
}

/// 单个 logger 的运行状态
#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggerStatus {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(bool, tag = "2")]
    pub enabled: bool,
    #[prost(bool, tag = "3")]
    pub running: bool,
    #[prost(string, tag = "4")]
    pub last_active: String,
    #[prost(int64, tag = "5")]
    #[serde(with = "crate::proto::json::int64")]
    pub data_points: i64,
    /// 空字符串表示无错误
    #[prost(string, tag = "6")]
    pub error: String,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggerStatusResponse {
    #[prost(message, repeated, tag = "1")]
    pub loggers: Vec<LoggerStatus>,
    #[prost(map = "string, string", tag = "2")]
    pub system_stats: HashMap<String, String>,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ToggleLoggerRequest {
    #[prost(string, tag = "1")]
    pub logger_name: String,
    #[prost(bool, tag = "2")]
    pub enable: bool,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ToggleLoggerResponse {
    #[prost(bool, tag = "1")]
    pub success: bool,
    #[prost(string, tag = "2")]
    pub error_message: String,
    #[prost(message, optional, tag = "3")]
    pub status: Option<LoggerStatus>,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SnapshotRequest {
    #[prost(string, repeated, tag = "1")]
    pub loggers: Vec<String>,
    #[prost(map = "string, string", tag = "2")]
    pub options: HashMap<String, String>,
}

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SnapshotResponse {
    #[prost(string, tag = "1")]
    pub snapshot_id: String,
    #[prost(bool, tag = "2")]
    pub success: bool,
    #[prost(string, tag = "3")]
    pub error_message: String,
    #[prost(string, repeated, tag = "4")]
    pub triggered_loggers: Vec<String>,
}
