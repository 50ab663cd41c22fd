//! # 消息 JSON 表示的字段适配
//!
//! protobuf 的 JSON 映射中有两类字段无法直接使用 serde 默认行为：
//! - `bytes` 字段：JSON 中为 base64 字符串
//! - `int64` 字段：输出为数字，输入同时接受数字与十进制字符串
//!   （JavaScript 端超出 53 位精度时会以字符串形式传入）

use serde::{Deserialize, Deserializer, Serializer};

/// `bytes` 字段的 base64 编解码（标准字母表，带填充）
pub mod base64_bytes {
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;

    use super::*;

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

/// 可缺省的 `bytes` 字段（oneof 分支）：`null` 与缺失都视为未设置
pub mod base64_bytes_opt {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Wrapped(#[serde(with = "super::base64_bytes")] Vec<u8>);

        Ok(Option::<Wrapped>::deserialize(deserializer)?.map(|Wrapped(bytes)| bytes))
    }
}

/// `int64` 字段：数字或数字字符串
pub mod int64 {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(i64),
        Text(String),
    }

    pub fn serialize<S>(value: &i64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(*value)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<i64, D::Error>
    where
        D: Deserializer<'de>,
    {
        match NumberOrString::deserialize(deserializer)? {
            NumberOrString::Number(n) => Ok(n),
            NumberOrString::Text(text) => text
                .trim()
                .parse::<i64>()
                .map_err(|e| serde::de::Error::custom(format!("无效的 int64 值 '{}': {}", text, e))),
        }
    }
}
