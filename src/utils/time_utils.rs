//! 时间工具模块
//! 链上时间统一为无时区的 `YYYY-MM-DDTHH:MM:SS`（UTC）

use chrono::{Duration, NaiveDateTime};

/// 链上时间格式
pub const CHAIN_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// 格式化为链上时间字符串
pub fn format_chain_time(time: &NaiveDateTime) -> String {
    time.format(CHAIN_TIME_FORMAT).to_string()
}

/// 解析链上时间，容忍末尾的 `Z`
pub fn parse_chain_time(s: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(s.trim().trim_end_matches('Z'), CHAIN_TIME_FORMAT)
}

/// 在链上时间基础上增加秒数（交易过期时间）
pub fn add_seconds(time: &NaiveDateTime, secs: u64) -> NaiveDateTime {
    // Duration::seconds 的上限是 i64::MAX 毫秒
    let secs = i64::try_from(secs).unwrap_or(i64::MAX).min(i64::MAX / 1_000);
    time.checked_add_signed(Duration::seconds(secs))
        .unwrap_or(NaiveDateTime::MAX)
}

/// serde：`NaiveDateTime` ⇄ 链上时间字符串
pub mod chain_time {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_chain_time(time))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        super::parse_chain_time(&s).map_err(serde::de::Error::custom)
    }
}
