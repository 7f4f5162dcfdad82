use time::{macros::format_description, OffsetDateTime, PrimitiveDateTime};

use crate::error::{Error, VnpayResult};

pub fn now() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

/// 网关时间格式 `YYYYMMDDHHmmss`，固定 14 位数字
pub fn to_time_string(datetime: OffsetDateTime) -> VnpayResult<String> {
    let format = format_description!("[year][month][day][hour][minute][second]");

    datetime.format(format).map_err(|e| {
        error!("format time {} failed: {}", datetime, e);
        Error::Params(format!("cannot format gateway timestamp: {}", e))
    })
}

/// 解析回调里的 `vnp_PayDate` 之类的时间字段
pub fn parse_time_string(s: &str) -> VnpayResult<PrimitiveDateTime> {
    let format = format_description!("[year][month][day][hour][minute][second]");

    PrimitiveDateTime::parse(s, format).map_err(|e| {
        error!("parse time string {} failed: {}", s, e);
        Error::Params(format!("invalid gateway timestamp: {}", s))
    })
}

/// 14 位数字且是合法的日期时间
pub(crate) fn is_time_string(s: &str) -> bool {
    s.len() == 14 && s.bytes().all(|b| b.is_ascii_digit()) && parse_time_string(s).is_ok()
}
