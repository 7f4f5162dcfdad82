use std::{convert::TryFrom, fmt::Display, str::FromStr};

use serde_json::Value;

use crate::error::{Error, VnpayResult};

/// 网关要求金额以最小单位传输（基础金额 × 100）
const MINOR_UNIT_FACTOR: u64 = 100;

/// 支付金额，单位为基础货币单位，必须为正整数
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Amount(u64);

impl Amount {
    pub fn new(value: u64) -> VnpayResult<Self> {
        if value == 0 {
            return Err(Error::InvalidAmount("amount must be positive".to_owned()));
        }

        if value.checked_mul(MINOR_UNIT_FACTOR).is_none() {
            return Err(Error::InvalidAmount(format!("amount {} is too large", value)));
        }

        Ok(Self(value))
    }

    /// 从回调中的 `vnp_Amount` 还原金额
    pub fn from_minor_units(minor_units: u64) -> VnpayResult<Self> {
        if minor_units % MINOR_UNIT_FACTOR != 0 {
            return Err(Error::Params(format!(
                "vnp_Amount {} is not a whole amount",
                minor_units
            )));
        }

        Self::new(minor_units / MINOR_UNIT_FACTOR)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn minor_units(&self) -> u64 {
        // 构造时已检查过溢出
        self.0 * MINOR_UNIT_FACTOR
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u64> for Amount {
    type Error = Error;

    fn try_from(value: u64) -> VnpayResult<Self> {
        Self::new(value)
    }
}

impl TryFrom<i64> for Amount {
    type Error = Error;

    fn try_from(value: i64) -> VnpayResult<Self> {
        if value <= 0 {
            return Err(Error::InvalidAmount(format!(
                "amount must be positive, got {}",
                value
            )));
        }

        Self::new(value as u64)
    }
}

impl TryFrom<f64> for Amount {
    type Error = Error;

    fn try_from(value: f64) -> VnpayResult<Self> {
        if !value.is_finite() || value.fract() != 0.0 {
            return Err(Error::InvalidAmount(format!(
                "amount must be an integer, got {}",
                value
            )));
        }

        if value <= 0.0 || value > u64::MAX as f64 {
            return Err(Error::InvalidAmount(format!(
                "amount out of range: {}",
                value
            )));
        }

        Self::new(value as u64)
    }
}

/// 兼容请求体里直接传入的 json 值，例如 `{"amount": 50000}` 或 `{"amount": "50000"}`
impl TryFrom<&Value> for Amount {
    type Error = Error;

    fn try_from(value: &Value) -> VnpayResult<Self> {
        match value {
            Value::Number(n) => {
                if let Some(v) = n.as_u64() {
                    Self::new(v)
                } else if let Some(v) = n.as_i64() {
                    Self::try_from(v)
                } else {
                    Self::try_from(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(s) => s.parse(),
            other => Err(Error::InvalidAmount(format!(
                "amount must be a number, got {}",
                other
            ))),
        }
    }
}

impl FromStr for Amount {
    type Err = Error;

    fn from_str(s: &str) -> VnpayResult<Self> {
        let s = s.trim();

        if let Ok(v) = s.parse::<i64>() {
            return Self::try_from(v);
        }

        match s.parse::<f64>() {
            Ok(v) => Self::try_from(v),
            Err(_) => Err(Error::InvalidAmount(format!("not a number: {:?}", s))),
        }
    }
}
