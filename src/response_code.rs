use std::fmt::Display;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// `vnp_ResponseCode`，网关返回的交易结果码
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseCode {
    /// 交易成功
    Success,
    /// 扣款成功，但交易被怀疑存在欺诈
    SuspectedFraud,
    /// 卡或账户未开通网银
    NotRegisteredInternetBanking,
    /// 卡或账户信息验证错误超过 3 次
    AuthenticationFailed,
    /// 支付超时
    Timeout,
    /// 卡或账户被锁定
    CardLocked,
    /// OTP 输入错误
    WrongOtp,
    /// 用户取消交易
    Cancelled,
    /// 余额不足
    InsufficientBalance,
    /// 超过当日交易限额
    DailyLimitExceeded,
    /// 银行维护中
    BankMaintenance,
    /// 支付密码输入错误次数过多
    WrongPasswordTooManyTimes,
    /// 其它错误
    UnknownError,
    Other(String),
}

impl ResponseCode {
    pub fn from_code(code: &str) -> Self {
        match code {
            "00" => ResponseCode::Success,
            "07" => ResponseCode::SuspectedFraud,
            "09" => ResponseCode::NotRegisteredInternetBanking,
            "10" => ResponseCode::AuthenticationFailed,
            "11" => ResponseCode::Timeout,
            "12" => ResponseCode::CardLocked,
            "13" => ResponseCode::WrongOtp,
            "24" => ResponseCode::Cancelled,
            "51" => ResponseCode::InsufficientBalance,
            "65" => ResponseCode::DailyLimitExceeded,
            "75" => ResponseCode::BankMaintenance,
            "79" => ResponseCode::WrongPasswordTooManyTimes,
            "99" => ResponseCode::UnknownError,
            other => ResponseCode::Other(other.to_owned()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ResponseCode::Success => "00",
            ResponseCode::SuspectedFraud => "07",
            ResponseCode::NotRegisteredInternetBanking => "09",
            ResponseCode::AuthenticationFailed => "10",
            ResponseCode::Timeout => "11",
            ResponseCode::CardLocked => "12",
            ResponseCode::WrongOtp => "13",
            ResponseCode::Cancelled => "24",
            ResponseCode::InsufficientBalance => "51",
            ResponseCode::DailyLimitExceeded => "65",
            ResponseCode::BankMaintenance => "75",
            ResponseCode::WrongPasswordTooManyTimes => "79",
            ResponseCode::UnknownError => "99",
            ResponseCode::Other(code) => code,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            ResponseCode::Success => "transaction successful",
            ResponseCode::SuspectedFraud => "money deducted, transaction suspected of fraud",
            ResponseCode::NotRegisteredInternetBanking => {
                "card or account is not registered for internet banking"
            }
            ResponseCode::AuthenticationFailed => {
                "card or account verification failed more than 3 times"
            }
            ResponseCode::Timeout => "payment window expired",
            ResponseCode::CardLocked => "card or account is locked",
            ResponseCode::WrongOtp => "wrong one-time password",
            ResponseCode::Cancelled => "customer cancelled the transaction",
            ResponseCode::InsufficientBalance => "insufficient balance",
            ResponseCode::DailyLimitExceeded => "daily transaction limit exceeded",
            ResponseCode::BankMaintenance => "bank is under maintenance",
            ResponseCode::WrongPasswordTooManyTimes => "payment password entered wrong too many times",
            ResponseCode::UnknownError | ResponseCode::Other(_) => "unknown error",
        }
    }

    pub fn is_success(&self) -> bool {
        *self == ResponseCode::Success
    }
}

impl Display for ResponseCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.as_str(), self.description())
    }
}

impl Serialize for ResponseCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ResponseCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        Ok(ResponseCode::from_code(&code))
    }
}
