use serde::{Deserialize, Serialize};

use crate::error::{Error, VnpayResult};

/// 商户收到 IPN 通知后返回给网关的应答
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct IpnResponse {
    #[serde(rename = "RspCode")]
    pub rsp_code: String,
    #[serde(rename = "Message")]
    pub message: String,
}

impl IpnResponse {
    fn new(rsp_code: &str, message: &str) -> Self {
        Self {
            rsp_code: rsp_code.to_owned(),
            message: message.to_owned(),
        }
    }

    pub fn confirm_success() -> Self {
        Self::new("00", "Confirm Success")
    }

    pub fn order_not_found() -> Self {
        Self::new("01", "Order not found")
    }

    pub fn order_already_confirmed() -> Self {
        Self::new("02", "Order already confirmed")
    }

    pub fn invalid_amount() -> Self {
        Self::new("04", "Invalid amount")
    }

    pub fn invalid_signature() -> Self {
        Self::new("97", "Invalid signature")
    }

    pub fn unknown_error() -> Self {
        Self::new("99", "Unknown error")
    }

    pub fn from_error(err: &Error) -> Self {
        match err {
            Error::SignatureMismatch | Error::MissingField(_) => Self::invalid_signature(),
            Error::InvalidAmount(_) => Self::invalid_amount(),
            _ => Self::unknown_error(),
        }
    }

    pub fn to_json(&self) -> VnpayResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::Error;

    use super::IpnResponse;

    #[test]
    fn json() {
        assert_eq!(
            IpnResponse::confirm_success().to_json().unwrap(),
            r#"{"RspCode":"00","Message":"Confirm Success"}"#
        );
    }

    #[test]
    fn from_error() {
        assert_eq!(
            IpnResponse::from_error(&Error::SignatureMismatch).rsp_code,
            "97"
        );
        assert_eq!(
            IpnResponse::from_error(&Error::MissingField("vnp_SecureHash")).rsp_code,
            "97"
        );
        assert_eq!(
            IpnResponse::from_error(&Error::InvalidAmount("0".to_owned())).rsp_code,
            "04"
        );
        assert_eq!(
            IpnResponse::from_error(&Error::Params("bad".to_owned())).rsp_code,
            "99"
        );
    }
}
