use url::Url;

use crate::{
    amount::Amount,
    error::{Error, VnpayResult},
    locale::Locale,
    time::is_time_string,
    txn_ref,
    util::{canonicalize, parse_ip, sign_with_hmac, DEFAULT_IP_ADDR},
    vnpay::VnpayConfig,
};

use super::VNP_SECURE_HASH;

/// 发起支付时参与签名的字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Amount,
    Command,
    CreateDate,
    CurrCode,
    IpAddr,
    Locale,
    OrderInfo,
    ReturnUrl,
    TmnCode,
    TxnRef,
    Version,
}

impl Field {
    /// 按字段名 ASCII 升序排列，即签名时的顺序
    pub const SIGNED: [Field; 11] = [
        Field::Amount,
        Field::Command,
        Field::CreateDate,
        Field::CurrCode,
        Field::IpAddr,
        Field::Locale,
        Field::OrderInfo,
        Field::ReturnUrl,
        Field::TmnCode,
        Field::TxnRef,
        Field::Version,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Field::Amount => "vnp_Amount",
            Field::Command => "vnp_Command",
            Field::CreateDate => "vnp_CreateDate",
            Field::CurrCode => "vnp_CurrCode",
            Field::IpAddr => "vnp_IpAddr",
            Field::Locale => "vnp_Locale",
            Field::OrderInfo => "vnp_OrderInfo",
            Field::ReturnUrl => "vnp_ReturnUrl",
            Field::TmnCode => "vnp_TmnCode",
            Field::TxnRef => "vnp_TxnRef",
            Field::Version => "vnp_Version",
        }
    }
}

/// 一次支付请求。每次结账新建，签名后生成跳转链接即丢弃
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    version: String,
    command: String,
    terminal_code: String,
    amount: Amount,
    currency_code: String,
    txn_ref: String,
    order_info: String,
    locale: Locale,
    return_url: String,
    create_date: String,
    ip_addr: String,
}

impl PaymentRequest {
    pub fn new(
        config: &VnpayConfig,
        amount: Amount,
        txn_ref: &str,
        create_date: &str,
        ip_addr: &str,
    ) -> VnpayResult<Self> {
        txn_ref::validate(txn_ref)?;

        if !is_time_string(create_date) {
            return Err(Error::Params(format!(
                "vnp_CreateDate must be formatted as YYYYMMDDHHmmss, got {}",
                create_date
            )));
        }

        // 客户端地址原样进入待签名字符串，必须是合法 IP
        let ip_addr = match ip_addr.trim() {
            "" => DEFAULT_IP_ADDR.to_owned(),
            ip => match parse_ip(ip) {
                Some(ip) => ip.to_string(),
                None => {
                    error!("invalid client ip: {}", ip);
                    return Err(Error::Params(format!("vnp_IpAddr is not an ip address: {}", ip)));
                }
            },
        };

        Ok(Self {
            version: config.version().to_owned(),
            command: config.command().to_owned(),
            terminal_code: config.terminal_code().to_owned(),
            amount,
            currency_code: config.currency_code().to_owned(),
            txn_ref: txn_ref.to_owned(),
            order_info: format!("Thanh toan cho ma GD:{}", txn_ref),
            locale: config.locale(),
            return_url: config.return_url().to_owned(),
            create_date: create_date.to_owned(),
            ip_addr,
        })
    }

    pub fn with_order_info<S: Into<String>>(mut self, order_info: S) -> Self {
        self.order_info = order_info.into();
        self
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn txn_ref(&self) -> &str {
        &self.txn_ref
    }

    pub fn order_info(&self) -> &str {
        &self.order_info
    }

    pub fn create_date(&self) -> &str {
        &self.create_date
    }

    pub fn ip_addr(&self) -> &str {
        &self.ip_addr
    }

    fn value(&self, field: Field) -> String {
        match field {
            Field::Amount => self.amount.minor_units().to_string(),
            Field::Command => self.command.clone(),
            Field::CreateDate => self.create_date.clone(),
            Field::CurrCode => self.currency_code.clone(),
            Field::IpAddr => self.ip_addr.clone(),
            Field::Locale => self.locale.as_str().to_owned(),
            Field::OrderInfo => self.order_info.clone(),
            Field::ReturnUrl => self.return_url.clone(),
            Field::TmnCode => self.terminal_code.clone(),
            Field::TxnRef => self.txn_ref.clone(),
            Field::Version => self.version.clone(),
        }
    }

    /// 参与签名的全部字段，按签名顺序
    pub fn params(&self) -> Vec<(&'static str, String)> {
        Field::SIGNED
            .iter()
            .map(|&field| (field.name(), self.value(field)))
            .collect()
    }

    /// 待签名字符串
    pub fn sign_data(&self) -> String {
        let params = self.params();
        canonicalize(params.iter().map(|(k, v)| (*k, v.as_str())))
    }

    pub fn secure_hash(&self, secret_key: &str) -> VnpayResult<String> {
        let sign_str = self.sign_data();
        debug!("sign str: {}", sign_str);

        let secure_hash = sign_with_hmac(secret_key, &sign_str)?;
        debug!("secure hash: {}", secure_hash);

        Ok(secure_hash)
    }

    /// 生成跳转到支付网关的链接，参数经过 form 编码
    pub fn to_url(&self, config: &VnpayConfig) -> VnpayResult<String> {
        let secure_hash = self.secure_hash(config.secret_key())?;

        let mut url = Url::parse(config.gateway()).map_err(|e| {
            error!("parse gateway url failed: {}", e);
            Error::InvalidConfiguration(format!("gateway: {}", e))
        })?;

        let params = self.params();
        url.query_pairs_mut()
            .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())))
            .append_pair(VNP_SECURE_HASH, &secure_hash);

        Ok(url.to_string())
    }
}
