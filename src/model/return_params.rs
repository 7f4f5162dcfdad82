use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use time::PrimitiveDateTime;
use url::{form_urlencoded, Url};

use crate::{
    amount::Amount,
    error::{Error, VnpayResult},
    response_code::ResponseCode,
    time::parse_time_string,
    util::{canonicalize, verify_with_hmac},
};

use super::{VNP_PREFIX, VNP_SECURE_HASH, VNP_SECURE_HASH_TYPE};

/// 网关回调（return url 跳转或 IPN）携带的参数
#[derive(Debug, Clone)]
pub struct ReturnParams {
    fields: BTreeMap<String, String>,
    secure_hash: String,
}

impl ReturnParams {
    /// 解析 query string，开头的 `?` 可有可无
    pub fn from_query(query: &str) -> VnpayResult<Self> {
        let query = query.trim_start_matches('?');
        Self::from_pairs(form_urlencoded::parse(query.as_bytes()).into_owned())
    }

    pub fn from_url(url: &str) -> VnpayResult<Self> {
        let url = Url::parse(url).map_err(|e| Error::Params(format!("invalid url: {}", e)))?;
        Self::from_pairs(url.query_pairs().into_owned())
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> VnpayResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut fields = BTreeMap::new();
        let mut secure_hash = None;

        for (k, v) in pairs {
            let (k, v) = (k.into(), v.into());

            if k == VNP_SECURE_HASH {
                secure_hash = Some(v);
            } else if k == VNP_SECURE_HASH_TYPE {
                continue;
            } else if k.starts_with(VNP_PREFIX) {
                fields.insert(k, v);
            } else {
                trace!("skip unsigned param: {}", k);
            }
        }

        let secure_hash = match secure_hash {
            Some(h) if !h.trim().is_empty() => h,
            _ => {
                error!("callback has no {}", VNP_SECURE_HASH);
                return Err(Error::MissingField(VNP_SECURE_HASH));
            }
        };

        Ok(Self {
            fields,
            secure_hash,
        })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn secure_hash(&self) -> &str {
        &self.secure_hash
    }

    /// 待签名字符串，和发起支付时使用同一套规则
    pub fn sign_data(&self) -> String {
        canonicalize(self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }

    pub fn verify(&self, secret_key: &str) -> VnpayResult<()> {
        let sign_str = self.sign_data();
        debug!("callback sign str: {}", sign_str);

        verify_with_hmac(secret_key, &sign_str, &self.secure_hash)
    }

    /// 验签通过后转换为支付结果
    pub fn verify_into(self, secret_key: &str) -> VnpayResult<PaymentResult> {
        self.verify(secret_key)?;
        self.into_result()
    }

    fn into_result(self) -> VnpayResult<PaymentResult> {
        let map = self
            .fields
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect::<serde_json::Map<String, Value>>();

        let raw: RawPaymentResult = serde_json::from_value(Value::Object(map))?;
        raw.into_payment_result()
    }
}

#[derive(Deserialize, Debug)]
struct RawPaymentResult {
    #[serde(rename = "vnp_TmnCode")]
    tmn_code: String,
    #[serde(rename = "vnp_TxnRef")]
    txn_ref: String,
    #[serde(rename = "vnp_Amount")]
    amount: String,
    #[serde(rename = "vnp_ResponseCode")]
    response_code: ResponseCode,
    #[serde(rename = "vnp_TransactionStatus")]
    transaction_status: Option<String>,
    #[serde(rename = "vnp_TransactionNo")]
    transaction_no: Option<String>,
    #[serde(rename = "vnp_BankCode")]
    bank_code: Option<String>,
    #[serde(rename = "vnp_BankTranNo")]
    bank_tran_no: Option<String>,
    #[serde(rename = "vnp_CardType")]
    card_type: Option<String>,
    #[serde(rename = "vnp_PayDate")]
    pay_date: Option<String>,
    #[serde(rename = "vnp_OrderInfo")]
    order_info: Option<String>,
}

impl RawPaymentResult {
    fn into_payment_result(self) -> VnpayResult<PaymentResult> {
        let minor_units = self.amount.parse::<u64>().map_err(|_| {
            Error::Params(format!("vnp_Amount is not a number: {}", self.amount))
        })?;

        let pay_date = match self.pay_date.as_deref() {
            Some(s) if !s.is_empty() => Some(parse_time_string(s)?),
            _ => None,
        };

        Ok(PaymentResult {
            tmn_code: self.tmn_code,
            txn_ref: self.txn_ref,
            amount: Amount::from_minor_units(minor_units)?,
            response_code: self.response_code,
            transaction_status: self.transaction_status,
            transaction_no: self.transaction_no,
            bank_code: self.bank_code,
            bank_tran_no: self.bank_tran_no,
            card_type: self.card_type,
            pay_date,
            order_info: self.order_info,
        })
    }
}

/// 验签通过的支付结果
#[derive(Debug, Clone)]
pub struct PaymentResult {
    pub tmn_code: String,
    pub txn_ref: String,
    /// 已还原为基础货币单位
    pub amount: Amount,
    pub response_code: ResponseCode,
    pub transaction_status: Option<String>,
    /// 网关侧的交易号
    pub transaction_no: Option<String>,
    pub bank_code: Option<String>,
    pub bank_tran_no: Option<String>,
    pub card_type: Option<String>,
    pub pay_date: Option<PrimitiveDateTime>,
    pub order_info: Option<String>,
}

impl PaymentResult {
    pub fn is_success(&self) -> bool {
        self.response_code.is_success()
            && self
                .transaction_status
                .as_deref()
                .map_or(true, |status| status == "00")
    }
}
