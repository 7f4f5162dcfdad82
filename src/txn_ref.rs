use crate::error::{Error, VnpayResult};

/// 网关对 `vnp_TxnRef` 的长度限制
pub const MAX_TXN_REF_LEN: usize = 100;

/// 生成交易号：128 位随机数，32 位小写十六进制
///
/// 不依赖时间戳，同一毫秒内的并发请求也不会冲突
pub fn generate() -> String {
    format!("{:032x}", rand::random::<u128>())
}

/// 校验调用方自行传入的交易号
pub fn validate(txn_ref: &str) -> VnpayResult<()> {
    if txn_ref.is_empty() {
        return Err(Error::Params("vnp_TxnRef must not be empty".to_owned()));
    }

    if txn_ref.len() > MAX_TXN_REF_LEN {
        return Err(Error::Params(format!(
            "vnp_TxnRef is longer than {} characters",
            MAX_TXN_REF_LEN
        )));
    }

    if !txn_ref
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    {
        return Err(Error::Params(format!(
            "vnp_TxnRef contains invalid characters: {}",
            txn_ref
        )));
    }

    Ok(())
}
