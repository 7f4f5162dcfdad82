pub mod payment_request;
pub mod return_params;

/// 签名字段，不参与签名
pub const VNP_SECURE_HASH: &str = "vnp_SecureHash";
/// 回调里可能携带的签名类型，不参与签名
pub const VNP_SECURE_HASH_TYPE: &str = "vnp_SecureHashType";
/// 只有这个前缀的参数才参与签名
pub const VNP_PREFIX: &str = "vnp_";
