use std::convert::TryFrom;

use rust_vnpay_sdk::{
    error::VnpayResult, util::client_ip, vnpay::SANDBOX_GATEWAY, Amount, VnpayConfig,
    VnpayConfigBuilder, VnpaySDK,
};

const TMN_CODE: &str = "TESTCODE";
const HASH_SECRET: &str = "TESTSECRET";
const RETURN_URL: &str = "http://localhost:3000/payment/vnpay_return";

fn main() -> VnpayResult<()> {
    env_logger::init();

    // 设置了 VNP_* 环境变量时优先使用
    let config = match VnpayConfig::from_env() {
        Ok(config) => config,
        Err(_) => VnpayConfigBuilder::new(TMN_CODE, HASH_SECRET)
            .with_return_url(RETURN_URL)
            .with_gateway(SANDBOX_GATEWAY)
            .build()?,
    };

    let sdk = VnpaySDK::new(config);

    let ip = client_ip(Some("203.0.113.7"), None);
    let url = sdk.build_payment_url(Amount::try_from(50000i64)?, &ip)?;
    println!("{}", url);

    Ok(())
}
