use std::{convert::TryFrom, env, fmt};

use url::Url;

use crate::{
    amount::Amount,
    error::{Error, VnpayResult},
    ipn::IpnResponse,
    locale::Locale,
    model::{
        payment_request::PaymentRequest,
        return_params::{PaymentResult, ReturnParams},
    },
    time::{now, to_time_string},
    txn_ref,
    util::DEFAULT_IP_ADDR,
};

/// 沙箱环境的支付网关地址
pub const SANDBOX_GATEWAY: &str = "https://sandbox.vnpayment.vn/paymentv2/vpcpay.html";

const DEFAULT_VERSION: &str = "2.1.0";
const DEFAULT_COMMAND: &str = "pay";
const DEFAULT_CURRENCY_CODE: &str = "VND";

/// VnpayConfig SDK 配置，只能通过 [`VnpayConfigBuilder`] 构造
#[derive(Clone)]
pub struct VnpayConfig {
    /// 商户终端号 vnp_TmnCode
    terminal_code: String,
    /// 签名密钥 vnp_HashSecret
    secret_key: String,
    /// 支付完成后网关跳转回商户的地址
    return_url: String,
    gateway: String,
    version: String,
    command: String,
    currency_code: String,
    locale: Locale,
}

impl VnpayConfig {
    pub fn builder<S: Into<String>>(terminal_code: S, secret_key: S) -> VnpayConfigBuilder {
        VnpayConfigBuilder::new(terminal_code, secret_key)
    }

    /// 从环境变量读取配置：
    /// `VNP_TMN_CODE`、`VNP_HASH_SECRET`、`VNP_RETURN_URL`、`VNP_URL`，可选 `VNP_LOCALE`
    pub fn from_env() -> VnpayResult<Self> {
        fn var(name: &str) -> VnpayResult<String> {
            env::var(name).map_err(|_| {
                error!("environment variable {} is not set", name);
                Error::InvalidConfiguration(format!("environment variable {} is not set", name))
            })
        }

        let mut builder = VnpayConfigBuilder::new(var("VNP_TMN_CODE")?, var("VNP_HASH_SECRET")?)
            .with_return_url(var("VNP_RETURN_URL")?)
            .with_gateway(var("VNP_URL")?);

        if let Ok(locale) = env::var("VNP_LOCALE") {
            builder = builder.with_locale(Locale::from_str(&locale));
        }

        builder.build()
    }

    pub fn terminal_code(&self) -> &str {
        &self.terminal_code
    }

    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }

    pub fn return_url(&self) -> &str {
        &self.return_url
    }

    pub fn gateway(&self) -> &str {
        &self.gateway
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn currency_code(&self) -> &str {
        &self.currency_code
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }
}

impl fmt::Debug for VnpayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VnpayConfig")
            .field("terminal_code", &self.terminal_code)
            .field("secret_key", &"***")
            .field("return_url", &self.return_url)
            .field("gateway", &self.gateway)
            .field("version", &self.version)
            .field("command", &self.command)
            .field("currency_code", &self.currency_code)
            .field("locale", &self.locale)
            .finish()
    }
}

#[derive(Default)]
pub struct VnpayConfigBuilder {
    terminal_code: String,
    secret_key: String,
    return_url: String,
    gateway: String,
    version: Option<String>,
    locale: Locale,
}

impl VnpayConfigBuilder {
    pub fn new<S: Into<String>>(terminal_code: S, secret_key: S) -> Self {
        VnpayConfigBuilder {
            terminal_code: terminal_code.into(),
            secret_key: secret_key.into(),
            ..Default::default()
        }
    }

    pub fn with_return_url<S: Into<String>>(mut self, return_url: S) -> Self {
        self.return_url = return_url.into();
        self
    }

    pub fn with_gateway<S: Into<String>>(mut self, gateway: S) -> Self {
        self.gateway = gateway.into();
        self
    }

    pub fn with_version<S: Into<String>>(mut self, version: S) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    fn required(name: &str, value: String) -> VnpayResult<String> {
        let value = value.trim();
        if value.is_empty() {
            error!("{} 不能为空", name);
            return Err(Error::InvalidConfiguration(format!("{} must not be blank", name)));
        }

        Ok(value.to_owned())
    }

    fn absolute_url(name: &str, value: String) -> VnpayResult<String> {
        let value = Self::required(name, value)?;

        match Url::parse(&value) {
            Ok(url) if !url.cannot_be_a_base() => Ok(value),
            Ok(_) => Err(Error::InvalidConfiguration(format!(
                "{} is not a hierarchical url: {}",
                name, value
            ))),
            Err(e) => {
                error!("parse {} failed: {}", name, e);
                Err(Error::InvalidConfiguration(format!("{}: {}", name, e)))
            }
        }
    }

    pub fn build(self) -> VnpayResult<VnpayConfig> {
        let version = match self.version {
            Some(v) => Self::required("version", v)?,
            None => DEFAULT_VERSION.to_owned(),
        };

        Ok(VnpayConfig {
            terminal_code: Self::required("terminal_code", self.terminal_code)?,
            secret_key: Self::required("secret_key", self.secret_key)?,
            return_url: Self::absolute_url("return_url", self.return_url)?,
            gateway: Self::absolute_url("gateway", self.gateway)?,
            version,
            command: DEFAULT_COMMAND.to_owned(),
            currency_code: DEFAULT_CURRENCY_CODE.to_owned(),
            locale: self.locale,
        })
    }
}

pub struct VnpaySDK {
    config: VnpayConfig,
}

impl VnpaySDK {
    pub fn new(config: VnpayConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &VnpayConfig {
        &self.config
    }

    /// 生成支付链接，交易号随机生成，创建时间取当前 UTC 时间
    pub fn build_payment_url(&self, amount: Amount, ip_addr: &str) -> VnpayResult<String> {
        let txn_ref = txn_ref::generate();
        let create_date = to_time_string(now())?;
        debug!("new payment: txn_ref={} create_date={}", txn_ref, create_date);

        self.build_payment_url_with(amount, &txn_ref, &create_date, ip_addr)
    }

    /// 使用指定的交易号和创建时间生成支付链接
    pub fn build_payment_url_with(
        &self,
        amount: Amount,
        txn_ref: &str,
        create_date: &str,
        ip_addr: &str,
    ) -> VnpayResult<String> {
        PaymentRequest::new(&self.config, amount, txn_ref, create_date, ip_addr)?
            .to_url(&self.config)
    }

    /// 回调验签（return url 和 IPN 共用）
    pub fn verify_return(&self, query: &str) -> VnpayResult<PaymentResult> {
        self.verify_return_params(ReturnParams::from_query(query)?)
    }

    pub fn verify_return_params(&self, params: ReturnParams) -> VnpayResult<PaymentResult> {
        let result = params.verify_into(&self.config.secret_key)?;

        if result.tmn_code != self.config.terminal_code {
            error!(
                "callback for terminal {} received by terminal {}",
                result.tmn_code, self.config.terminal_code
            );
            return Err(Error::InvalidConfiguration(format!(
                "callback terminal code {} does not match",
                result.tmn_code
            )));
        }

        info!(
            "verified callback: txn_ref={} response_code={}",
            result.txn_ref, result.response_code
        );

        Ok(result)
    }

    /// 处理 IPN 通知。验签失败时直接生成应答，通过后交给 `confirm` 核对订单
    pub fn handle_ipn<F>(&self, query: &str, confirm: F) -> IpnResponse
    where
        F: FnOnce(&PaymentResult) -> IpnResponse,
    {
        match self.verify_return(query) {
            Ok(result) => confirm(&result),
            Err(e) => {
                warn!("reject ipn: {}", e);
                IpnResponse::from_error(&e)
            }
        }
    }
}

/// 生成支付链接，客户端 IP 未知时使用 `127.0.0.1`
pub fn build_payment_url(amount: i64, config: &VnpayConfig) -> VnpayResult<String> {
    let amount = Amount::try_from(amount)?;

    PaymentRequest::new(
        config,
        amount,
        &txn_ref::generate(),
        &to_time_string(now())?,
        DEFAULT_IP_ADDR,
    )?
    .to_url(config)
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, convert::TryFrom, env};

    use url::Url;

    use crate::{
        amount::Amount, error::Error, ipn::IpnResponse, locale::Locale, time::is_time_string,
    };

    use super::{build_payment_url, VnpayConfig, VnpayConfigBuilder, VnpaySDK, SANDBOX_GATEWAY};

    const RETURN_URL: &str = "http://localhost:3000/payment/vnpay_return";
    const CALLBACK: &str = "vnp_Amount=5000000&vnp_BankCode=NCB&vnp_BankTranNo=VNP14226112&vnp_CardType=ATM&vnp_OrderInfo=Thanh+toan+cho+ma+GD%3A1700000000000&vnp_PayDate=20240101120512&vnp_ResponseCode=00&vnp_TmnCode=TESTCODE&vnp_TransactionNo=14226112&vnp_TransactionStatus=00&vnp_TxnRef=1700000000000&vnp_SecureHash=f0423d8d7c2b213ebf023aae4cd6ff01b1079fcf7c9b9e1ab866f42cac228008903017e9bd33e32276dfceaaba04d39fa87930185ba38b90be181c1a1ed74ed4";

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn config() -> VnpayConfig {
        VnpayConfigBuilder::new("TESTCODE", "TESTSECRET")
            .with_return_url(RETURN_URL)
            .with_gateway(SANDBOX_GATEWAY)
            .build()
            .unwrap()
    }

    fn query(url: &str) -> HashMap<String, String> {
        Url::parse(url)
            .unwrap()
            .query_pairs()
            .into_owned()
            .collect()
    }

    fn assert_invalid_config(result: Result<VnpayConfig, Error>) {
        match result {
            Err(Error::InvalidConfiguration(_)) => {}
            other => panic!("expected InvalidConfiguration, got {:?}", other),
        }
    }

    #[test]
    fn builder_defaults() {
        let config = config();

        assert_eq!(config.version(), "2.1.0");
        assert_eq!(config.command(), "pay");
        assert_eq!(config.currency_code(), "VND");
        assert_eq!(config.locale(), Locale::Vn);

        let config = VnpayConfigBuilder::new(" TESTCODE ", "TESTSECRET")
            .with_return_url(RETURN_URL)
            .with_gateway(SANDBOX_GATEWAY)
            .with_locale(Locale::En)
            .with_version("2.0.1")
            .build()
            .unwrap();
        assert_eq!(config.terminal_code(), "TESTCODE");
        assert_eq!(config.locale(), Locale::En);
        assert_eq!(config.version(), "2.0.1");
    }

    #[test]
    fn builder_rejects_blank_values() {
        assert_invalid_config(
            VnpayConfigBuilder::new("", "TESTSECRET")
                .with_return_url(RETURN_URL)
                .with_gateway(SANDBOX_GATEWAY)
                .build(),
        );
        assert_invalid_config(
            VnpayConfigBuilder::new("TESTCODE", "  ")
                .with_return_url(RETURN_URL)
                .with_gateway(SANDBOX_GATEWAY)
                .build(),
        );
        assert_invalid_config(
            VnpayConfigBuilder::new("TESTCODE", "TESTSECRET")
                .with_gateway(SANDBOX_GATEWAY)
                .build(),
        );
        assert_invalid_config(
            VnpayConfigBuilder::new("TESTCODE", "TESTSECRET")
                .with_return_url(RETURN_URL)
                .with_gateway("/paymentv2/vpcpay.html")
                .build(),
        );
        assert_invalid_config(
            VnpayConfigBuilder::new("TESTCODE", "TESTSECRET")
                .with_return_url("mailto:shop@example.com")
                .with_gateway(SANDBOX_GATEWAY)
                .build(),
        );
    }

    #[test]
    fn debug_hides_secret() {
        let s = format!("{:?}", config());

        assert!(s.contains("TESTCODE"));
        assert!(!s.contains("TESTSECRET"));
    }

    #[test]
    fn from_env() {
        env::set_var("VNP_TMN_CODE", "ENVCODE");
        env::set_var("VNP_HASH_SECRET", "ENVSECRET");
        env::set_var("VNP_RETURN_URL", RETURN_URL);
        env::set_var("VNP_URL", SANDBOX_GATEWAY);
        env::set_var("VNP_LOCALE", "en");

        let config = VnpayConfig::from_env().unwrap();
        assert_eq!(config.terminal_code(), "ENVCODE");
        assert_eq!(config.secret_key(), "ENVSECRET");
        assert_eq!(config.locale(), Locale::En);

        env::remove_var("VNP_URL");
        let missing = VnpayConfig::from_env();

        for name in &["VNP_TMN_CODE", "VNP_HASH_SECRET", "VNP_RETURN_URL", "VNP_LOCALE"] {
            env::remove_var(name);
        }

        assert_invalid_config(missing);
    }

    #[test]
    fn payment_url() {
        init();

        let sdk = VnpaySDK::new(config());
        let url = sdk
            .build_payment_url(Amount::try_from(50000i64).unwrap(), "203.0.113.7")
            .unwrap();

        assert!(url.starts_with(SANDBOX_GATEWAY));

        let q = query(&url);
        assert_eq!(q["vnp_Amount"], "5000000");
        assert_eq!(q["vnp_IpAddr"], "203.0.113.7");
        assert_eq!(q["vnp_TxnRef"].len(), 32);
        assert!(is_time_string(&q["vnp_CreateDate"]));
        assert_eq!(q["vnp_SecureHash"].len(), 128);
    }

    #[test]
    fn payment_url_with_fixed_inputs_is_deterministic() {
        let sdk = VnpaySDK::new(config());
        let amount = Amount::try_from(50000i64).unwrap();

        let a = sdk
            .build_payment_url_with(amount, "1700000000000", "20240101120000", "127.0.0.1")
            .unwrap();
        let b = sdk
            .build_payment_url_with(amount, "1700000000000", "20240101120000", "127.0.0.1")
            .unwrap();

        assert_eq!(a, b);
        assert_eq!(
            query(&a)["vnp_SecureHash"],
            "0e18aa718bb95d14056c071f56d2ff8e44caeb293244e86247f1a4c8f5384580132c34f92dcee4a0dcadc2438d983ca91be7b3fabde96b79feb672e83e465125"
        );
    }

    #[test]
    fn fresh_refs_per_call() {
        let sdk = VnpaySDK::new(config());
        let amount = Amount::try_from(1000i64).unwrap();

        let a = query(&sdk.build_payment_url(amount, "").unwrap());
        let b = query(&sdk.build_payment_url(amount, "").unwrap());

        assert_ne!(a["vnp_TxnRef"], b["vnp_TxnRef"]);
        assert_eq!(a["vnp_IpAddr"], "127.0.0.1");
    }

    #[test]
    fn free_function() {
        let config = config();

        for amount in &[1i64, 50000, 1_000_000_000] {
            let url = build_payment_url(*amount, &config).unwrap();
            assert_eq!(query(&url)["vnp_Amount"], (amount * 100).to_string());
        }

        for amount in &[0i64, -100] {
            assert!(matches!(
                build_payment_url(*amount, &config),
                Err(Error::InvalidAmount(_))
            ));
        }
    }

    #[test]
    fn verify_return() {
        init();

        let sdk = VnpaySDK::new(config());
        let result = sdk.verify_return(CALLBACK).unwrap();

        assert!(result.is_success());
        assert_eq!(result.amount.value(), 50000);

        let tampered = CALLBACK.replace("vnp_Amount=5000000", "vnp_Amount=5000");
        assert!(matches!(
            sdk.verify_return(&tampered),
            Err(Error::SignatureMismatch)
        ));
    }

    #[test]
    fn verify_return_rejects_other_terminal() {
        let sdk = VnpaySDK::new(
            VnpayConfigBuilder::new("OTHERCODE", "TESTSECRET")
                .with_return_url(RETURN_URL)
                .with_gateway(SANDBOX_GATEWAY)
                .build()
                .unwrap(),
        );

        assert!(matches!(
            sdk.verify_return(CALLBACK),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn handle_ipn() {
        let sdk = VnpaySDK::new(config());

        let rsp = sdk.handle_ipn(CALLBACK, |result| {
            if result.amount.value() != 50000 {
                return IpnResponse::invalid_amount();
            }
            IpnResponse::confirm_success()
        });
        assert_eq!(rsp, IpnResponse::confirm_success());

        let tampered = CALLBACK.replace("vnp_TxnRef=1700000000000", "vnp_TxnRef=1");
        let rsp = sdk.handle_ipn(&tampered, |_| IpnResponse::confirm_success());
        assert_eq!(rsp, IpnResponse::invalid_signature());
    }
}
