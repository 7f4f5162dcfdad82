use std::net::{IpAddr, SocketAddr};

use hmac::{Hmac, Mac};
use sha2::Sha512;

use crate::error::{Error, VnpayResult};

type HmacSha512 = Hmac<Sha512>;

/// 无法取得客户端地址时使用的默认值
pub const DEFAULT_IP_ADDR: &str = "127.0.0.1";

/// 生成待签名字符串。
///
/// 按 key 的 ASCII 顺序排序后拼接为 `key=value&key=value`，value 不做 url 编码。
/// 发起支付和回调验签都必须走这一个函数，否则两边算出的签名会不一致。
pub fn canonicalize<'a, I>(params: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut pairs = params.into_iter().collect::<Vec<(&str, &str)>>();
    pairs.sort_by(|a, b| a.0.cmp(b.0));

    pairs
        .iter()
        .map(|(k, v)| {
            trace!("key={} value={}({})", k, v, v.len());
            format!("{}={}", k, v)
        })
        .collect::<Vec<String>>()
        .join("&")
}

fn new_mac(secret: &str) -> VnpayResult<HmacSha512> {
    HmacSha512::new_from_slice(secret.as_bytes()).map_err(|e| {
        error!("init hmac failed: {}", e);
        Error::InvalidConfiguration(e.to_string())
    })
}

/// HMAC-SHA512 签名，返回小写十六进制字符串
pub fn sign_with_hmac(secret: &str, sign_str: &str) -> VnpayResult<String> {
    let mut mac = new_mac(secret)?;
    mac.update(sign_str.as_bytes());

    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// 验签。
///
/// `secure_hash` 是网关传回的十六进制签名，大小写均可；比较为常量时间
pub fn verify_with_hmac(secret: &str, sign_str: &str, secure_hash: &str) -> VnpayResult<()> {
    let expected = hex::decode(secure_hash.trim()).map_err(|e| {
        warn!("secure hash is not valid hex: {}", e);
        Error::SignatureMismatch
    })?;

    let mut mac = new_mac(secret)?;
    mac.update(sign_str.as_bytes());

    mac.verify_slice(&expected).map_err(|_| {
        warn!("secure hash mismatch, sign str: {}", sign_str);
        Error::SignatureMismatch
    })
}

/// 解析 IP，允许带端口（`203.0.113.7:443`、`[::1]:443`）
pub fn parse_ip(s: &str) -> Option<IpAddr> {
    let s = s.trim();

    s.parse::<IpAddr>()
        .ok()
        .or_else(|| s.parse::<SocketAddr>().ok().map(|addr| addr.ip()))
}

/// 取客户端 IP：优先 `X-Forwarded-For` 的第一个地址，其次是连接的远端地址。
/// 两者都不是合法 IP 时使用默认值
pub fn client_ip(forwarded_for: Option<&str>, remote_addr: Option<&str>) -> String {
    let forwarded = forwarded_for
        .and_then(|v| v.split(',').next())
        .and_then(parse_ip);

    let remote = remote_addr.and_then(parse_ip);

    match forwarded.or(remote) {
        Some(ip) => ip.to_string(),
        None => {
            debug!("no valid client ip, use {}", DEFAULT_IP_ADDR);
            DEFAULT_IP_ADDR.to_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::error::Error;

    use super::{canonicalize, client_ip, parse_ip, sign_with_hmac, verify_with_hmac};

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn canonicalize_sorts_keys() {
        init();

        let a = canonicalize(vec![("vnp_TxnRef", "1"), ("vnp_Amount", "100"), ("vnp_Command", "pay")]);
        let b = canonicalize(vec![("vnp_Command", "pay"), ("vnp_TxnRef", "1"), ("vnp_Amount", "100")]);

        assert_eq!(a, "vnp_Amount=100&vnp_Command=pay&vnp_TxnRef=1");
        assert_eq!(a, b);
    }

    #[test]
    fn canonicalize_does_not_encode() {
        let s = canonicalize(vec![
            ("vnp_OrderInfo", "Thanh toan cho ma GD:1"),
            ("vnp_ReturnUrl", "http://localhost:3000/return?a=b"),
        ]);

        assert_eq!(
            s,
            "vnp_OrderInfo=Thanh toan cho ma GD:1&vnp_ReturnUrl=http://localhost:3000/return?a=b"
        );
    }

    #[test]
    fn canonicalize_is_ascii_ordered() {
        // 大写字母排在小写字母之前
        let s = canonicalize(vec![("vnp_a", "1"), ("vnp_B", "2")]);

        assert_eq!(s, "vnp_B=2&vnp_a=1");
    }

    #[test]
    fn sign_and_verify() {
        init();

        let sign = sign_with_hmac("TESTSECRET", "vnp_Amount=100").unwrap();

        assert_eq!(sign.len(), 128);
        assert_eq!(sign, sign.to_lowercase());
        assert!(verify_with_hmac("TESTSECRET", "vnp_Amount=100", &sign).is_ok());
        assert!(verify_with_hmac("TESTSECRET", "vnp_Amount=100", &sign.to_uppercase()).is_ok());

        assert!(matches!(
            verify_with_hmac("TESTSECRET", "vnp_Amount=200", &sign),
            Err(Error::SignatureMismatch)
        ));
        assert!(matches!(
            verify_with_hmac("OTHER", "vnp_Amount=100", &sign),
            Err(Error::SignatureMismatch)
        ));
        assert!(matches!(
            verify_with_hmac("TESTSECRET", "vnp_Amount=100", "not-hex"),
            Err(Error::SignatureMismatch)
        ));
    }

    #[test]
    fn client_ip_fallbacks() {
        assert_eq!(
            client_ip(Some("203.0.113.7, 10.0.0.1"), Some("10.0.0.2")),
            "203.0.113.7"
        );
        assert_eq!(client_ip(Some(" "), Some("10.0.0.2")), "10.0.0.2");
        assert_eq!(client_ip(None, None), "127.0.0.1");
        assert_eq!(client_ip(None, Some("10.0.0.2:51234")), "10.0.0.2");
        assert_eq!(client_ip(Some("2001:db8::1"), None), "2001:db8::1");
    }

    #[test]
    fn client_ip_rejects_injected_header() {
        assert_eq!(
            client_ip(Some("1.1.1.1&vnp_Amount=1"), Some("10.0.0.2")),
            "10.0.0.2"
        );
        assert_eq!(client_ip(Some("unknown"), Some("not an ip")), "127.0.0.1");

        assert!(parse_ip("1.1.1.1&vnp_Amount=1").is_none());
        assert_eq!(parse_ip("[::1]:443").unwrap().to_string(), "::1");
    }
}
