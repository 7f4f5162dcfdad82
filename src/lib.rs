pub mod amount;
pub mod error;
pub mod ipn;
pub mod locale;
pub mod model;
pub mod response_code;
pub mod time;
pub mod txn_ref;
pub mod util;
pub mod vnpay;

#[macro_use]
extern crate log;

pub use amount::Amount;
pub use error::{Error, VnpayResult};
pub use vnpay::{build_payment_url, VnpayConfig, VnpayConfigBuilder, VnpaySDK};
