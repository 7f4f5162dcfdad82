use serde::{Deserialize, Serialize};

/// 支付页面的语言
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locale {
    /// 越南语
    #[serde(rename = "vn")]
    Vn,
    /// 英语
    #[serde(rename = "en")]
    En,
}

impl Default for Locale {
    fn default() -> Self {
        Locale::Vn
    }
}

impl Locale {
    pub fn as_str(&self) -> &str {
        match self {
            Locale::Vn => "vn",
            Locale::En => "en",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "en" => Locale::En,
            _ => Locale::Vn,
        }
    }
}
