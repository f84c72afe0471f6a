//! Alipay-style payment gateway client.
//!
//! Page-pay orders are signed request URLs; asynchronous webhooks are
//! verified against the gateway's published public key over the canonical
//! sorted-parameter string (RSA2 = SHA256 with RSA, PKCS#1 v1.5).

use std::collections::BTreeMap;
use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use rsa::pkcs8::DecodePrivateKey;
use rsa::pkcs8::DecodePublicKey;
use rsa::Pkcs1v15Sign;
use rsa::RsaPrivateKey;
use rsa::RsaPublicKey;
use sha2::Digest;
use sha2::Sha256;
use tracing::warn;

use crate::config::AlipayConfig;
use crate::errors::CrystalPathError;
use crate::Result;

/// Fixed price of the prediction package: 5 CNY buys 2 credits.
pub const PACKAGE_PRICE: f64 = 5.0;
pub const PACKAGE_CREDITS: i64 = 2;

/// Page-pay order data.
#[derive(Debug, Clone)]
pub struct PageOrder {
    pub out_trade_no: String,
    pub total_amount: String,
    pub subject: String,
    pub body: String,
    pub return_url: String,
    pub notify_url: String,
}

/// Gateway client. Keys are optional: without them order creation fails and
/// the caller degrades to a mock payment URL.
pub struct AlipayClient {
    app_id: String,
    gateway: String,
    private_key: Option<RsaPrivateKey>,
    public_key: Option<RsaPublicKey>,
}

impl AlipayClient {
    pub fn new(config: &AlipayConfig) -> Result<Self> {
        let private_key = if config.private_key.is_empty() {
            None
        } else {
            Some(
                RsaPrivateKey::from_pkcs8_pem(&config.private_key)
                    .map_err(|e| CrystalPathError::Config(format!("invalid private key: {e}")))?,
            )
        };

        let public_key = if config.public_key.is_empty() {
            None
        } else {
            Some(
                RsaPublicKey::from_public_key_pem(&config.public_key)
                    .map_err(|e| CrystalPathError::Config(format!("invalid public key: {e}")))?,
            )
        };

        Ok(Self {
            app_id: config.app_id.clone(),
            gateway: config.gateway.clone(),
            private_key,
            public_key,
        })
    }

    #[cfg(test)]
    fn from_keys(private_key: RsaPrivateKey, public_key: RsaPublicKey) -> Self {
        Self {
            app_id: "test-app".to_string(),
            gateway: "https://openapi.alipay.com/gateway.do".to_string(),
            private_key: Some(private_key),
            public_key: Some(public_key),
        }
    }

    /// Build the signed page-pay URL for an order.
    pub fn create_page_pay_url(&self, order: &PageOrder) -> Result<String> {
        let biz_content = serde_json::json!({
            "out_trade_no": order.out_trade_no,
            "total_amount": order.total_amount,
            "subject": order.subject,
            "body": order.body,
            "product_code": "FAST_INSTANT_TRADE_PAY",
            "timeout_express": "10m",
        })
        .to_string();

        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();

        let mut params = BTreeMap::new();
        params.insert("app_id", self.app_id.as_str());
        params.insert("method", "alipay.trade.page.pay");
        params.insert("format", "JSON");
        params.insert("return_url", order.return_url.as_str());
        params.insert("notify_url", order.notify_url.as_str());
        params.insert("charset", "utf-8");
        params.insert("sign_type", "RSA2");
        params.insert("timestamp", timestamp.as_str());
        params.insert("version", "1.0");
        params.insert("biz_content", biz_content.as_str());

        let sign = self.sign(&canonical_string(&params))?;
        params.insert("sign", sign.as_str());

        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in &params {
            serializer.append_pair(key, value);
        }

        Ok(format!("{}?{}", self.gateway, serializer.finish()))
    }

    /// Verify a webhook notification. The signature covers the sorted
    /// `k=v&`-joined parameters, excluding `sign` and `sign_type`.
    pub fn verify_notification(&self, params: &HashMap<String, String>) -> bool {
        let Some(public_key) = &self.public_key else {
            warn!("Payment public key not configured; rejecting notification");
            return false;
        };

        if params.get("sign_type").map(String::as_str) != Some("RSA2") {
            return false;
        }

        let Some(sign) = params.get("sign") else {
            return false;
        };
        let Ok(signature) = BASE64.decode(sign) else {
            return false;
        };

        let sorted: BTreeMap<&str, &str> = params
            .iter()
            .filter(|(k, _)| k.as_str() != "sign" && k.as_str() != "sign_type")
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();

        let digest = Sha256::digest(canonical_string(&sorted).as_bytes());
        public_key
            .verify(Pkcs1v15Sign::new::<Sha256>(), &digest, &signature)
            .is_ok()
    }

    fn sign(&self, content: &str) -> Result<String> {
        let private_key = self
            .private_key
            .as_ref()
            .ok_or_else(|| CrystalPathError::Payment("private key not configured".to_string()))?;

        let digest = Sha256::digest(content.as_bytes());
        let signature = private_key
            .sign(Pkcs1v15Sign::new::<Sha256>(), &digest)
            .map_err(|e| CrystalPathError::Payment(format!("signing failed: {e}")))?;

        Ok(BASE64.encode(signature))
    }
}

/// Sorted `key=value` pairs joined with `&`; empty values are skipped.
fn canonical_string(params: &BTreeMap<&str, &str>) -> String {
    params
        .iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}
