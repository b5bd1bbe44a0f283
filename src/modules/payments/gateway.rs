//! Outbound M-Pesa (Daraja) client: OAuth token exchange and STK push.

use std::time::Duration;

use base64::{Engine as _, engine::general_purpose::STANDARD as base64_engine};
use chrono::Utc;
use reqwest::{Client, header};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::config::mpesa::MpesaConfig;
use crate::utils::errors::AppError;

#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
}

#[derive(Debug, Serialize)]
pub struct StkPushRequest {
    #[serde(rename = "BusinessShortCode")]
    pub business_short_code: String,
    #[serde(rename = "Password")]
    pub password: String,
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
    #[serde(rename = "TransactionType")]
    pub transaction_type: String,
    #[serde(rename = "Amount")]
    pub amount: String,
    #[serde(rename = "PartyA")]
    pub party_a: String,
    #[serde(rename = "PartyB")]
    pub party_b: String,
    #[serde(rename = "PhoneNumber")]
    pub phone_number: String,
    #[serde(rename = "CallBackURL")]
    pub callback_url: String,
    #[serde(rename = "AccountReference")]
    pub account_reference: String,
    #[serde(rename = "TransactionDesc")]
    pub transaction_desc: String,
}

#[derive(Debug, Deserialize)]
pub struct StkPushResponse {
    #[serde(rename = "MerchantRequestID")]
    pub merchant_request_id: String,
    #[serde(rename = "CheckoutRequestID")]
    pub checkout_request_id: String,
    #[serde(rename = "ResponseCode")]
    pub response_code: String,
    #[serde(rename = "ResponseDescription")]
    pub response_description: String,
}

#[derive(Clone, Debug)]
pub struct MpesaGateway {
    config: MpesaConfig,
    client: Client,
}

impl MpesaGateway {
    pub fn new(config: MpesaConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        MpesaGateway { config, client }
    }

    /// Normalizes Kenyan phone numbers to international format without the
    /// leading plus, e.g. "0712345678" becomes "254712345678". Inputs that
    /// match no known shape pass through unchanged.
    pub fn normalize_phone(phone: &str) -> String {
        let phone = phone.trim();
        if phone.starts_with("254") && phone.len() == 12 {
            return phone.to_string();
        }
        if phone.starts_with("07") && phone.len() == 10 {
            return format!("254{}", &phone[1..]);
        }
        if phone.starts_with("7") && phone.len() == 9 {
            return format!("254{phone}");
        }
        phone.to_string()
    }

    /// Lipa na M-Pesa password: base64(shortcode + passkey + timestamp).
    fn stk_password(shortcode: &str, passkey: &str, timestamp: &str) -> String {
        base64_engine.encode(format!("{shortcode}{passkey}{timestamp}"))
    }

    /// Exchanges the consumer key/secret for a short-lived bearer token.
    #[instrument(skip(self))]
    pub async fn authenticate(&self) -> Result<String, AppError> {
        let credentials =
            base64_engine.encode(format!("{}:{}", self.config.consumer_key, self.config.consumer_secret));

        let response = self
            .client
            .get(&self.config.auth_url)
            .header(header::AUTHORIZATION, format!("Basic {credentials}"))
            .send()
            .await
            .map_err(|e| AppError::bad_gateway(anyhow::Error::from(e).context("Gateway token request failed")))?;

        if !response.status().is_success() {
            let status = response.status();
            error!(%status, "Gateway authentication rejected");
            return Err(AppError::bad_gateway(anyhow::anyhow!(
                "Gateway authentication failed with status {status}"
            )));
        }

        let auth: AuthResponse = response.json().await.map_err(|e| {
            AppError::bad_gateway(anyhow::Error::from(e).context("Malformed gateway auth response"))
        })?;

        Ok(auth.access_token)
    }

    /// Submits an STK push. On HTTP 200 the returned `MerchantRequestID` is
    /// the correlation key the asynchronous callback will carry.
    #[instrument(skip(self, token))]
    pub async fn initiate_payment(
        &self,
        token: &str,
        phone: &str,
        amount: f64,
        account_reference: &str,
        description: &str,
    ) -> Result<StkPushResponse, AppError> {
        let formatted_phone = Self::normalize_phone(phone);
        let timestamp = Utc::now().format("%Y%m%d%H%M%S").to_string();
        let password = Self::stk_password(&self.config.shortcode, &self.config.passkey, &timestamp);

        let request = StkPushRequest {
            business_short_code: self.config.shortcode.clone(),
            password,
            timestamp,
            transaction_type: "CustomerPayBillOnline".to_string(),
            amount: format!("{amount}"),
            party_a: formatted_phone.clone(),
            party_b: self.config.shortcode.clone(),
            phone_number: formatted_phone,
            callback_url: self.config.callback_url.clone(),
            account_reference: account_reference.to_string(),
            transaction_desc: description.to_string(),
        };

        let response = self
            .client
            .post(&self.config.stk_url)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::bad_gateway(anyhow::Error::from(e).context("Gateway push request failed")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(%status, body, "STK push rejected");
            return Err(AppError::bad_gateway(anyhow::anyhow!(
                "Payment initiation failed with status {status}"
            )));
        }

        let push: StkPushResponse = response.json().await.map_err(|e| {
            AppError::bad_gateway(anyhow::Error::from(e).context("Malformed gateway push response"))
        })?;

        info!(
            merchant_request_id = %push.merchant_request_id,
            "STK push accepted by gateway"
        );
        Ok(push)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_format_gains_country_code() {
        assert_eq!(MpesaGateway::normalize_phone("0712345678"), "254712345678");
    }

    #[test]
    fn international_format_passes_through() {
        assert_eq!(MpesaGateway::normalize_phone("254712345678"), "254712345678");
    }

    #[test]
    fn bare_subscriber_number_gains_country_code() {
        assert_eq!(MpesaGateway::normalize_phone("712345678"), "254712345678");
    }

    #[test]
    fn whitespace_is_trimmed() {
        assert_eq!(MpesaGateway::normalize_phone(" 0712345678 "), "254712345678");
    }

    #[test]
    fn unrecognized_shapes_pass_through() {
        assert_eq!(MpesaGateway::normalize_phone("+44123456"), "+44123456");
    }

    #[test]
    fn password_is_base64_of_concatenation() {
        let password = MpesaGateway::stk_password("174379", "passkey", "20250830143022");
        let decoded = base64_engine.decode(password).unwrap();
        assert_eq!(decoded, b"174379passkey20250830143022");
    }
}
