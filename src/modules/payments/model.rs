use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// One initiated mobile-money payment attempt. Created "pending" before the
/// gateway is called and finalized exactly once by the callback handler.
#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq, ToSchema)]
pub struct Transaction {
    pub id: Uuid,
    /// Locally generated audit reference, assigned before the gateway call.
    pub reference: String,
    /// "pending", "success", or the gateway's failure description.
    pub status: String,
    pub phone: String,
    pub amount: f64,
    pub trans_date: DateTime<Utc>,
    pub mpesa_receipt_number: Option<String>,
    pub payer_names: Option<String>,
    pub user_id: Uuid,
    pub student_id: Uuid,
    pub description: Option<String>,
    /// Gateway-assigned correlation key. The only handle the async callback
    /// can use to find this row.
    pub merchant_request_id: Option<String>,
    pub payment_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    Pending,
    Success,
    Failed,
}

impl TransactionStatus {
    /// Classifies a stored status string. Anything that is neither "pending"
    /// nor "success" is a gateway failure description.
    pub fn classify(status: &str) -> Self {
        match status {
            "pending" => TransactionStatus::Pending,
            "success" => TransactionStatus::Success,
            _ => TransactionStatus::Failed,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionStatus::Pending)
    }
}

impl Transaction {
    pub fn status(&self) -> TransactionStatus {
        TransactionStatus::classify(&self.status)
    }
}

#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq, ToSchema)]
pub struct Payment {
    pub id: Uuid,
    pub student_id: Uuid,
    pub amount: f64,
    pub payment_date: DateTime<Utc>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Deserialize, Debug, Clone, Validate, ToSchema)]
pub struct NewMpesaPaymentDto {
    #[validate(length(min = 9, max = 15))]
    pub phone: String,
    #[validate(range(exclusive_min = 0.0))]
    pub amount: f64,
    pub student_id: Uuid,
    pub description: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Validate, ToSchema)]
pub struct SelfServicePaymentDto {
    pub amount: f64,
    pub description: Option<String>,
}

/// Admin-recorded payment, e.g. a bank slip keyed in at the front office.
#[derive(Deserialize, Debug, Clone, Validate, ToSchema)]
pub struct RecordPaymentDto {
    pub student_id: Uuid,
    #[validate(range(exclusive_min = 0.0))]
    pub amount: f64,
    pub description: Option<String>,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct InitiatePaymentResponse {
    pub success: bool,
    pub message: String,
    #[serde(rename = "transactionId")]
    pub transaction_id: Uuid,
}

// ---------------------------------------------------------------------------
// Gateway callback payload (Daraja STK push result envelope).
// ---------------------------------------------------------------------------

#[derive(Deserialize, Debug, Clone, ToSchema)]
pub struct StkCallbackEnvelope {
    #[serde(rename = "Body")]
    pub body: CallbackBody,
}

#[derive(Deserialize, Debug, Clone, ToSchema)]
pub struct CallbackBody {
    #[serde(rename = "stkCallback")]
    pub stk_callback: StkCallback,
}

#[derive(Deserialize, Debug, Clone, ToSchema)]
pub struct StkCallback {
    #[serde(rename = "MerchantRequestID")]
    pub merchant_request_id: String,
    #[serde(rename = "CheckoutRequestID")]
    pub checkout_request_id: String,
    #[serde(rename = "ResultCode")]
    pub result_code: i64,
    #[serde(rename = "ResultDesc")]
    pub result_desc: String,
    #[serde(rename = "CallbackMetadata")]
    pub callback_metadata: Option<CallbackMetadata>,
}

#[derive(Deserialize, Debug, Clone, ToSchema)]
pub struct CallbackMetadata {
    #[serde(rename = "Item")]
    pub item: Vec<CallbackItem>,
}

/// Metadata entries arrive as loosely typed name/value pairs; numbers and
/// strings are both seen in the wild for the same field.
#[derive(Deserialize, Debug, Clone, ToSchema)]
pub struct CallbackItem {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Value")]
    pub value: Option<serde_json::Value>,
}

/// The fields a successful callback must carry before any state is mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmedPayment {
    pub amount: f64,
    pub receipt_number: String,
    pub phone: String,
    pub trans_date: DateTime<Utc>,
    pub payer_names: Option<String>,
}

/// What the callback handler should do with a given payload.
#[derive(Debug, Clone, PartialEq)]
pub enum CallbackDecision {
    Success(ConfirmedPayment),
    Failure { result_code: i64, description: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackPayloadError {
    MissingMetadata,
    MissingField(&'static str),
    MalformedField(&'static str),
}

impl CallbackPayloadError {
    pub fn message(&self) -> String {
        match self {
            CallbackPayloadError::MissingMetadata => {
                "Callback metadata is missing from a success result".to_string()
            }
            CallbackPayloadError::MissingField(name) => {
                format!("Callback metadata is missing the {name} field")
            }
            CallbackPayloadError::MalformedField(name) => {
                format!("Callback metadata field {name} could not be parsed")
            }
        }
    }
}

/// Pure evaluation of a callback payload. No state is touched here; the
/// handler decides what to persist based on the returned decision.
pub fn evaluate_callback(callback: &StkCallback) -> Result<CallbackDecision, CallbackPayloadError> {
    if callback.result_code != 0 {
        return Ok(CallbackDecision::Failure {
            result_code: callback.result_code,
            description: callback.result_desc.clone(),
        });
    }

    let metadata = callback
        .callback_metadata
        .as_ref()
        .ok_or(CallbackPayloadError::MissingMetadata)?;

    let amount = metadata
        .number("Amount")
        .ok_or(CallbackPayloadError::MissingField("Amount"))?;
    let receipt_number = metadata
        .text("MpesaReceiptNumber")
        .ok_or(CallbackPayloadError::MissingField("MpesaReceiptNumber"))?;
    let phone = metadata
        .text("PhoneNumber")
        .ok_or(CallbackPayloadError::MissingField("PhoneNumber"))?;
    let trans_date = metadata
        .text("TransactionDate")
        .ok_or(CallbackPayloadError::MissingField("TransactionDate"))
        .and_then(|raw| {
            NaiveDateTime::parse_from_str(&raw, "%Y%m%d%H%M%S")
                .map(|dt| dt.and_utc())
                .map_err(|_| CallbackPayloadError::MalformedField("TransactionDate"))
        })?;

    let payer_names = [
        metadata.text("FirstName"),
        metadata.text("MiddleName"),
        metadata.text("LastName"),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(" ");
    let payer_names = (!payer_names.is_empty()).then_some(payer_names);

    Ok(CallbackDecision::Success(ConfirmedPayment {
        amount,
        receipt_number,
        phone,
        trans_date,
        payer_names,
    }))
}

impl CallbackMetadata {
    fn value(&self, name: &str) -> Option<&serde_json::Value> {
        self.item
            .iter()
            .find(|item| item.name == name)
            .and_then(|item| item.value.as_ref())
    }

    /// Numbers and numeric strings are both accepted.
    fn number(&self, name: &str) -> Option<f64> {
        match self.value(name)? {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Strings and bare numbers are both rendered as text.
    fn text(&self, name: &str) -> Option<String> {
        match self.value(name)? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn success_callback() -> StkCallback {
        serde_json::from_value(json!({
            "MerchantRequestID": "29115-34620561-1",
            "CheckoutRequestID": "ws_CO_191220191020363925",
            "ResultCode": 0,
            "ResultDesc": "The service request is processed successfully.",
            "CallbackMetadata": {
                "Item": [
                    {"Name": "Amount", "Value": 10000.0},
                    {"Name": "MpesaReceiptNumber", "Value": "NLJ7RT61SV"},
                    {"Name": "TransactionDate", "Value": 20250830143022u64},
                    {"Name": "PhoneNumber", "Value": 254712345678u64}
                ]
            }
        }))
        .unwrap()
    }

    #[test]
    fn success_result_yields_confirmed_payment() {
        let decision = evaluate_callback(&success_callback()).unwrap();
        match decision {
            CallbackDecision::Success(confirmed) => {
                assert_eq!(confirmed.amount, 10000.0);
                assert_eq!(confirmed.receipt_number, "NLJ7RT61SV");
                assert_eq!(confirmed.phone, "254712345678");
                assert_eq!(
                    confirmed.trans_date.format("%Y%m%d%H%M%S").to_string(),
                    "20250830143022"
                );
                assert_eq!(confirmed.payer_names, None);
            }
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[test]
    fn failure_result_carries_description() {
        let callback: StkCallback = serde_json::from_value(json!({
            "MerchantRequestID": "29115-34620561-1",
            "CheckoutRequestID": "ws_CO_191220191020363925",
            "ResultCode": 1032,
            "ResultDesc": "Request cancelled by user"
        }))
        .unwrap();

        let decision = evaluate_callback(&callback).unwrap();
        assert_eq!(
            decision,
            CallbackDecision::Failure {
                result_code: 1032,
                description: "Request cancelled by user".to_string()
            }
        );
    }

    #[test]
    fn success_without_metadata_is_rejected() {
        let mut callback = success_callback();
        callback.callback_metadata = None;
        assert_eq!(
            evaluate_callback(&callback),
            Err(CallbackPayloadError::MissingMetadata)
        );
    }

    #[test]
    fn success_missing_receipt_is_rejected() {
        let mut callback = success_callback();
        callback
            .callback_metadata
            .as_mut()
            .unwrap()
            .item
            .retain(|item| item.name != "MpesaReceiptNumber");
        assert_eq!(
            evaluate_callback(&callback),
            Err(CallbackPayloadError::MissingField("MpesaReceiptNumber"))
        );
    }

    #[test]
    fn unparseable_transaction_date_is_rejected() {
        let mut callback = success_callback();
        for item in &mut callback.callback_metadata.as_mut().unwrap().item {
            if item.name == "TransactionDate" {
                item.value = Some(json!("not-a-date"));
            }
        }
        assert_eq!(
            evaluate_callback(&callback),
            Err(CallbackPayloadError::MalformedField("TransactionDate"))
        );
    }

    #[test]
    fn string_valued_amount_is_accepted() {
        let mut callback = success_callback();
        for item in &mut callback.callback_metadata.as_mut().unwrap().item {
            if item.name == "Amount" {
                item.value = Some(json!("10000"));
            }
        }
        match evaluate_callback(&callback).unwrap() {
            CallbackDecision::Success(confirmed) => assert_eq!(confirmed.amount, 10000.0),
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[test]
    fn payer_name_items_are_joined() {
        let mut callback = success_callback();
        let items = &mut callback.callback_metadata.as_mut().unwrap().item;
        items.push(CallbackItem {
            name: "FirstName".to_string(),
            value: Some(json!("John")),
        });
        items.push(CallbackItem {
            name: "LastName".to_string(),
            value: Some(json!("Doe")),
        });
        match evaluate_callback(&callback).unwrap() {
            CallbackDecision::Success(confirmed) => {
                assert_eq!(confirmed.payer_names.as_deref(), Some("John Doe"));
            }
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[test]
    fn status_classification() {
        assert_eq!(
            TransactionStatus::classify("pending"),
            TransactionStatus::Pending
        );
        assert_eq!(
            TransactionStatus::classify("success"),
            TransactionStatus::Success
        );
        assert_eq!(
            TransactionStatus::classify("Request cancelled by user"),
            TransactionStatus::Failed
        );
        assert!(!TransactionStatus::Pending.is_terminal());
        assert!(TransactionStatus::Success.is_terminal());
        assert!(TransactionStatus::Failed.is_terminal());
    }
}
