use serde_json::json;
use shule_api::modules::payments::gateway::MpesaGateway;
use shule_api::modules::payments::model::{
    CallbackDecision, StkCallbackEnvelope, evaluate_callback,
};

#[test]
fn test_full_callback_envelope_deserializes() {
    let envelope: StkCallbackEnvelope = serde_json::from_value(json!({
        "Body": {
            "stkCallback": {
                "MerchantRequestID": "29115-34620561-1",
                "CheckoutRequestID": "ws_CO_191220191020363925",
                "ResultCode": 0,
                "ResultDesc": "The service request is processed successfully.",
                "CallbackMetadata": {
                    "Item": [
                        {"Name": "Amount", "Value": 1.00},
                        {"Name": "MpesaReceiptNumber", "Value": "NLJ7RT61SV"},
                        {"Name": "TransactionDate", "Value": 20191219102115u64},
                        {"Name": "PhoneNumber", "Value": 254708374149u64}
                    ]
                }
            }
        }
    }))
    .unwrap();

    let callback = envelope.body.stk_callback;
    assert_eq!(callback.merchant_request_id, "29115-34620561-1");

    match evaluate_callback(&callback).unwrap() {
        CallbackDecision::Success(confirmed) => {
            assert_eq!(confirmed.amount, 1.0);
            assert_eq!(confirmed.receipt_number, "NLJ7RT61SV");
            assert_eq!(confirmed.phone, "254708374149");
        }
        other => panic!("expected success decision, got {other:?}"),
    }
}

#[test]
fn test_cancelled_push_yields_failure_decision() {
    let envelope: StkCallbackEnvelope = serde_json::from_value(json!({
        "Body": {
            "stkCallback": {
                "MerchantRequestID": "29115-34620561-2",
                "CheckoutRequestID": "ws_CO_191220191020363926",
                "ResultCode": 1032,
                "ResultDesc": "Request cancelled by user"
            }
        }
    }))
    .unwrap();

    let decision = evaluate_callback(&envelope.body.stk_callback).unwrap();
    assert_eq!(
        decision,
        CallbackDecision::Failure {
            result_code: 1032,
            description: "Request cancelled by user".to_string()
        }
    );
}

#[test]
fn test_phone_is_normalized_before_reaching_the_gateway() {
    assert_eq!(MpesaGateway::normalize_phone("0712345678"), "254712345678");
}
