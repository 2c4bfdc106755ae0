use napi::Result as NapiResult;
use napi_derive::napi;
use serde::Deserialize;

use loancalc_core::amortization::{self, AmortizationInput, EngineConfig};
use loancalc_core::input::LoanRequest;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Decimal-string loan terms as posted by a web form, with an optional
/// engine configuration alongside.
#[derive(Deserialize)]
struct RequestInput {
    #[serde(flatten)]
    request: LoanRequest,
    #[serde(default)]
    config: EngineConfig,
}

fn resolve_request(request_json: &str) -> NapiResult<AmortizationInput> {
    let input: RequestInput = serde_json::from_str(request_json).map_err(to_napi_error)?;
    let loan = input
        .request
        .to_loan_input(&input.config)
        .map_err(to_napi_error)?;
    Ok(AmortizationInput {
        loan,
        config: input.config,
    })
}

// ---------------------------------------------------------------------------
// Integer terms
// ---------------------------------------------------------------------------

#[napi]
pub fn compute_amortization(input_json: String) -> NapiResult<String> {
    let input: AmortizationInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = amortization::compute_amortization(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn monthly_payment(input_json: String) -> NapiResult<String> {
    let input: AmortizationInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = amortization::quote_payment(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Decimal-string terms
// ---------------------------------------------------------------------------

#[napi]
pub fn amortize_request(request_json: String) -> NapiResult<String> {
    let input = resolve_request(&request_json)?;
    let output = amortization::compute_amortization(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
