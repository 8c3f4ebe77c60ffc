//! # Rate Code Codec
//!
//! Wire identifier of a chosen shipping option.
//!
//! ## Grammar
//! ```text
//! rate_code     = carrier_code "_" method_code
//! method_code   = [ dynamic_id "-" ] method
//! dynamic_id    = 1*DIGIT
//! method        = "pickupPointDelivery" | "addressDelivery" | "directAddressDelivery"
//! carrier_code  = opaque, must contain "packetery"
//! ```
//!
//! ## Examples
//! ```text
//! packetery_zpoint_pickupPointDelivery     zpoint, no dynamic carrier
//! packetery_dhl_42-addressDelivery         packetery_dhl, dynamic 42
//! ```
//!
//! Carrier codes may themselves contain `_` (`packetery_dhl`), method codes
//! never do, so decoding splits at the **last** `_`. The method code is then
//! split at its last `-`.
//!
//! A malformed code is a hard error: it comes from a stale or tampered
//! checkout request and must not be guessed at.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::method::Method;
use crate::types::CarrierCode;
use crate::RESERVED_CARRIER_MARKER;

/// Decoded rate code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RateCode {
    pub carrier_code: CarrierCode,
    pub dynamic_carrier_id: Option<u32>,
    pub method: Method,
}

impl RateCode {
    pub fn new(carrier_code: CarrierCode, dynamic_carrier_id: Option<u32>, method: Method) -> Self {
        RateCode {
            carrier_code,
            dynamic_carrier_id,
            method,
        }
    }

    pub fn encode(&self) -> String {
        encode(&self.carrier_code, self.dynamic_carrier_id, self.method)
    }
}

/// Serializes `(carrier, dynamic carrier id?, method)`.
///
/// ```rust
/// use packetery_core::{rate_code, CarrierCode, Method};
///
/// let carrier = CarrierCode::new("packetery_dhl").unwrap();
/// assert_eq!(
///     rate_code::encode(&carrier, Some(42), Method::AddressDelivery),
///     "packetery_dhl_42-addressDelivery"
/// );
/// ```
pub fn encode(carrier_code: &CarrierCode, dynamic_carrier_id: Option<u32>, method: Method) -> String {
    match dynamic_carrier_id {
        Some(id) => format!("{carrier_code}_{id}-{method}"),
        None => format!("{carrier_code}_{method}"),
    }
}

/// Parses a rate code, failing with [`CoreError::UnrecognizedRateCode`] on
/// anything outside the grammar.
pub fn decode(code: &str) -> CoreResult<RateCode> {
    let unrecognized = || CoreError::UnrecognizedRateCode(code.to_string());

    let (carrier, method_code) = code.rsplit_once('_').ok_or_else(unrecognized)?;
    if !carrier.contains(RESERVED_CARRIER_MARKER) {
        return Err(unrecognized());
    }
    let carrier_code = CarrierCode::new(carrier).map_err(|_| unrecognized())?;

    let (dynamic_carrier_id, method) = match method_code.rsplit_once('-') {
        Some((id, method)) => (Some(parse_dynamic_id(id).ok_or_else(unrecognized)?), method),
        None => (None, method_code),
    };
    let method = method.parse::<Method>().map_err(|_| unrecognized())?;

    Ok(RateCode {
        carrier_code,
        dynamic_carrier_id,
        method,
    })
}

/// `1*DIGIT`, no sign, fits in `u32`.
fn parse_dynamic_id(raw: &str) -> Option<u32> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

impl fmt::Display for RateCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for RateCode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode(s)
    }
}

impl TryFrom<String> for RateCode {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        decode(&value)
    }
}

impl From<RateCode> for String {
    fn from(code: RateCode) -> Self {
        code.encode()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
