//! Postal code (CEP) validation

use std::fmt;

use crate::{CepWeatherError, Result};

/// Number of digits in a CEP once the separator is removed
pub const POSTAL_CODE_LEN: usize = 8;

/// A CEP reduced to exactly eight ASCII digits
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedPostalCode(String);

impl NormalizedPostalCode {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NormalizedPostalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validate a raw postal code, stripping at most one hyphen.
///
/// `"01310-100"` and `"01310100"` both normalize to `01310100`. Anything that
/// is not eight ASCII digits after the strip is rejected.
pub fn validate(raw: &str) -> Result<NormalizedPostalCode> {
    let code = raw.replacen('-', "", 1);

    if code.is_empty() {
        return Err(CepWeatherError::validation("empty postal code"));
    }
    if code.len() != POSTAL_CODE_LEN {
        return Err(CepWeatherError::validation(format!(
            "expected {POSTAL_CODE_LEN} digits, got {} bytes",
            code.len()
        )));
    }
    if !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CepWeatherError::validation("postal code must be numeric"));
    }

    Ok(NormalizedPostalCode(code))
}
