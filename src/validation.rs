//! Input validation
//!
//! Absolute URL checks for configured base URLs and NHS number checks for
//! patient identifiers. Both run before any network I/O.

use crate::error::{Error, NhsNumberError, Result, UrlError};
use url::Url;

/// Length of an NHS number
pub const NHS_NUMBER_LEN: usize = 10;

/// Check that `input` is an absolute URL with both a scheme and a host
pub fn validate_absolute_url(input: &str) -> std::result::Result<Url, UrlError> {
    let url = Url::parse(input).map_err(|e| match e {
        url::ParseError::RelativeUrlWithoutBase => UrlError::SchemeMissing,
        url::ParseError::EmptyHost => UrlError::HostMissing,
        other => UrlError::Parse(other),
    })?;

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::HostMissing);
    }
    Ok(url)
}

/// Validate an NHS number: 10 digits with a modulus 11 check digit
///
/// The first nine digits are weighted 10 down to 2. The check digit is
/// `11 - (sum % 11)`, where 11 maps to 0 and 10 is never valid.
pub fn validate_nhs_number(value: &str) -> Result<()> {
    check_nhs_number(value).map_err(|reason| Error::InvalidNhsNumber {
        value: value.to_string(),
        reason,
    })
}

fn check_nhs_number(value: &str) -> std::result::Result<(), NhsNumberError> {
    if value.len() != NHS_NUMBER_LEN {
        return Err(NhsNumberError::Length);
    }

    let digits: Vec<u32> = value
        .chars()
        .map(|c| c.to_digit(10))
        .collect::<Option<_>>()
        .ok_or(NhsNumberError::NonDigit)?;

    let sum: u32 = digits[..9]
        .iter()
        .zip((2..=10).rev())
        .map(|(d, weight)| d * weight)
        .sum();

    let check = match 11 - (sum % 11) {
        11 => 0,
        10 => return Err(NhsNumberError::Checksum),
        n => n,
    };

    if check == digits[9] {
        Ok(())
    } else {
        Err(NhsNumberError::Checksum)
    }
}
