use crate::errors::{AnalyticsError, AnalyticsResult};

/// Renders `x * 100` with `decimals` fractional digits.
///
/// Rounds half away from zero. Non-finite input fails with
/// [`AnalyticsError::InvalidNumber`].
pub fn to_percent(x: f64, decimals: usize) -> AnalyticsResult<String> {
    if !x.is_finite() {
        return Err(AnalyticsError::InvalidNumber(format!("{x} is not a percentage")));
    }
    to_fixed(x * 100.0, decimals)
}

/// [`to_percent`] for values that may be absent from a payload.
pub fn to_percent_opt(x: Option<f64>, decimals: usize) -> AnalyticsResult<String> {
    match x {
        Some(value) => to_percent(value, decimals),
        None => Err(AnalyticsError::InvalidNumber("missing value".into())),
    }
}

/// Renders `x` with `decimals` fractional digits, rounding half away from zero.
pub fn to_fixed(x: f64, decimals: usize) -> AnalyticsResult<String> {
    if !x.is_finite() {
        return Err(AnalyticsError::InvalidNumber(format!("{x} is not finite")));
    }
    let exponent = i32::try_from(decimals)
        .map_err(|_| AnalyticsError::InvalidNumber(format!("{decimals} decimals")))?;
    let factor = 10f64.powi(exponent);
    let mut rounded = (x * factor).round() / factor;
    if !rounded.is_finite() {
        // scaling overflowed; the plain rendering is already exact enough
        rounded = x;
    }
    if rounded == 0.0 {
        rounded = 0.0;
    }
    Ok(format!("{rounded:.decimals$}"))
}

/// Divides `numerator` by `denominator`, returning `0.0` when the
/// denominator is zero.
#[must_use]
pub fn safe_divide(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Turns `Days_Since_Last_Purchase` into `Days Since Last Purchase`.
#[must_use]
pub fn humanize_label(name: &str) -> String {
    name.replace('_', " ")
}
