use crate::errors::CurveError;

/// Validate a strictly positive, finite amount.
pub fn ensure_positive(name: &str, value: f64) -> Result<(), CurveError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(CurveError::InvalidParameter(format!(
            "{name} must be a positive finite number, got {value}"
        )));
    }
    Ok(())
}

/// Validate a non-negative, finite amount.
pub fn ensure_non_negative(name: &str, value: f64) -> Result<(), CurveError> {
    if !value.is_finite() || value < 0.0 {
        return Err(CurveError::InvalidParameter(format!(
            "{name} must be a non-negative finite number, got {value}"
        )));
    }
    Ok(())
}
