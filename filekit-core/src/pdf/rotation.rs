use super::PdfError;

/// Map any angle into `[0, 360)`.
pub fn normalize_rotation(degrees: i64) -> i64 {
    degrees.rem_euclid(360)
}

/// Rotation stored on a page after adding `delta` to its current rotation.
pub fn apply_rotation(existing: i64, delta: i64) -> i64 {
    normalize_rotation(normalize_rotation(existing) + normalize_rotation(delta))
}

/// Page rotations must be multiples of 90 degrees.
pub fn validate_quarter_turn(degrees: i64) -> Result<i64, PdfError> {
    if degrees % 90 == 0 {
        Ok(degrees)
    } else {
        Err(PdfError::InvalidRotation(degrees))
    }
}
