//! Attendance factor derivation.

use crate::error::{EngineError, EngineResult};

/// Derives the attendance factor from days present and total days.
///
/// The factor is `days_present / total_days`, capped at 1.0; presence above
/// the expected total never inflates salary, proration only scales down.
///
/// # Errors
///
/// Returns [`EngineError::InvalidAttendance`] when either figure is
/// non-finite, `days_present` is negative, or `total_days` is not positive.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::attendance_factor;
///
/// assert_eq!(attendance_factor(11.0, 22.0).unwrap(), 0.5);
/// assert_eq!(attendance_factor(25.0, 22.0).unwrap(), 1.0);
/// assert!(attendance_factor(10.0, 0.0).is_err());
/// ```
pub fn attendance_factor(days_present: f64, total_days: f64) -> EngineResult<f64> {
    if !days_present.is_finite() || !total_days.is_finite() {
        return Err(EngineError::InvalidAttendance {
            message: format!(
                "attendance figures must be finite, got {days_present} of {total_days}"
            ),
        });
    }
    if total_days <= 0.0 {
        return Err(EngineError::InvalidAttendance {
            message: format!("total days must be positive, got {total_days}"),
        });
    }
    if days_present < 0.0 {
        return Err(EngineError::InvalidAttendance {
            message: format!("days present must not be negative, got {days_present}"),
        });
    }
    Ok((days_present / total_days).min(1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_attendance_is_one() {
        assert_eq!(attendance_factor(22.0, 22.0).unwrap(), 1.0);
    }

    #[test]
    fn test_partial_attendance() {
        assert_eq!(attendance_factor(11.0, 22.0).unwrap(), 0.5);
    }

    #[test]
    fn test_factor_is_capped_at_one() {
        assert_eq!(attendance_factor(30.0, 22.0).unwrap(), 1.0);
    }

    #[test]
    fn test_zero_days_present_is_zero_factor() {
        assert_eq!(attendance_factor(0.0, 22.0).unwrap(), 0.0);
    }

    #[test]
    fn test_non_positive_total_rejected() {
        assert!(matches!(
            attendance_factor(10.0, 0.0),
            Err(EngineError::InvalidAttendance { .. })
        ));
        assert!(matches!(
            attendance_factor(10.0, -5.0),
            Err(EngineError::InvalidAttendance { .. })
        ));
    }

    #[test]
    fn test_negative_days_present_rejected() {
        assert!(matches!(
            attendance_factor(-1.0, 22.0),
            Err(EngineError::InvalidAttendance { .. })
        ));
    }

    #[test]
    fn test_non_finite_inputs_rejected() {
        assert!(attendance_factor(f64::NAN, 22.0).is_err());
        assert!(attendance_factor(10.0, f64::INFINITY).is_err());
    }
}
