//! Field checks shared by the submission payloads.

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
    },
    #[error("{field} must be a non-negative number")]
    Negative { field: &'static str },
    #[error("{field} is required")]
    Missing { field: &'static str },
}

pub(crate) fn check_rating(field: &'static str, value: u8) -> Result<(), ValidationError> {
    if (1..=5).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            field,
            min: 1.0,
            max: 5.0,
        })
    }
}

pub(crate) fn check_range(
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<(), ValidationError> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange { field, min, max })
    }
}

pub(crate) fn check_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ValidationError::Negative { field })
    }
}

pub(crate) fn check_present(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::Missing { field })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratings_stay_on_five_point_scale() {
        assert!(check_rating("rating", 1).is_ok());
        assert!(check_rating("rating", 5).is_ok());
        assert_eq!(
            check_rating("rating", 0),
            Err(ValidationError::OutOfRange {
                field: "rating",
                min: 1.0,
                max: 5.0
            })
        );
    }

    #[test]
    fn non_finite_values_are_rejected() {
        assert!(check_range("coverage", f64::NAN, 0.0, 1.0).is_err());
        assert!(check_non_negative("ping", f64::INFINITY).is_err());
        assert!(check_non_negative("ping", -0.5).is_err());
        assert!(check_non_negative("ping", 0.0).is_ok());
    }

    #[test]
    fn blank_strings_count_as_missing() {
        assert_eq!(
            check_present("name", "   "),
            Err(ValidationError::Missing { field: "name" })
        );
    }
}
