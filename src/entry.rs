use crate::error::EntryError;
use crate::models::Habit;

/// Checks a value about to be logged against the habit's bounds.
pub fn validate_entry_value(habit: &Habit, value: f64) -> Result<f64, EntryError> {
    if !value.is_finite() {
        return Err(EntryError::NotFinite(value));
    }
    if value < 0.0 {
        return Err(EntryError::Negative(value));
    }
    if habit.is_binary() {
        return if value == 0.0 || value == 1.0 {
            Ok(value)
        } else {
            Err(EntryError::NotBinary(value))
        };
    }
    if let Some(min) = habit.min_value {
        if value < min {
            return Err(EntryError::BelowMinimum { value, min });
        }
    }
    if let Some(max) = habit.max_value {
        if value > max {
            return Err(EntryError::AboveMaximum { value, max });
        }
    }
    Ok(value)
}
