use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum EntryError {
    #[error("value {0} is not a finite number")]
    NotFinite(f64),

    #[error("value {0} is negative")]
    Negative(f64),

    #[error("binary habits accept only 0 or 1, got {0}")]
    NotBinary(f64),

    #[error("value {value} is below the minimum of {min}")]
    BelowMinimum { value: f64, min: f64 },

    #[error("value {value} is above the maximum of {max}")]
    AboveMaximum { value: f64, max: f64 },
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("utc offset of {0} minutes is out of range")]
    OffsetOutOfRange(i32),
}
