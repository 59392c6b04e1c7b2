use crate::constants::{BYTES_PER_MB, DEFAULT_MAX_DIMENSION, DEFAULT_MAX_SIZE_MB};
use crate::error::{ConvertError, Result};

/// Size and dimension limits applied to every file of a run.
///
/// Built once from the command line and handed to discovery and the pipeline
/// by reference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConversionLimits {
    pub max_size_mb: f64,
    pub max_dimension: u32,
}

impl ConversionLimits {
    pub fn new(max_size_mb: Option<f64>, max_dimension: Option<u32>) -> Result<Self> {
        let max_size_mb = max_size_mb.unwrap_or(DEFAULT_MAX_SIZE_MB);
        if !max_size_mb.is_finite() || max_size_mb <= 0.0 {
            return Err(ConvertError::InvalidLimit(format!(
                "maximum size must be a positive number of megabytes, got {}",
                max_size_mb
            )));
        }

        let max_dimension = max_dimension.unwrap_or(DEFAULT_MAX_DIMENSION);
        if max_dimension == 0 {
            return Err(ConvertError::InvalidLimit(
                "maximum dimension must be at least 1 pixel".to_string(),
            ));
        }

        Ok(Self {
            max_size_mb,
            max_dimension,
        })
    }

    /// Byte budget for a single output file: `floor(MB * 1024 * 1024)`.
    pub fn budget_bytes(&self) -> u64 {
        (self.max_size_mb * BYTES_PER_MB).floor() as u64
    }
}

impl Default for ConversionLimits {
    fn default() -> Self {
        Self {
            max_size_mb: DEFAULT_MAX_SIZE_MB,
            max_dimension: DEFAULT_MAX_DIMENSION,
        }
    }
}

/// Parses a size limit such as `7.5`, `7.5MB` or `12mb`.
pub fn parse_size_mb(input: &str) -> Result<f64> {
    let trimmed = input.trim();
    let number = strip_suffix_ignore_case(trimmed, "mb").unwrap_or(trimmed).trim();
    let value: f64 = number
        .parse()
        .map_err(|_| ConvertError::InvalidLimit(format!("'{}' is not a size in MB", input)))?;
    if !value.is_finite() || value <= 0.0 {
        return Err(ConvertError::InvalidLimit(format!(
            "'{}' must be greater than zero",
            input
        )));
    }
    Ok(value)
}

/// Parses a dimension limit such as `7500` or `2000px`.
pub fn parse_dimension(input: &str) -> Result<u32> {
    let trimmed = input.trim();
    let number = strip_suffix_ignore_case(trimmed, "px").unwrap_or(trimmed).trim();
    let value: u32 = number.parse().map_err(|_| {
        ConvertError::InvalidLimit(format!("'{}' is not a pixel dimension", input))
    })?;
    if value == 0 {
        return Err(ConvertError::InvalidLimit(format!(
            "'{}' must be at least 1 pixel",
            input
        )));
    }
    Ok(value)
}

fn strip_suffix_ignore_case<'a>(value: &'a str, suffix: &str) -> Option<&'a str> {
    let split = value.len().checked_sub(suffix.len())?;
    if !value.is_char_boundary(split) {
        return None;
    }
    let (head, tail) = value.split_at(split);
    tail.eq_ignore_ascii_case(suffix).then_some(head)
}
