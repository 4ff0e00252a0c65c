//! Configuration validation

use crate::schema::RawConfig;
use thiserror::Error;

/// Upper bound on the house count; anything larger is a typo.
pub const MAX_TOTAL_HOUSES: usize = 4096;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("timers.{field}: {message}")]
    TimerError { field: String, message: String },

    #[error("Preview alert at {preview}s >= initial duration {duration}s")]
    PreviewExceedsDuration { preview: i64, duration: i64 },

    #[error("Overtime alert offsets must be positive and strictly ascending, got {0:?}")]
    BadOvertimeOffsets(Vec<i64>),

    #[error("Global config error: {0}")]
    GlobalError(String),
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let timers = &config.timers;

    if let Some(total) = timers.total_houses {
        if total == 0 {
            errors.push(timer_error("total_houses", "must be at least 1"));
        } else if total > MAX_TOTAL_HOUSES {
            errors.push(timer_error(
                "total_houses",
                format!("must be at most {}", MAX_TOTAL_HOUSES),
            ));
        }
    }

    let duration = timers
        .initial_duration_seconds
        .unwrap_or(crate::DEFAULT_INITIAL_DURATION_SECONDS);
    if duration <= 0 {
        errors.push(timer_error(
            "initial_duration_seconds",
            "must be positive",
        ));
    }

    let preview = timers
        .preview_alert_seconds
        .unwrap_or(crate::DEFAULT_PREVIEW_ALERT_SECONDS);
    if preview <= 0 {
        errors.push(timer_error("preview_alert_seconds", "must be positive"));
    } else if duration > 0 && preview >= duration {
        errors.push(ValidationError::PreviewExceedsDuration {
            preview,
            duration,
        });
    }

    if let Some(offsets) = &timers.overtime_alert_offsets {
        let ascending = offsets.windows(2).all(|w| w[0] < w[1]);
        let positive = offsets.iter().all(|&o| o > 0);
        if !ascending || !positive {
            errors.push(ValidationError::BadOvertimeOffsets(offsets.clone()));
        }
    }

    if let Some(ceiling) = timers.negative_ceiling_seconds {
        if ceiling <= 0 {
            errors.push(timer_error(
                "negative_ceiling_seconds",
                "must be positive when set (omit it to disable)",
            ));
        }
    }

    errors
}

fn timer_error(field: &str, message: impl Into<String>) -> ValidationError {
    ValidationError::TimerError {
        field: field.to_string(),
        message: message.into(),
    }
}
