mod formatting;

pub use formatting::{
    format_scaled_duration,
    format_timestamp,
    not_before,
    scaled_seconds,
    truncate_to_millis,
    PENDING_DISPLAY,
};
