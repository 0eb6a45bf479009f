//! Table formatting helpers shared by listing commands.

use chrono::{DateTime, Local, Utc};

/// Local wall-clock rendering of a UTC timestamp.
pub fn local_time(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Short "how long ago" rendering.
pub fn ago(ts: &DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - *ts).num_seconds();
    match secs {
        s if s < 0 => "just now".to_string(),
        s if s < 60 => format!("{}s ago", s),
        s if s < 3600 => format!("{}m ago", s / 60),
        s if s < 86_400 => format!("{}h ago", s / 3600),
        s => format!("{}d ago", s / 86_400),
    }
}

/// Truncate to `width` characters, marking the cut with `…`.
pub fn fit(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        value.to_string()
    } else {
        let mut out: String = value.chars().take(width.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}
