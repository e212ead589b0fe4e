use crate::config::TrackDisplayField;

use super::model::Track;

/// Label for `track`: the non-empty values of `fields` joined by `sep`, or
/// the title when none of them has a value.
pub fn track_label(track: &Track, fields: &[TrackDisplayField], sep: &str) -> String {
    let parts: Vec<String> = fields
        .iter()
        .filter_map(|field| field_value(track, *field))
        .collect();
    if parts.is_empty() {
        track.title.clone()
    } else {
        parts.join(sep)
    }
}

fn field_value(track: &Track, field: TrackDisplayField) -> Option<String> {
    let value = match field {
        TrackDisplayField::Title => Some(track.title.as_str()),
        TrackDisplayField::Artist => track.artist.as_deref(),
        TrackDisplayField::Album => track.album.as_deref(),
        TrackDisplayField::Filename => track.path.file_stem().and_then(|s| s.to_str()),
        TrackDisplayField::Path => return Some(track.path.display().to_string()),
    };
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Format a duration in seconds as `m:ss`.
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}
