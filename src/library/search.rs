use super::model::Track;

/// Case-insensitive substring match on title, artist or album.
/// A blank query matches every track.
pub fn matches_query(track: &Track, query: &str) -> bool {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return true;
    }

    std::iter::once(Some(track.title.as_str()))
        .chain([track.artist.as_deref(), track.album.as_deref()])
        .flatten()
        .any(|field| field.to_lowercase().contains(&query))
}

/// The filtered view of `tracks`, preserving library order.
pub fn filter_tracks(tracks: &[Track], query: &str) -> Vec<Track> {
    tracks
        .iter()
        .filter(|t| matches_query(t, query))
        .cloned()
        .collect()
}
