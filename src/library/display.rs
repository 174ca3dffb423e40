use std::path::Path;

/// Build the attribution line from artist and album, skipping blank parts.
pub fn attribution_from(artist: Option<&str>, album: Option<&str>, sep: &str) -> String {
    [artist, album]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(sep)
}

/// Stable identifier for a track: its path relative to the scanned root,
/// with `/` separators regardless of platform.
pub fn track_id(root: &Path, path: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(rel) => rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
        Err(_) => path.display().to_string(),
    }
}
