use std::collections::HashMap;
use std::path::{Path, PathBuf};

use lofty::file::{AudioFile, TaggedFileExt};
use lofty::tag::Accessor;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::LibrarySettings;

use super::display::{attribution_from, track_id};
use super::model::{MediaSource, Track};

fn is_audio_file(path: &Path, settings: &LibrarySettings) -> bool {
    let exts: Vec<String> = settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| e == &ext)
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// First file in `dir` whose name matches one of `names`, in `names` order.
fn find_artwork(dir: &Path, names: &[String]) -> Option<PathBuf> {
    let entries: Vec<PathBuf> = std::fs::read_dir(dir)
        .ok()?
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();

    names.iter().find_map(|wanted| {
        entries
            .iter()
            .find(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.eq_ignore_ascii_case(wanted))
            })
            .cloned()
    })
}

/// Case-insensitive by attribution, then name. Untagged tracks come first.
fn sort_tracks(tracks: &mut [Track]) {
    tracks.sort_by_key(|t| (t.attribution.to_lowercase(), t.name.to_lowercase()));
}

pub fn scan(dir: &Path, settings: &LibrarySettings) -> Vec<Track> {
    let mut tracks: Vec<Track> = Vec::new();
    let mut artwork_cache: HashMap<PathBuf, Option<String>> = HashMap::new();

    let mut walker = WalkDir::new(dir).follow_links(settings.follow_links);

    // Non-recursive = only the root directory.
    let depth_cap = if settings.recursive {
        settings.max_depth
    } else {
        Some(1)
    };
    if let Some(d) = depth_cap {
        walker = walker.max_depth(d);
    }

    for entry in walker
        .into_iter()
        .filter_entry(|e| settings.include_hidden || e.depth() == 0 || !is_hidden(e.path()))
        .filter_map(Result::ok)
    {
        let path = entry.path();
        if !(path.is_file()
            && (settings.include_hidden || !is_hidden(path))
            && is_audio_file(path, settings))
        {
            continue;
        }

        let mut name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("UNKNOWN")
            .to_string();
        let mut artist: Option<String> = None;
        let mut album: Option<String> = None;
        let mut duration_ms: u64 = 0;

        match lofty::read_from_path(path) {
            Ok(tagged) => {
                duration_ms = tagged.properties().duration().as_millis() as u64;

                if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
                    if let Some(v) = tag.title().filter(|v| !v.trim().is_empty()) {
                        name = v.trim().to_string();
                    }
                    artist = tag.artist().map(|v| v.trim().to_string());
                    album = tag.album().map(|v| v.trim().to_string());
                }
            }
            Err(e) => debug!(path = %path.display(), error = %e, "no readable tags"),
        }

        let artwork = match path.parent() {
            Some(parent) => artwork_cache
                .entry(parent.to_path_buf())
                .or_insert_with(|| {
                    find_artwork(parent, &settings.artwork_names)
                        .map(|p| p.display().to_string())
                })
                .clone(),
            None => None,
        };

        tracks.push(Track {
            id: track_id(dir, path),
            name,
            attribution: attribution_from(
                artist.as_deref(),
                album.as_deref(),
                &settings.attribution_separator,
            ),
            artwork,
            source: MediaSource::from_path(path),
            duration_ms,
        });
    }

    sort_tracks(&mut tracks);
    info!(count = tracks.len(), dir = %dir.display(), "library scanned");
    tracks
}
