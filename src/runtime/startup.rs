use tracing::info;

use crate::audio::{PlaybackCoordinator, SoundOutput, shuffle_tracks};
use crate::config;
use crate::library::Track;
use crate::runtime::resume::{self, PendingSeek};
use crate::store::KeyValueStore;

/// Apply playback defaults and install the initial queue. A restored
/// snapshot wins over shuffling.
pub fn prepare_queue<O, S>(
    coordinator: &mut PlaybackCoordinator<O>,
    mut tracks: Vec<Track>,
    settings: &config::Settings,
    store: &S,
) -> Option<PendingSeek>
where
    O: SoundOutput,
    S: KeyValueStore + ?Sized,
{
    coordinator.set_looping(settings.playback.loop_track);

    let snapshot = settings
        .playback
        .resume
        .then(|| resume::load(store))
        .flatten()
        .filter(|s| !s.track_ids.is_empty());

    if let Some(snapshot) = snapshot {
        let restored = snapshot.restore(tracks);
        info!(
            tracks = restored.tracks.len(),
            cursor = restored.cursor,
            "restored previous queue"
        );
        coordinator.set_queue(restored.tracks, restored.cursor);
        return restored.seek;
    }

    if settings.playback.shuffle {
        shuffle_tracks(&mut tracks);
    }
    coordinator.set_queue(tracks, 0);
    None
}
