//! Playback: the coordinator, its output seam and the rodio backend.

mod coordinator;
mod output;
mod queue;
mod sink;
mod types;

pub use coordinator::PlaybackCoordinator;
pub use output::{LoadedMedia, SoundOutput};
pub use queue::Queue;
pub(crate) use queue::shuffle_tracks;
pub use sink::RodioOutput;
pub use types::{Phase, PlaybackState, StatusEvent, SubscriptionId};

#[cfg(test)]
pub(crate) mod testing;
