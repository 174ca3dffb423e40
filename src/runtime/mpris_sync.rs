use crate::audio::{PlaybackCoordinator, SoundOutput, SubscriptionId};
use crate::mpris::MprisHandle;

/// Mirror every coordinator snapshot into the MPRIS shared state.
pub fn attach<O: SoundOutput>(
    coordinator: &mut PlaybackCoordinator<O>,
    mpris: MprisHandle,
) -> SubscriptionId {
    coordinator.subscribe(move |state| mpris.update(state))
}
