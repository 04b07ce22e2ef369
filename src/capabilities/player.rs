use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};

/// Commands for the shell's media engine.
///
/// These are fire and forget: the engine reports back through its own
/// events (state changes, time updates, metadata), which the shell feeds
/// into `update` directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlayerOperation {
    Play,
    Pause,
    SeekTo { seconds: f64 },
}

impl Operation for PlayerOperation {
    type Output = ();
}

pub struct Player<E> {
    context: CapabilityContext<PlayerOperation, E>,
}

impl<Ev> Capability<Ev> for Player<Ev> {
    type Operation = PlayerOperation;
    type MappedSelf<MappedEv> = Player<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static,
    {
        Player::new(self.context.map_event(f))
    }
}

impl<E> Player<E>
where
    E: 'static,
{
    pub fn new(context: CapabilityContext<PlayerOperation, E>) -> Self {
        Self { context }
    }

    pub fn play(&self) {
        self.notify(PlayerOperation::Play);
    }

    pub fn pause(&self) {
        self.notify(PlayerOperation::Pause);
    }

    pub fn seek_to(&self, seconds: f64) {
        self.notify(PlayerOperation::SeekTo { seconds });
    }

    fn notify(&self, operation: PlayerOperation) {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            ctx.notify_shell(operation).await;
        });
    }
}
