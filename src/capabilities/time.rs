use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};

/// Timer requests fulfilled by the shell's clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeOperation {
    DelayMs { ms: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerElapsed;

impl Operation for TimeOperation {
    type Output = TimerElapsed;
}

pub struct Time<E> {
    context: CapabilityContext<TimeOperation, E>,
}

impl<Ev> Capability<Ev> for Time<Ev> {
    type Operation = TimeOperation;
    type MappedSelf<MappedEv> = Time<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static,
    {
        Time::new(self.context.map_event(f))
    }
}

impl<E> Time<E>
where
    E: 'static,
{
    pub fn new(context: CapabilityContext<TimeOperation, E>) -> Self {
        Self { context }
    }

    /// Asks the shell to call back after `ms` milliseconds.
    pub fn delay_ms<F>(&self, ms: u64, callback: F)
    where
        F: Fn(TimerElapsed) -> E + Send + Sync + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let elapsed = ctx.request_from_shell(TimeOperation::DelayMs { ms }).await;
            ctx.update_app(callback(elapsed));
        });
    }
}
