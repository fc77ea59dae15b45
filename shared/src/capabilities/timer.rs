use crux_core::capability::{CapabilityContext, Operation};
use serde::{Deserialize, Serialize};

/// One-shot timer supplied by the shell. The core uses it to bound request
/// lifetimes and to coalesce rapid selector changes.
#[derive(crux_core::macros::Capability)]
pub struct Timer<Ev> {
    context: CapabilityContext<TimerOperation, Ev>,
}

impl<Ev> Timer<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<TimerOperation, Ev>) -> Self {
        Self { context }
    }

    /// Asks the shell to resolve after `millis`; `callback` builds the event
    /// delivered on expiry.
    pub fn notify_after<F>(&self, millis: u64, callback: F)
    where
        F: FnOnce(TimerOutput) -> Ev + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let output = ctx
                .request_from_shell(TimerOperation::NotifyAfter { millis })
                .await;
            ctx.update_app(callback(output));
        });
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum TimerOperation {
    NotifyAfter { millis: u64 },
}

impl Operation for TimerOperation {
    type Output = TimerOutput;
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TimerOutput {
    Elapsed,
}
