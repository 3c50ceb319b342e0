//! # Action dispatcher: forwarding control requests to the BMC.
//!
//! One attempt per call, no retries: a repeated toggle is not idempotent,
//! so the error goes back to the caller verbatim and the caller decides.
//! A success feeds the scheduler so it can open the burst window and
//! re-fetch the categories the action touched.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::actions::Action;
use crate::error::FetchError;
use crate::events::{Bus, Event, EventKind};
use crate::fetcher::Fetcher;

use super::scheduler::Command;

/// Forwards [`Action`]s to the fetcher's command surface.
pub(crate) struct ActionDispatcher {
    fetcher: Arc<dyn Fetcher>,
    bus: Bus,
    commands: mpsc::Sender<Command>,
}

impl ActionDispatcher {
    pub(crate) fn new(
        fetcher: Arc<dyn Fetcher>,
        bus: Bus,
        commands: mpsc::Sender<Command>,
    ) -> Self {
        Self {
            fetcher,
            bus,
            commands,
        }
    }

    /// Executes one action.
    ///
    /// On success, publishes `ActionDispatched` and tells the scheduler to
    /// open the burst window and force the affected burst-eligible
    /// categories due. On failure, publishes `ActionFailed` and returns the
    /// fetcher's error unchanged; polling cadence is not touched.
    pub(crate) async fn dispatch(&self, action: Action) -> Result<(), FetchError> {
        let label = action.as_label();
        match self.fetcher.invoke_command(&action).await {
            Ok(()) => {
                self.bus
                    .publish(Event::new(EventKind::ActionDispatched).with_action(label));
                let _ = self
                    .commands
                    .send(Command::ActionSucceeded {
                        action: label,
                        affected: action.affected_categories(),
                    })
                    .await;
                Ok(())
            }
            Err(err) => {
                self.bus.publish(
                    Event::new(EventKind::ActionFailed)
                        .with_action(label)
                        .with_reason(err.to_string()),
                );
                Err(err)
            }
        }
    }
}
