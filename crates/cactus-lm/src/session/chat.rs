//! Completion with incremental history and token streaming.

use tracing::{debug, warn};

use crate::history::Reconciliation;
use crate::streaming::{CompletionOutput, EventForwarder, EventSender};
use crate::{CompletionParams, Message, SessionError};

use super::manager::Session;

impl Session {
    /// Run a completion over the caller's full conversation.
    ///
    /// Only messages the engine has not seen are sent. If `messages` no
    /// longer extends what the engine has seen, the engine is rewound and
    /// the whole list is sent. When `events` is given it receives every
    /// token followed by exactly one `Done` or `Error` event.
    pub async fn completion(
        &mut self,
        messages: &[Message],
        params: &CompletionParams,
        events: Option<EventSender>,
    ) -> Result<CompletionOutput, SessionError> {
        let forwarder = EventForwarder::new(events);
        let outcome = self.run_completion(messages, params, &forwarder).await;
        forwarder.finish(&outcome);
        outcome
    }

    async fn run_completion(
        &mut self,
        messages: &[Message],
        params: &CompletionParams,
        forwarder: &EventForwarder,
    ) -> Result<CompletionOutput, SessionError> {
        let handle = self.state.handle()?;
        let Reconciliation {
            to_send,
            requires_reset,
        } = self.history.reconcile(messages);

        if requires_reset {
            warn!(
                session = %self.id.short(),
                tracked = self.history.len(),
                incoming = messages.len(),
                "conversation history diverged, rewinding engine context"
            );
            if let Err(e) = handle.rewind().await {
                self.history.invalidate();
                return Err(SessionError::Engine(e));
            }
            self.history.reset();
        }

        if to_send.is_empty() {
            warn!(session = %self.id.short(), "completion requested with no new messages");
        }
        debug!(session = %self.id.short(), delta = to_send.len(), "sending completion");

        match handle
            .complete(&to_send, params, forwarder.token_callback())
            .await
        {
            Ok(result) => {
                let stats = forwarder.stats();
                debug!(
                    tokens = stats.tokens,
                    elapsed_ms = stats.elapsed.as_millis() as u64,
                    "completion finished"
                );
                self.history
                    .commit(to_send, Message::assistant(result.content.clone()));
                Ok(CompletionOutput {
                    content: result.content,
                    stats,
                })
            }
            Err(e) => {
                self.history.invalidate();
                Err(SessionError::Engine(e))
            }
        }
    }
}
