use std::sync::Arc;

use futures::StreamExt;

use crate::{ChatError, ChatProvider, ConversationState, ProviderKind};

/// A conversation bound to one provider.
///
/// One turn at a time: `submit` takes `&mut self`, so a second send cannot start
/// before the first resolves.
pub struct Conversation {
    provider: Arc<dyn ChatProvider>,
    state: ConversationState,
}

impl std::fmt::Debug for Conversation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Conversation")
            .field("provider", &self.provider.kind())
            .field("state", &self.state)
            .finish()
    }
}

impl Conversation {
    pub fn new(provider: Arc<dyn ChatProvider>) -> Self {
        Self {
            provider,
            state: ConversationState::new(),
        }
    }

    pub fn provider_kind(&self) -> ProviderKind {
        self.provider.kind()
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub async fn submit(&mut self, content: impl Into<String>) -> Result<(), ChatError> {
        self.submit_with(content, |_| {}).await
    }

    /// Run one turn, calling `on_chunk` after each chunk has been appended.
    pub async fn submit_with<F>(&mut self, content: impl Into<String>, mut on_chunk: F) -> Result<(), ChatError>
    where
        F: FnMut(&str),
    {
        let history = self.state.begin_turn(content);
        let mut stream = match self.provider.send(&history).await {
            Ok(stream) => stream,
            Err(error) => {
                self.state.fail();
                return Err(error);
            }
        };

        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(text) => {
                    self.state.append_chunk(&text);
                    on_chunk(&text);
                }
                Err(error) => {
                    self.state.fail();
                    return Err(error);
                }
            }
        }

        self.state.complete();
        Ok(())
    }

    /// Settle a turn whose `submit` future was dropped mid-stream.
    pub fn cancel(&mut self) {
        if self.state.is_pending() {
            self.state.cancel();
        }
    }
}
