use std::sync::Arc;

use sonar_chat::{AudioTranscription, ChatProvider, ChatStreamProxy, ProviderKind, Transcriber};
use sonar_core::{Credentials, MarketDataFetcher, MarketDataSource, MarketStatusView};
use tokio::sync::watch;

/// One chat provider per variant.
#[derive(Clone)]
pub struct ChatProviders {
    anthropic: Arc<dyn ChatProvider>,
    openai: Arc<dyn ChatProvider>,
    perplexity: Arc<dyn ChatProvider>,
}

impl ChatProviders {
    pub fn new(
        anthropic: Arc<dyn ChatProvider>,
        openai: Arc<dyn ChatProvider>,
        perplexity: Arc<dyn ChatProvider>,
    ) -> Self {
        Self {
            anthropic,
            openai,
            perplexity,
        }
    }

    pub fn from_credentials(credentials: &Credentials) -> Self {
        let proxy = |kind| -> Arc<dyn ChatProvider> {
            Arc::new(ChatStreamProxy::from_credentials(kind, credentials))
        };
        Self::new(
            proxy(ProviderKind::Anthropic),
            proxy(ProviderKind::OpenAi),
            proxy(ProviderKind::Perplexity),
        )
    }

    pub fn get(&self, kind: ProviderKind) -> &Arc<dyn ChatProvider> {
        match kind {
            ProviderKind::Anthropic => &self.anthropic,
            ProviderKind::OpenAi => &self.openai,
            ProviderKind::Perplexity => &self.perplexity,
        }
    }
}

/// Shared handler state. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub chat: ChatProviders,
    pub transcriber: Arc<dyn AudioTranscription>,
    pub fetcher: MarketDataFetcher,
    pub market_status: watch::Receiver<MarketStatusView>,
}

impl AppState {
    pub fn new(
        chat: ChatProviders,
        transcriber: Arc<dyn AudioTranscription>,
        fetcher: MarketDataFetcher,
        market_status: watch::Receiver<MarketStatusView>,
    ) -> Self {
        Self {
            chat,
            transcriber,
            fetcher,
            market_status,
        }
    }

    /// Production wiring: chat and transcription keys from `credentials`, bars from
    /// `market_data`, status from the poller feeding `market_status`.
    pub fn from_credentials(
        credentials: &Credentials,
        market_data: Arc<dyn MarketDataSource>,
        market_status: watch::Receiver<MarketStatusView>,
    ) -> Self {
        Self::new(
            ChatProviders::from_credentials(credentials),
            Arc::new(Transcriber::from_credentials(credentials)),
            MarketDataFetcher::new(market_data),
            market_status,
        )
    }
}
