//! Multilingual WebSocket chat relay server.
//!
//! Translates each message into every language present in its room and
//! broadcasts one payload with all translations to the room.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin tsuyaku-server
//! cargo run --bin tsuyaku-server -- --host 0.0.0.0 --port 8000 --redis-url redis://127.0.0.1:6379
//! ```

use std::sync::Arc;

use clap::Parser;
use tsuyaku_server::{
    config::ServerConfig,
    domain::{MembershipStore, StoreHealth, TranslationProvider, TranslationStore},
    infrastructure::{
        message_pusher::WebSocketMessagePusher,
        repository::RoomRegistry,
        sequencer::RoomSequencer,
        stats::RelayStats,
        store::{InMemoryStore, RedisStore},
        translation::{
            AnthropicConfig, AnthropicProvider, RateLimiter, TranslationCache, TranslatorClient,
            UnavailableProvider,
        },
    },
    ui::{AppState, Server},
    usecase::{
        ConnectParticipantUseCase, CreateRoomUseCase, DisconnectParticipantUseCase,
        GetHealthUseCase, GetRoomDetailUseCase, SendMessageUseCase, SendTypingUseCase,
    },
};
use tsuyaku_shared::{
    logger::setup_logger,
    time::{Clock, SystemClock},
};

/// One backend seen through each of the store roles it plays.
struct Stores {
    membership: Arc<dyn MembershipStore>,
    translations: Arc<dyn TranslationStore>,
    health: Arc<dyn StoreHealth>,
}

impl Stores {
    fn from_backend<S>(backend: Arc<S>) -> Self
    where
        S: MembershipStore + TranslationStore + StoreHealth + 'static,
    {
        Self {
            membership: backend.clone(),
            translations: backend.clone(),
            health: backend,
        }
    }
}

fn build_stores(config: &ServerConfig) -> Result<Stores, String> {
    match &config.redis_url {
        Some(url) => {
            let store = RedisStore::open(url, config.store_timeout(), config.translation_ttl())
                .map_err(|e| format!("Invalid redis url: {}", e))?;
            tracing::info!("Using redis store");
            Ok(Stores::from_backend(Arc::new(store)))
        }
        None => {
            tracing::info!("No redis url configured, using in-process store");
            Ok(Stores::from_backend(Arc::new(InMemoryStore::new())))
        }
    }
}

fn build_provider(config: &ServerConfig) -> Result<Arc<dyn TranslationProvider>, String> {
    match &config.anthropic_api_key {
        Some(api_key) => {
            let provider = AnthropicProvider::new(AnthropicConfig {
                api_key: api_key.clone(),
                model: config.anthropic_model.clone(),
                max_tokens: config.anthropic_max_tokens,
                temperature: config.anthropic_temperature,
                base_url: config.anthropic_base_url.clone(),
            })
            .map_err(|e| format!("Failed to build translation client: {}", e))?;
            Ok(Arc::new(provider))
        }
        None => {
            tracing::warn!("ANTHROPIC_API_KEY is not set; messages will be relayed untranslated");
            Ok(Arc::new(UnavailableProvider))
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let config = ServerConfig::parse();
    if let Err(e) = config.validate() {
        tracing::error!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    // Initialize dependencies in order:
    // 1. Store
    // 2. Translation (provider, translator, cache)
    // 3. Repository
    // 4. MessagePusher
    // 5. UseCases
    // 6. AppState
    // 7. Server

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // 1. Create Store (redis or in-process)
    let stores = match build_stores(&config) {
        Ok(stores) => stores,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    // Membership left over from a previous run has no live connection behind it
    if let Err(e) = stores.membership.clear_rooms().await {
        tracing::warn!("Could not clear stale room membership: {}", e);
    }

    // 2. Create translation pipeline
    let provider = match build_provider(&config) {
        Ok(provider) => provider,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };
    let limiter = RateLimiter::new(config.rate_limit_max_requests, config.rate_limit_window());
    let translator = Arc::new(TranslatorClient::new(
        provider,
        limiter,
        config.translation_timeout(),
    ));
    let stats = Arc::new(RelayStats::new());
    let cache = Arc::new(TranslationCache::new(
        stores.translations.clone(),
        translator,
        stats.clone(),
        config.local_cache_capacity,
    ));

    // 3. Create Repository (mirror + durable store)
    let repository = Arc::new(RoomRegistry::new(stores.membership.clone(), clock.clone()));
    let sequencer = Arc::new(RoomSequencer::new());

    // 4. Create MessagePusher (WebSocket implementation)
    let message_pusher = Arc::new(WebSocketMessagePusher::new());

    // 5. Create UseCases
    let connect_participant_usecase = Arc::new(ConnectParticipantUseCase::new(
        repository.clone(),
        message_pusher.clone(),
        sequencer.clone(),
        clock.clone(),
    ));
    let disconnect_participant_usecase = Arc::new(DisconnectParticipantUseCase::new(
        repository.clone(),
        message_pusher.clone(),
        sequencer.clone(),
        clock.clone(),
    ));
    let send_message_usecase = Arc::new(SendMessageUseCase::new(
        repository.clone(),
        message_pusher.clone(),
        cache.clone(),
        sequencer.clone(),
        stats.clone(),
        clock.clone(),
    ));
    let send_typing_usecase = Arc::new(SendTypingUseCase::new(
        repository.clone(),
        message_pusher.clone(),
        clock.clone(),
    ));
    let create_room_usecase = Arc::new(CreateRoomUseCase::new(clock.clone()));
    let get_health_usecase = Arc::new(GetHealthUseCase::new(
        stores.health.clone(),
        repository.clone(),
        message_pusher.clone(),
        cache.clone(),
        stats.clone(),
        clock.clone(),
    ));
    let get_room_detail_usecase = Arc::new(GetRoomDetailUseCase::new(repository.clone()));

    // 6. Create AppState
    let state = AppState {
        connect_participant_usecase,
        disconnect_participant_usecase,
        send_message_usecase,
        send_typing_usecase,
        create_room_usecase,
        get_health_usecase,
        get_room_detail_usecase,
    };

    // 7. Create and run the server
    let server = Server::new(state);
    if let Err(e) = server.run(config.host, config.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
