use std::env;
use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

pub mod error;
pub mod gateway;
pub mod middleware;
pub mod routes;
pub mod state;

use gateway::WebSocketGateway;
use shared::models::table::TableRegistry;
use shared::repositories::lobby_repository::{
    InMemoryLobbyRepository, JsonFileLobbyRepository, LobbyRepository,
};
use shared::repositories::participant_directory::StaticParticipantDirectory;
use shared::services::lobby_service::{LobbyConfig, LobbyService, LobbyState};

const SWEEP_PERIOD: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET environment variable must be set");
    let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let table_count: u32 = env::var("TABLE_COUNT")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(3);

    let repository: Arc<dyn LobbyRepository> = match env::var("LOBBY_STATE_FILE") {
        Ok(path) => {
            info!("Persisting lobby state to {}", path);
            Arc::new(JsonFileLobbyRepository::new(path))
        }
        Err(_) => {
            warn!("LOBBY_STATE_FILE not set; lobby state is in-memory only");
            Arc::new(InMemoryLobbyRepository::new())
        }
    };

    let directory = match env::var("PLAYERS_FILE") {
        Ok(path) => StaticParticipantDirectory::from_json_file(&path)
            .await
            .expect("failed to load the players file"),
        Err(_) => {
            warn!("PLAYERS_FILE not set; no players will be able to check in");
            StaticParticipantDirectory::default()
        }
    };

    let state = match repository.load().await {
        Ok(Some(persisted)) => {
            info!("Restored lobby state from the repository");
            LobbyState::from_persisted(persisted)
        }
        Ok(None) => LobbyState::new(TableRegistry::new(table_count)),
        Err(e) => {
            error!("Failed to load persisted lobby state: {}; starting fresh", e);
            LobbyState::new(TableRegistry::new(table_count))
        }
    };

    let gateway = Arc::new(WebSocketGateway::new());
    let lobby_service = Arc::new(LobbyService::new(
        state,
        repository,
        gateway.clone(),
        Arc::new(directory),
        LobbyConfig::default(),
    ));

    // Invite-timeout sweep: a recurring low-priority action competing for
    // the same serialization point as user-triggered ones.
    {
        let lobby = lobby_service.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(SWEEP_PERIOD);
            loop {
                ticker.tick().await;
                match lobby.sweep_expired_invites().await {
                    Ok(0) => {}
                    Ok(expired) => {
                        info!("Invite sweep returned {} player(s) to the queue", expired)
                    }
                    Err(e) => error!("Invite sweep failed: {}", e),
                }
            }
        });
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .merge(routes::queue::routes())
        .merge(routes::tables::routes())
        .merge(routes::ws::routes())
        .layer(cors)
        .with_state(state::AppState {
            lobby_service,
            gateway,
            jwt_secret,
        });

    info!("Listening on {}", bind_addr);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("failed to bind the listen address");
    axum::serve(listener, app).await.expect("server error");
}
