use std::sync::Arc;

use shared::services::lobby_service::LobbyService;

use crate::gateway::WebSocketGateway;

#[derive(Clone)]
pub struct AppState {
    pub lobby_service: Arc<LobbyService>,
    pub gateway: Arc<WebSocketGateway>,
    pub jwt_secret: String,
}
