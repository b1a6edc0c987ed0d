use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use shared::services::errors::lobby_service_errors::LobbyServiceError;

#[derive(Debug)]
pub enum ApiError {
    Lobby(LobbyServiceError),
    Unauthorized,
}

impl From<LobbyServiceError> for ApiError {
    fn from(error: LobbyServiceError) -> Self {
        ApiError::Lobby(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::Lobby(LobbyServiceError::AlreadyQueued) => StatusCode::CONFLICT,
            ApiError::Lobby(LobbyServiceError::AlreadyActive) => StatusCode::CONFLICT,
            ApiError::Lobby(LobbyServiceError::NotInvited) => StatusCode::FORBIDDEN,
            ApiError::Lobby(
                LobbyServiceError::TableFull
                | LobbyServiceError::NotOnTable
                | LobbyServiceError::NoOpponent,
            ) => StatusCode::BAD_REQUEST,
            ApiError::Lobby(LobbyServiceError::NotFound) => StatusCode::NOT_FOUND,
            ApiError::Lobby(LobbyServiceError::Repository(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
        };

        status.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lobby_errors_map_to_expected_statuses() {
        let cases = [
            (LobbyServiceError::AlreadyQueued, StatusCode::CONFLICT),
            (LobbyServiceError::AlreadyActive, StatusCode::CONFLICT),
            (LobbyServiceError::NotInvited, StatusCode::FORBIDDEN),
            (LobbyServiceError::TableFull, StatusCode::BAD_REQUEST),
            (LobbyServiceError::NotOnTable, StatusCode::BAD_REQUEST),
            (LobbyServiceError::NoOpponent, StatusCode::BAD_REQUEST),
            (LobbyServiceError::NotFound, StatusCode::NOT_FOUND),
            (
                LobbyServiceError::Repository("boom".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            let response = ApiError::from(error).into_response();
            assert_eq!(response.status(), expected);
        }
    }
}
