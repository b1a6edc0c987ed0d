pub mod assignment;
pub mod errors;
pub mod handshake;
pub mod lobby_service;
pub mod notifications;
