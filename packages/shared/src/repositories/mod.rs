pub mod errors;
pub mod lobby_repository;
pub mod participant_directory;
