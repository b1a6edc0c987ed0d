pub mod lobby_repository_errors;
pub mod participant_directory_errors;
