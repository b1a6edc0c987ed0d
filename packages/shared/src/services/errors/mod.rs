pub mod lobby_service_errors;
