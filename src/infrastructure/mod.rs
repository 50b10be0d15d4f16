// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod history_file;
pub mod http_response;
pub mod protocol;
pub mod transport;
pub mod websocket;
