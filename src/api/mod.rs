pub mod error;
pub mod extract;
pub mod handlers;
pub mod handlers_emotion;
pub mod routes;
