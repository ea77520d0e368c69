pub mod dto;
pub mod form;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod utils;
