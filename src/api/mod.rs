//! RESTful API: server wiring, routes, handlers and wire types.

pub mod handlers;
pub mod routes;
pub mod server;
pub mod types;

pub use server::serve_api;
