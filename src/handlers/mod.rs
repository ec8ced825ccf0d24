// handlers/mod.rs - HTTP handlers
//
// Public endpoints (/ and /health) live next to the router in app.rs.
// Everything under /recipes requires a Bearer JWT and is declared here.
pub mod recipes;
