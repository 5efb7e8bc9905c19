//! # Voxforge Server
//!
//! The HTTP face of the forge:
//! - `POST /api/forge` runs one forge request and returns the voxel JSON
//! - `GET /api/journal` returns the recent forge events, oldest first
//!
//! Every failure becomes `{ "error": "<message>" }` with a 4xx or 5xx status.

mod response;
mod routes;
mod server;
mod state;

pub use response::ApiError;
pub use server::{router, serve};
pub use state::AppState;
