// Export components
pub mod auth_gate;
pub mod backend;
pub mod calendar_grid;
pub mod conversation;
pub mod voice;

pub use backend::{Backend, HttpBackend};
