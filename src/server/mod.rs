mod access;
mod account;
mod admin;
mod billing;
mod content;
mod domain;
pub mod dto;
mod public;
pub mod response;
mod router;
pub mod validation;

pub use router::{AppState, create_router};
