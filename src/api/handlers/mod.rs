//! Request handlers grouped by resource.

pub mod campaign;
pub mod health;
pub mod numbers;
pub mod participants;
