pub mod client;
pub mod model;

pub use client::{ClistClient, ClistError, ContestSource, Credentials};
