pub mod client;
pub mod local;
pub mod parser;

pub use client::GhClient;
pub use local::LocalRepo;
