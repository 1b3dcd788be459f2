pub mod annotate;
pub mod detection;
pub mod reconstruct;
pub mod session;
pub mod store;
