pub mod api;
pub mod asset;
pub mod description;
pub mod detection;
pub mod job;
pub mod session;
