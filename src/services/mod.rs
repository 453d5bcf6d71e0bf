pub mod artifact;
pub mod assets;
pub mod describe;
pub mod detection;
