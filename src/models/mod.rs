pub mod frames;
pub mod raids;
