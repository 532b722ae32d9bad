pub mod commentary;
pub mod matches;
pub mod raids;
