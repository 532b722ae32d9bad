pub mod room_reaper;
pub mod tasks;
