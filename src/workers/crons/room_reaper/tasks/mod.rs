pub mod reap_idle_rooms;
