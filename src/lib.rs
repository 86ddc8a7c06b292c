//! Simple to use cli/daemon for counting your steps throughout the day.
//! The daemon reads a hardware step counter (or a feed of step events), keeps the daily total
//! consistent across restarts, reboots and midnight, and archives finished days. The cli shows
//! progress towards the daily goal and the history.
//!

pub mod cli;
pub mod config;
pub mod daemon;
pub mod sensor;
pub mod store;
pub mod tracker;
pub mod utils;
