//! Polls the Brain.fm desktop app through its remote debugging port, reads the
//! on-screen session timer, and mirrors it into a sketchybar item. Thin glue
//! between two tools that already exist, nothing more.

pub mod app;
pub mod cdp;
pub mod cli;
pub mod daemon;
pub mod status;
pub mod timer;
pub mod utils;
