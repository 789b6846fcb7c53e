//! Everything that touches the status bar lives here. [sketchybar::SketchybarSink]
//! is the production [TimerSink](crate::daemon::forward::TimerSink).

pub mod icon;
pub mod sketchybar;
