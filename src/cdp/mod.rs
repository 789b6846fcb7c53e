//! Client side of the remote debugging protocol the Brain.fm app exposes.
//! [probe::TimerProbe] is the main artifact of this module that abstracts
//! reading the timer text out of the running page.

pub mod discovery;
pub mod probe;
pub mod session;
