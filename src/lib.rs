//! Terminal countdown of an estimated remaining lifetime.
//! Shows the time left until a statistical life expectancy in a chosen unit, how much of today's
//! active window is still ahead, and a one-line note for the current day or week. Everything is
//! recomputed from the clock and a small locally stored profile.
//!

pub mod cli;
pub mod core;
pub mod notes;
pub mod storage;
pub mod utils;
