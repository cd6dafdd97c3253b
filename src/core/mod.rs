//! Pure time arithmetic behind the dashboard. Nothing in here touches storage or the clock: the
//! current instant and the profile snapshot are always passed in.

pub mod calc;
pub mod format;
pub mod profile;
