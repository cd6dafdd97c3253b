//! One-line notes attached to a day or an ISO-like week, and the history view over all of them.

pub mod history;
pub mod period;
