//!  Storage is organized through [kv_store::FileStore].
//!  The basic idea is:
//!   - There is a directory per logical table: the profile, day notes and week notes.
//!   - Every key is a small json file inside its table directory.
//!   - [records] maps typed values (profile, notes) onto keys.

pub mod entities;
pub mod kv_store;
pub mod records;
