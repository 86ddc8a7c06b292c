//!  Storage is organized through [prefs_store::PrefsStore].
//!  The basic idea is:
//!   - All state lives in one flat key-value namespace ([prefs::Prefs]), mirroring
//!     shared preferences of mobile platforms.
//!   - Every change is a transaction: read the whole namespace, modify it, write it back.
//!   - Transactions are serialized so that counter, date and base are never observed half
//!     updated.

pub mod file_store;
pub mod keys;
pub mod memory_store;
pub mod prefs;
pub mod prefs_store;
