use std::future::Future;

use anyhow::Result;

use super::prefs::Prefs;

/// Interface for abstracting storage of the preference namespace.
pub trait PrefsStore {
    /// Returns a consistent snapshot of the namespace.
    fn read(&self) -> impl Future<Output = Result<Prefs>>;

    /// Runs `edit` as a single read-modify-write transaction. Changes become visible (and durable
    /// for persistent stores) only when the whole transaction succeeds. On error nothing is
    /// written.
    fn update<R>(&self, edit: impl FnOnce(&mut Prefs) -> R) -> impl Future<Output = Result<R>>;
}
