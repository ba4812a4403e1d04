//! Shared plumbing for state-changing operations.
//!
//! Mutations never patch local data. They report which view must be
//! re-fetched, and the caller runs that query again.

use futures::future::{self, BoxFuture};

/// Data set to reload after a successful mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resync {
    /// Reload the book listing
    Catalog,
    /// Reload the borrow ledger
    Ledger,
    /// Reload the book listing and the admin statistics
    CatalogAndStats,
}

/// Asks the acting user to approve a state-changing action.
///
/// The answer may have to wait on the same input stream the commands come
/// from, so asking is asynchronous.
pub trait Confirm {
    fn confirm<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, bool>;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, bool> {
        Box::pin(future::ready(self(prompt)))
    }
}

/// Approves everything; for `--yes` and tests
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm<'a>(&'a self, _prompt: &'a str) -> BoxFuture<'a, bool> {
        Box::pin(future::ready(true))
    }
}

/// Outcome of a confirmed mutation
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation<T> {
    Done { value: T, resync: Resync },
    /// The user declined; nothing was sent
    Cancelled,
}

impl<T> Mutation<T> {
    pub fn resync(&self) -> Option<Resync> {
        match self {
            Mutation::Done { resync, .. } => Some(*resync),
            Mutation::Cancelled => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Mutation::Cancelled)
    }
}
