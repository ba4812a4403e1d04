//! Borrow ledger
//!
//! Fetches borrow records and classifies them at render time. Nothing about
//! overdue or due-soon state is stored; it is recomputed against `now` on
//! every load.

use crate::actions::{Confirm, Mutation, Resync};
use crate::api::ServerApi;
use crate::error::{ClientError, Result};
use crate::models::{BorrowRecord, BorrowStatus};
use crate::session::SessionStore;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::sync::Arc;

/// Calendar days ahead of the due date that count as "due soon"
pub const DUE_SOON_DAYS: i64 = 3;

/// Single message shown for both the current and history sections
pub const LOAD_FAILURE: &str = "Error loading borrow history. Please try again.";

/// Number of entries per list in the admin activity feed
pub const RECENT_ACTIVITY_LIMIT: usize = 4;

/// Render-time classification of one record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorrowClass {
    Overdue,
    DueSoon,
    OnLoan,
    Returned { late: bool },
    Unknown,
}

/// Whole calendar days from `now` to the due date; negative once past it
pub fn days_until_due(record: &BorrowRecord, now: DateTime<Utc>) -> Option<i64> {
    record
        .due_at()
        .map(|due| (due.date_naive() - now.date_naive()).num_days())
}

pub fn is_overdue(record: &BorrowRecord, now: DateTime<Utc>) -> bool {
    record.is_active() && record.due_at().map(|due| due < now).unwrap_or(false)
}

pub fn is_due_soon(record: &BorrowRecord, now: DateTime<Utc>) -> bool {
    record.is_active()
        && !is_overdue(record, now)
        && days_until_due(record, now)
            .map(|days| days <= DUE_SOON_DAYS)
            .unwrap_or(false)
}

pub fn classify(record: &BorrowRecord, now: DateTime<Utc>) -> BorrowClass {
    match record.status {
        BorrowStatus::Returned => BorrowClass::Returned {
            late: record.was_overdue(),
        },
        BorrowStatus::Active if is_overdue(record, now) => BorrowClass::Overdue,
        BorrowStatus::Active if is_due_soon(record, now) => BorrowClass::DueSoon,
        BorrowStatus::Active => BorrowClass::OnLoan,
        BorrowStatus::Unknown => BorrowClass::Unknown,
    }
}

/// Stable sort, newest first; records without a usable date go last
fn newest_first<F>(records: &mut [BorrowRecord], key: F)
where
    F: Fn(&BorrowRecord) -> Option<DateTime<Utc>>,
{
    records.sort_by(|a, b| match (key(a), key(b)) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerStats {
    pub current: usize,
    pub due_soon: usize,
    pub returned: usize,
    pub overdue: usize,
}

/// Records partitioned by status, each list in display order
#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    /// Every active record, newest borrow first
    pub active: Vec<BorrowRecord>,
    /// The due-soon subset of `active`, same order
    pub due_soon: Vec<BorrowRecord>,
    /// Returned records, newest return first
    pub returned: Vec<BorrowRecord>,
    pub overdue: usize,
    pub as_of: DateTime<Utc>,
}

impl Ledger {
    pub fn build(records: Vec<BorrowRecord>, now: DateTime<Utc>) -> Self {
        let (mut active, rest): (Vec<_>, Vec<_>) =
            records.into_iter().partition(|r| r.is_active());
        let mut returned: Vec<_> = rest.into_iter().filter(|r| r.is_returned()).collect();

        newest_first(&mut active, |r| r.borrowed_at());
        newest_first(&mut returned, |r| r.returned_at());

        let due_soon = active
            .iter()
            .filter(|r| is_due_soon(r, now))
            .cloned()
            .collect();
        let overdue = active.iter().filter(|r| is_overdue(r, now)).count();

        Ledger {
            active,
            due_soon,
            returned,
            overdue,
            as_of: now,
        }
    }

    /// Active records that are not due soon
    pub fn remainder(&self) -> Vec<&BorrowRecord> {
        self.active
            .iter()
            .filter(|r| !is_due_soon(r, self.as_of))
            .collect()
    }

    pub fn stats(&self) -> LedgerStats {
        LedgerStats {
            current: self.active.len(),
            due_soon: self.due_soon.len(),
            returned: self.returned.len(),
            overdue: self.overdue,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerScope {
    Mine,
    All,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LedgerBody {
    Loaded(Ledger),
    /// One message covering every section
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LedgerView {
    pub scope: LedgerScope,
    pub stats: LedgerStats,
    pub body: LedgerBody,
}

impl LedgerView {
    fn loaded(scope: LedgerScope, ledger: Ledger) -> Self {
        LedgerView {
            scope,
            stats: ledger.stats(),
            body: LedgerBody::Loaded(ledger),
        }
    }

    fn failed(scope: LedgerScope) -> Self {
        LedgerView {
            scope,
            stats: LedgerStats::default(),
            body: LedgerBody::Failed(LOAD_FAILURE.to_string()),
        }
    }

    pub fn ledger(&self) -> Option<&Ledger> {
        match &self.body {
            LedgerBody::Loaded(ledger) => Some(ledger),
            LedgerBody::Failed(_) => None,
        }
    }
}

/// Newest borrowings and returns across all users
#[derive(Debug, Clone, PartialEq)]
pub struct RecentActivity {
    pub borrowed: Vec<BorrowRecord>,
    pub returned: Vec<BorrowRecord>,
    pub as_of: DateTime<Utc>,
}

pub struct LedgerController {
    api: Arc<ServerApi>,
    session: Arc<SessionStore>,
}

impl LedgerController {
    pub fn new(api: Arc<ServerApi>, session: Arc<SessionStore>) -> Self {
        LedgerController { api, session }
    }

    /// The signed-in user's borrows
    pub async fn load_mine(&self) -> Result<LedgerView> {
        if self.session.token().is_none() {
            return Err(ClientError::Unauthenticated);
        }
        let result = self.api.my_borrows().await;
        Ok(Self::into_view(LedgerScope::Mine, result))
    }

    /// Every user's borrows; admins only
    pub async fn load_all(&self) -> Result<LedgerView> {
        self.require_admin()?;
        let result = self.api.all_borrows().await;
        Ok(Self::into_view(LedgerScope::All, result))
    }

    fn into_view(scope: LedgerScope, result: Result<Vec<BorrowRecord>>) -> LedgerView {
        match result {
            Ok(records) => LedgerView::loaded(scope, Ledger::build(records, Utc::now())),
            Err(e) => {
                log::error!("Failed to load borrow records: {}", e);
                LedgerView::failed(scope)
            }
        }
    }

    /// Return a borrowed book after confirmation
    pub async fn return_book(
        &self,
        borrow_id: i64,
        confirm: &dyn Confirm,
    ) -> Result<Mutation<Option<String>>> {
        if self.session.token().is_none() {
            return Err(ClientError::Unauthenticated);
        }
        if !confirm.confirm("Are you sure you want to return this book?").await {
            return Ok(Mutation::Cancelled);
        }

        let body = self.api.return_borrow(borrow_id).await?;
        log::info!("Returned borrow {}", borrow_id);
        let message = body
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string);
        Ok(Mutation::Done {
            value: message,
            resync: Resync::Ledger,
        })
    }

    /// Latest `limit` borrowings and returns across all users; admins only
    pub async fn recent_activity(&self, limit: usize) -> Result<RecentActivity> {
        self.require_admin()?;
        let records = self.api.all_borrows().await?;
        let ledger = Ledger::build(records, Utc::now());

        Ok(RecentActivity {
            borrowed: ledger.active.into_iter().take(limit).collect(),
            returned: ledger.returned.into_iter().take(limit).collect(),
            as_of: ledger.as_of,
        })
    }

    fn require_admin(&self) -> Result<()> {
        let user = self.session.user().ok_or(ClientError::Unauthenticated)?;
        if !user.is_admin() {
            return Err(ClientError::Forbidden(format!(
                "{} is not an administrator",
                user.email
            )));
        }
        Ok(())
    }
}
