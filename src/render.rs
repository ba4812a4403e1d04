/// Plain-text rendering of views for the terminal.
/// Every function here is pure; the CLI prints whatever it returns.

use crate::admin::AdminStats;
use crate::catalog::{BorrowAffordance, CatalogView};
use crate::covers;
use crate::ledger::{self, BorrowClass, LedgerBody, LedgerScope, LedgerView, RecentActivity};
use crate::models::{AdminUser, Book, BorrowRecord};
use crate::view::{Gate, ViewState};
use chrono::{DateTime, Utc};

pub const MISSING_DATE: &str = "N/A";

/// `Oct 19, 2026`, or `Mon, Oct 19, 2026` with the weekday
pub fn format_date(date: Option<DateTime<Utc>>, weekday: bool) -> String {
    match date {
        Some(date) if weekday => date.format("%a, %b %-d, %Y").to_string(),
        Some(date) => date.format("%b %-d, %Y").to_string(),
        None => MISSING_DATE.to_string(),
    }
}

fn plural(n: i64) -> &'static str {
    if n == 1 {
        "day"
    } else {
        "days"
    }
}

/// Status line for a record as of `now`
pub fn status_line(record: &BorrowRecord, now: DateTime<Utc>) -> String {
    let days = ledger::days_until_due(record, now);
    match (ledger::classify(record, now), days) {
        (BorrowClass::Overdue, Some(days)) => {
            let late = days.abs().max(1);
            format!("OVERDUE by {} {}", late, plural(late))
        }
        (BorrowClass::DueSoon, Some(0)) => "Due today".to_string(),
        (BorrowClass::DueSoon | BorrowClass::OnLoan, Some(days)) => {
            format!("Due in {} {}", days, plural(days))
        }
        (BorrowClass::OnLoan, None) => "No due date".to_string(),
        (BorrowClass::Returned { late: true }, _) => "Returned Late".to_string(),
        (BorrowClass::Returned { late: false }, _) => "Returned On Time".to_string(),
        _ => "Status unknown".to_string(),
    }
}

fn marker(class: BorrowClass) -> &'static str {
    match class {
        BorrowClass::Overdue => "!!",
        BorrowClass::DueSoon => " !",
        _ => "  ",
    }
}

/// One current-loan entry
pub fn borrow_item(record: &BorrowRecord, now: DateTime<Utc>, show_borrower: bool) -> String {
    let class = ledger::classify(record, now);
    let mut out = format!("{} [{}] {}", marker(class), record.id, record.title_or_placeholder());
    if let Some(author) = record.book_author.as_deref().filter(|a| !a.is_empty()) {
        out.push_str(&format!(" by {}", author));
    }
    if show_borrower {
        if let Some(borrower) = record.borrower() {
            out.push_str(&format!(" ({})", borrower));
        }
    }
    out.push_str(&format!(
        "\n     Borrowed: {}  Due: {}  {}",
        format_date(record.borrowed_at(), false),
        format_date(record.due_at(), true),
        status_line(record, now)
    ));
    out
}

/// One history entry
pub fn history_item(record: &BorrowRecord, now: DateTime<Utc>, show_borrower: bool) -> String {
    let mut out = format!("   [{}] {}", record.id, record.title_or_placeholder());
    if let Some(author) = record.book_author.as_deref().filter(|a| !a.is_empty()) {
        out.push_str(&format!(" by {}", author));
    }
    if show_borrower {
        if let Some(borrower) = record.borrower() {
            out.push_str(&format!(" ({})", borrower));
        }
    }
    out.push_str(&format!(
        "\n     Borrowed: {}  Due: {}  Returned: {}  {}",
        format_date(record.borrowed_at(), false),
        format_date(record.due_at(), false),
        format_date(record.returned_at(), false),
        status_line(record, now)
    ));
    out
}

pub fn ledger(view: &LedgerView) -> String {
    let show_borrower = view.scope == LedgerScope::All;
    let stats = view.stats;
    let mut lines = vec![format!(
        "Current: {}  Due soon: {}  Returned: {}  Overdue: {}",
        stats.current, stats.due_soon, stats.returned, stats.overdue
    )];

    match &view.body {
        LedgerBody::Failed(message) => lines.push(message.clone()),
        LedgerBody::Loaded(ledger) => {
            let now = ledger.as_of;

            lines.push(String::new());
            lines.push("Due soon".to_string());
            if ledger.due_soon.is_empty() {
                lines.push("   No books due soon".to_string());
            }
            lines.extend(ledger.due_soon.iter().map(|r| borrow_item(r, now, show_borrower)));

            lines.push(String::new());
            lines.push("Currently borrowed".to_string());
            let remainder = ledger.remainder();
            if remainder.is_empty() {
                lines.push("   No other books currently borrowed".to_string());
            }
            lines.extend(remainder.into_iter().map(|r| borrow_item(r, now, show_borrower)));

            lines.push(String::new());
            lines.push("History".to_string());
            if ledger.returned.is_empty() {
                lines.push("   No returned books yet".to_string());
            }
            lines.extend(ledger.returned.iter().map(|r| history_item(r, now, show_borrower)));
        }
    }
    lines.join("\n")
}

pub fn book_card(book: &Book, affordance: BorrowAffordance) -> String {
    let availability = if book.is_available() {
        "Available"
    } else {
        "Out of Stock"
    };
    let action = match affordance {
        BorrowAffordance::Borrow => format!("/borrow {}", book.id),
        BorrowAffordance::NotAvailable => "Not Available".to_string(),
        BorrowAffordance::LoginToBorrow => "Login to Borrow".to_string(),
    };

    format!(
        "[{}] {} by {}\n     {} | {}/{} available | {} | {}\n     Cover: {}",
        book.id,
        book.title,
        book.author,
        book.category_label(),
        book.available_copies,
        book.total_copies,
        availability,
        action,
        covers::resolve(book).url
    )
}

pub fn catalog(view: &CatalogView) -> String {
    if view.is_empty() {
        return if view.total == 0 {
            "No books in the catalog yet".to_string()
        } else {
            "No books match your search".to_string()
        };
    }

    let mut lines = vec![format!("Showing {} of {} books", view.books.len(), view.total)];
    lines.extend(view.books.iter().map(|b| book_card(b, view.affordance(b))));
    lines.join("\n")
}

/// Admin table row; ISBN and copy counts up front
pub fn admin_book_row(book: &Book) -> String {
    format!(
        "[{}] {} | {} | ISBN {} | {} | {}/{}",
        book.id,
        book.title,
        book.author,
        if book.isbn.is_empty() { "-" } else { book.isbn.as_str() },
        book.category_label(),
        book.available_copies,
        book.total_copies
    )
}

pub fn admin_stats(stats: &AdminStats) -> String {
    format!(
        "Books: {}  Users: {}  Borrowed copies: {}  Available copies: {}  Overdue: {}",
        stats.total_books,
        stats.total_users,
        stats.borrowed_copies,
        stats.available_copies,
        stats.overdue
    )
}

pub fn recent_activity(activity: &RecentActivity) -> String {
    let mut lines = vec!["Recently borrowed".to_string()];
    if activity.borrowed.is_empty() {
        lines.push("   No recent borrowings".to_string());
    }
    lines.extend(activity.borrowed.iter().map(|r| borrow_item(r, activity.as_of, true)));

    lines.push("Recently returned".to_string());
    if activity.returned.is_empty() {
        lines.push("   No recent returns".to_string());
    }
    lines.extend(activity.returned.iter().map(|r| history_item(r, activity.as_of, true)));
    lines.join("\n")
}

pub fn users(users: &[AdminUser]) -> String {
    if users.is_empty() {
        return "No users".to_string();
    }
    users
        .iter()
        .map(|u| {
            format!(
                "[{}] {} <{}> {}",
                u.id,
                u.name.as_deref().unwrap_or("-"),
                u.email,
                u.role.as_str()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Header printed after every session change or page switch
pub fn chrome(state: &ViewState) -> String {
    let mut lines = Vec::new();
    if state.navbar_visible {
        let mut nav = format!("[{}]", state.page.as_str());
        if let Some(name) = &state.profile_name {
            nav.push_str(&format!(" {}", name));
        }
        if state.admin_link_visible {
            nav.push_str("  /admin-books");
        }
        if state.logout_visible {
            nav.push_str("  /logout");
        }
        lines.push(nav);
    }

    if !state.admin_welcome.is_empty() {
        lines.push(state.admin_welcome.clone());
    } else {
        lines.push(state.user_welcome.clone());
    }

    match &state.gate {
        Gate::Render => {}
        Gate::AuthPrompt(_) => lines.push("Use /login or /register to continue".to_string()),
        Gate::Redirect { notice, .. } => {
            if let Some(notice) = notice {
                lines.push(notice.clone());
            }
        }
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap()
    }

    fn record(value: serde_json::Value) -> BorrowRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(Some(now()), false), "Oct 19, 2026");
        assert_eq!(format_date(Some(now()), true), "Mon, Oct 19, 2026");
        assert_eq!(format_date(None, true), "N/A");
    }

    #[test]
    fn test_status_lines() {
        let overdue = record(serde_json::json!({
            "id": 1, "book_id": 1, "status": "borrowed", "due_date": "2026-10-14"
        }));
        let soon = record(serde_json::json!({
            "id": 2, "book_id": 1, "status": "active", "due_date": "2026-10-21T09:00:00Z"
        }));
        let later = record(serde_json::json!({
            "id": 3, "book_id": 1, "status": "active", "due_date": "2026-11-02T09:00:00Z"
        }));
        let late = record(serde_json::json!({
            "id": 4, "book_id": 1, "status": "returned",
            "due_date": "2026-10-01", "return_date": "2026-10-03"
        }));

        assert_eq!(status_line(&overdue, now()), "OVERDUE by 5 days");
        assert_eq!(status_line(&soon, now()), "Due in 2 days");
        assert_eq!(status_line(&later, now()), "Due in 14 days");
        assert_eq!(status_line(&late, now()), "Returned Late");
    }

    #[test]
    fn test_undated_record_renders_placeholders() {
        let undated = record(serde_json::json!({"id": 7, "book_id": 42, "status": "active"}));
        let line = borrow_item(&undated, now(), false);
        assert!(line.contains("Book ID: 42"));
        assert!(line.contains("Borrowed: N/A"));
        assert!(line.contains("No due date"));
    }

    #[test]
    fn test_book_card_affordances() {
        let book = Book {
            id: 3,
            title: "Things Fall Apart".to_string(),
            author: "Chinua Achebe".to_string(),
            isbn: "9780385474542".to_string(),
            category: None,
            description: None,
            total_copies: 4,
            available_copies: 0,
        };
        let card = book_card(&book, BorrowAffordance::NotAvailable);
        assert!(card.contains("0/4 available"));
        assert!(card.contains("Out of Stock"));
        assert!(card.contains("General"));
        assert!(book_card(&book, BorrowAffordance::LoginToBorrow).contains("Login to Borrow"));
    }
}
