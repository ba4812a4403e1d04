//! View synchronization
//!
//! The visible chrome (navigation, profile name, welcome banners, page gate)
//! is a pure function of the session and the current page. The
//! [`ViewSynchronizer`] subscribes to the session store and recomputes it on
//! every change.

use crate::session::{Session, SessionObserver};
use std::sync::Mutex;

pub const LOGGED_OUT_WELCOME: &str = "Please login to view your borrows";
pub const ADMINS_ONLY: &str = "Access denied. Admins only.";

/// Surfaces of the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    /// Landing page with the public catalog
    Home,
    /// The signed-in user's borrow history
    Borrows,
    /// Administration console
    Admin,
}

impl Page {
    pub fn as_str(&self) -> &'static str {
        match self {
            Page::Home => "home",
            Page::Borrows => "borrows",
            Page::Admin => "admin",
        }
    }
}

/// Which auth form the inline prompt should open on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthTab {
    Login,
    Register,
}

/// What a page may show for the current session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gate {
    Render,
    /// Home without a session: show the login prompt inline
    AuthPrompt(AuthTab),
    /// Protected page without the required identity
    Redirect { to: Page, notice: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub page: Page,
    pub navbar_visible: bool,
    pub logout_visible: bool,
    pub admin_link_visible: bool,
    pub profile_name: Option<String>,
    pub user_welcome: String,
    pub admin_welcome: String,
    pub gate: Gate,
}

/// Compute the chrome for a page given the current session
pub fn compute_view(session: Option<&Session>, page: Page) -> ViewState {
    match session {
        Some(session) => {
            let name = session.user.display_name();
            let is_admin = session.is_admin();
            let gate = if page == Page::Admin && !is_admin {
                Gate::Redirect {
                    to: Page::Home,
                    notice: Some(ADMINS_ONLY.to_string()),
                }
            } else {
                Gate::Render
            };

            ViewState {
                page,
                navbar_visible: true,
                logout_visible: true,
                admin_link_visible: is_admin,
                profile_name: Some(name.clone()),
                user_welcome: format!("Welcome, {}", name),
                admin_welcome: if is_admin {
                    format!("Welcome, Admin {}", name)
                } else {
                    String::new()
                },
                gate,
            }
        }
        None => ViewState {
            page,
            navbar_visible: false,
            logout_visible: false,
            admin_link_visible: false,
            profile_name: None,
            user_welcome: LOGGED_OUT_WELCOME.to_string(),
            admin_welcome: String::new(),
            gate: match page {
                Page::Home => Gate::AuthPrompt(AuthTab::Login),
                _ => Gate::Redirect {
                    to: Page::Home,
                    notice: None,
                },
            },
        },
    }
}

/// Keeps the current [`ViewState`] in step with the session
pub struct ViewSynchronizer {
    inner: Mutex<ViewInner>,
}

struct ViewInner {
    session: Option<Session>,
    state: ViewState,
}

impl ViewSynchronizer {
    pub fn new(page: Page) -> Self {
        ViewSynchronizer {
            inner: Mutex::new(ViewInner {
                session: None,
                state: compute_view(None, page),
            }),
        }
    }

    /// Recompute for the given session and return the result
    pub fn sync(&self, session: Option<&Session>) -> ViewState {
        let mut inner = match self.inner.lock() {
            Ok(inner) => inner,
            Err(poisoned) => poisoned.into_inner(),
        };
        inner.session = session.cloned();
        inner.state = compute_view(session, inner.state.page);
        inner.state.clone()
    }

    /// Move to another page. A redirecting gate lands on its target instead.
    pub fn navigate(&self, page: Page) -> ViewState {
        let mut inner = match self.inner.lock() {
            Ok(inner) => inner,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut state = compute_view(inner.session.as_ref(), page);
        if let Gate::Redirect { to, notice } = state.gate.clone() {
            log::debug!("Redirecting from {} to {}", page.as_str(), to.as_str());
            let mut landed = compute_view(inner.session.as_ref(), to);
            if notice.is_some() {
                // Keep the reason visible on the landing page
                landed.gate = match landed.gate {
                    Gate::Render => Gate::Redirect { to, notice },
                    other => other,
                };
            }
            state = landed;
        }
        inner.state = state.clone();
        state
    }

    pub fn state(&self) -> ViewState {
        match self.inner.lock() {
            Ok(inner) => inner.state.clone(),
            Err(poisoned) => poisoned.into_inner().state.clone(),
        }
    }
}

impl SessionObserver for ViewSynchronizer {
    fn session_changed(&self, session: Option<&Session>) {
        let state = self.sync(session);
        log::debug!(
            "View synchronized: page={} logged_in={}",
            state.page.as_str(),
            state.logout_visible
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Role, UserProfile};

    fn session(role: Role) -> Session {
        Session {
            token: "tok".to_string(),
            user: UserProfile::new("grace@example.com", Some("Grace".to_string()), role, None),
        }
    }

    #[test]
    fn test_logged_out_home_prompts_login() {
        let view = compute_view(None, Page::Home);
        assert_eq!(view.gate, Gate::AuthPrompt(AuthTab::Login));
        assert!(!view.logout_visible);
        assert!(!view.admin_link_visible);
        assert_eq!(view.user_welcome, LOGGED_OUT_WELCOME);
    }

    #[test]
    fn test_logged_out_protected_page_redirects() {
        for page in [Page::Borrows, Page::Admin] {
            let view = compute_view(None, page);
            assert!(matches!(view.gate, Gate::Redirect { to: Page::Home, .. }));
        }
    }

    #[test]
    fn test_user_session() {
        let view = compute_view(Some(&session(Role::User)), Page::Borrows);
        assert_eq!(view.gate, Gate::Render);
        assert!(view.logout_visible);
        assert!(!view.admin_link_visible);
        assert_eq!(view.profile_name.as_deref(), Some("Grace"));
        assert_eq!(view.user_welcome, "Welcome, Grace");
        assert_eq!(view.admin_welcome, "");
    }

    #[test]
    fn test_admin_session() {
        let view = compute_view(Some(&session(Role::Admin)), Page::Admin);
        assert_eq!(view.gate, Gate::Render);
        assert!(view.admin_link_visible);
        assert_eq!(view.admin_welcome, "Welcome, Admin Grace");
    }

    #[test]
    fn test_non_admin_on_admin_page() {
        let view = compute_view(Some(&session(Role::User)), Page::Admin);
        assert_eq!(
            view.gate,
            Gate::Redirect {
                to: Page::Home,
                notice: Some(ADMINS_ONLY.to_string())
            }
        );
    }

    #[test]
    fn test_sync_is_idempotent() {
        let sync = ViewSynchronizer::new(Page::Home);
        let s = session(Role::User);
        let first = sync.sync(Some(&s));
        let second = sync.sync(Some(&s));
        assert_eq!(first, second);
    }

    #[test]
    fn test_navigate_follows_redirect() {
        let sync = ViewSynchronizer::new(Page::Home);
        let landed = sync.navigate(Page::Borrows);
        assert_eq!(landed.page, Page::Home);
        assert_eq!(landed.gate, Gate::AuthPrompt(AuthTab::Login));

        sync.sync(Some(&session(Role::User)));
        let denied = sync.navigate(Page::Admin);
        assert_eq!(denied.page, Page::Home);
        assert!(matches!(denied.gate, Gate::Redirect { notice: Some(_), .. }));
    }

    #[test]
    fn test_observer_tracks_logout() {
        let sync = ViewSynchronizer::new(Page::Borrows);
        sync.session_changed(Some(&session(Role::User)));
        assert!(sync.state().logout_visible);

        sync.session_changed(None);
        let state = sync.state();
        assert!(!state.logout_visible);
        assert!(matches!(state.gate, Gate::Redirect { .. }));
    }
}
