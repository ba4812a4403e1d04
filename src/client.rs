/// Main library client orchestrator
///
/// Owns the session store, API gateway and view synchronizer, wires the
/// controllers to them, and turns CLI commands into rendered output.

use crate::actions::{AssumeYes, Confirm, Mutation, Resync};
use crate::admin::AdminConsole;
use crate::api::ServerApi;
use crate::auth::{AuthController, RegisterOutcome};
use crate::catalog::{Capability, CatalogController, CatalogView};
use crate::cli::{self, Command, LineInput, PromptConfirm};
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::ledger::{LedgerController, LedgerScope, RECENT_ACTIVITY_LIMIT};
use crate::render;
use crate::session::SessionStore;
use crate::storage::LocalStore;
use crate::view::{Gate, Page, ViewState, ViewSynchronizer};
use std::sync::Arc;

/// Main library client
pub struct LibraryClient {
    config: ClientConfig,
    session: Arc<SessionStore>,
    api: Arc<ServerApi>,
    view: Arc<ViewSynchronizer>,
    auth: AuthController,
    catalog: CatalogController,
    ledger: LedgerController,
    admin: AdminConsole,
    input: LineInput,
    confirm: Box<dyn Confirm + Send + Sync>,
    /// Last member listing; borrowing is checked against it
    snapshot: Option<CatalogView>,
    last_query: (String, String),
    last_admin_term: String,
    last_ledger: LedgerScope,
}

impl LibraryClient {
    /// Create a client backed by `<data_dir>/client.db`
    ///
    /// # Errors
    /// * File system errors when creating the data directory
    /// * Database initialization errors
    /// * An unusable server URL
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.ensure_data_dir()?;
        let store = LocalStore::new(&config.db_path())?;
        Self::with_store(config, store)
    }

    /// Create a client over an already opened store
    pub fn with_store(config: ClientConfig, store: LocalStore) -> Result<Self> {
        let session = Arc::new(SessionStore::new(store));
        let api = Arc::new(ServerApi::with_timeout(
            &config.server_url,
            session.clone(),
            config.timeout(),
        )?);

        let view = Arc::new(ViewSynchronizer::new(Page::Home));
        session.subscribe(view.clone());

        let input = LineInput::stdin();
        let confirm = Self::confirmer(&config, &input);

        Ok(LibraryClient {
            auth: AuthController::new(api.clone(), session.clone()),
            catalog: CatalogController::new(api.clone(), session.clone(), Capability::Member),
            ledger: LedgerController::new(api.clone(), session.clone()),
            admin: AdminConsole::new(api.clone(), session.clone()),
            config,
            session,
            api,
            view,
            input,
            confirm,
            snapshot: None,
            last_query: (String::new(), String::new()),
            last_admin_term: String::new(),
            last_ledger: LedgerScope::Mine,
        })
    }

    /// Read commands and confirmation answers from `input` instead of stdin
    pub fn with_input(mut self, input: LineInput) -> Self {
        self.confirm = Self::confirmer(&self.config, &input);
        self.input = input;
        self
    }

    fn confirmer(config: &ClientConfig, input: &LineInput) -> Box<dyn Confirm + Send + Sync> {
        if config.assume_yes {
            Box::new(AssumeYes)
        } else {
            Box::new(PromptConfirm::new(input.clone()))
        }
    }

    /// Load the persisted session and compute the initial view
    pub fn restore(&self) -> ViewState {
        let current = self.session.current();
        match &current {
            Some(session) => log::info!("Restored session for {}", session.user.email),
            None => log::info!("No stored session"),
        }
        self.view.sync(current.as_ref())
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn api(&self) -> &Arc<ServerApi> {
        &self.api
    }

    pub fn view(&self) -> ViewState {
        self.view.state()
    }

    pub fn auth(&self) -> &AuthController {
        &self.auth
    }

    pub fn catalog(&self) -> &CatalogController {
        &self.catalog
    }

    pub fn ledger(&self) -> &LedgerController {
        &self.ledger
    }

    pub fn admin(&self) -> &AdminConsole {
        &self.admin
    }

    /// Navigate, returning the rendered chrome when the page is not shown
    fn enter(&self, page: Page) -> Option<String> {
        let state = self.view.navigate(page);
        if state.page != page || state.gate != Gate::Render {
            return Some(render::chrome(&state));
        }
        None
    }

    async fn list_catalog(&mut self, term: &str, category: &str) -> String {
        match self.catalog.list_books(term, category).await {
            Ok(view) => {
                let text = render::catalog(&view);
                self.last_query = (view.term.clone(), view.category.clone());
                self.snapshot = Some(view);
                text
            }
            Err(e) => {
                log::debug!("Catalog load failed: {}", e);
                crate::catalog::LOAD_FAILURE.to_string()
            }
        }
    }

    async fn list_admin_books(&mut self, term: &str) -> Result<String> {
        let view = self.admin.list_books(term).await?;
        self.last_admin_term = view.term.clone();
        if view.is_empty() {
            return Ok("No books found".to_string());
        }
        Ok(view
            .books
            .iter()
            .map(render::admin_book_row)
            .collect::<Vec<_>>()
            .join("\n"))
    }

    async fn show_ledger(&mut self, scope: LedgerScope) -> Result<String> {
        let view = match scope {
            LedgerScope::Mine => self.ledger.load_mine().await?,
            LedgerScope::All => self.ledger.load_all().await?,
        };
        self.last_ledger = scope;
        Ok(render::ledger(&view))
    }

    /// Re-run whatever query the mutation invalidated
    async fn resync(&mut self, resync: Resync) -> Result<String> {
        log::debug!("Resync {:?}", resync);
        match resync {
            Resync::Catalog => {
                let (term, category) = self.last_query.clone();
                Ok(self.list_catalog(&term, &category).await)
            }
            Resync::Ledger => self.show_ledger(self.last_ledger).await,
            Resync::CatalogAndStats => {
                let term = self.last_admin_term.clone();
                let table = self.list_admin_books(&term).await?;
                let stats = self.admin.stats().await?;
                Ok(format!("{}\n{}", render::admin_stats(&stats), table))
            }
        }
    }

    async fn finish<T>(&mut self, outcome: Mutation<T>, done: String) -> Result<String> {
        match outcome.resync() {
            Some(resync) => {
                let refreshed = self.resync(resync).await?;
                Ok(format!("{}\n{}", done, refreshed))
            }
            None => Ok("Cancelled".to_string()),
        }
    }

    /// Run one command and return what to print
    pub async fn execute(&mut self, command: Command) -> Result<String> {
        match command {
            Command::Help => Ok(cli::HELP.to_string()),
            Command::Quit => Ok("Goodbye!".to_string()),
            Command::Login { email, password } => {
                self.auth.login(&email, &password).await?;
                Ok(render::chrome(&self.view.state()))
            }
            Command::Register {
                name,
                email,
                password,
            } => match self.auth.register(&name, &email, &password).await? {
                RegisterOutcome::LoggedIn(_) => Ok(render::chrome(&self.view.state())),
                RegisterOutcome::RegisteredPleaseLogin => {
                    Ok("Registration successful! Please login.".to_string())
                }
            },
            Command::Logout => {
                self.auth.logout()?;
                self.snapshot = None;
                Ok(render::chrome(&self.view.navigate(Page::Home)))
            }
            Command::WhoAmI => Ok(render::chrome(&self.view.state())),
            Command::Health => {
                let status = self.auth.probe_backend().await;
                Ok(format!("Backend: {}", status.label()))
            }
            Command::Books { term, category } => {
                self.view.navigate(Page::Home);
                Ok(self.list_catalog(&term, &category).await)
            }
            Command::Borrow(book_id) => {
                if self.session.token().is_none() {
                    return Err(ClientError::Unauthenticated);
                }
                if self.snapshot.is_none() {
                    let (term, category) = self.last_query.clone();
                    self.list_catalog(&term, &category).await;
                }
                let snapshot = self
                    .snapshot
                    .clone()
                    .ok_or_else(|| ClientError::Validation(crate::catalog::LOAD_FAILURE.to_string()))?;
                let outcome = self
                    .catalog
                    .borrow(book_id, &snapshot, self.confirm.as_ref())
                    .await?;
                let done = match &outcome {
                    Mutation::Done { value, .. } => format!(
                        "Book borrowed successfully! Due date: {}",
                        render::format_date(value.due_date, true)
                    ),
                    Mutation::Cancelled => String::new(),
                };
                self.finish(outcome, done).await
            }
            Command::Borrows => {
                if let Some(redirect) = self.enter(Page::Borrows) {
                    return Ok(redirect);
                }
                self.show_ledger(LedgerScope::Mine).await
            }
            Command::Return(borrow_id) => {
                let outcome = self
                    .ledger
                    .return_book(borrow_id, self.confirm.as_ref())
                    .await?;
                let done = match &outcome {
                    Mutation::Done { value, .. } => value
                        .clone()
                        .unwrap_or_else(|| "Book returned successfully!".to_string()),
                    Mutation::Cancelled => String::new(),
                };
                self.finish(outcome, done).await
            }
            Command::AdminBooks(term) => {
                if let Some(redirect) = self.enter(Page::Admin) {
                    return Ok(redirect);
                }
                self.list_admin_books(&term).await
            }
            Command::Add(fields) => {
                let draft = cli::draft_from_fields(&fields, None)?;
                let outcome = self.admin.create_book(draft).await?;
                self.finish(outcome, "Book added successfully!".to_string()).await
            }
            Command::Edit(book_id, fields) => {
                let current = self.admin.book(book_id).await?;
                let draft = cli::draft_from_fields(&fields, Some(&current))?;
                let outcome = self.admin.update_book(book_id, draft).await?;
                self.finish(outcome, "Book updated successfully!".to_string()).await
            }
            Command::Delete(book_id) => {
                let outcome = self.admin.delete_book(book_id, self.confirm.as_ref()).await?;
                self.finish(outcome, "Book deleted successfully!".to_string()).await
            }
            Command::Stats => {
                if let Some(redirect) = self.enter(Page::Admin) {
                    return Ok(redirect);
                }
                let stats = self.admin.stats().await?;
                Ok(render::admin_stats(&stats))
            }
            Command::Activity => {
                if let Some(redirect) = self.enter(Page::Admin) {
                    return Ok(redirect);
                }
                let activity = self.ledger.recent_activity(RECENT_ACTIVITY_LIMIT).await?;
                Ok(render::recent_activity(&activity))
            }
            Command::AllBorrows => {
                if let Some(redirect) = self.enter(Page::Admin) {
                    return Ok(redirect);
                }
                self.show_ledger(LedgerScope::All).await
            }
            Command::Users => {
                if let Some(redirect) = self.enter(Page::Admin) {
                    return Ok(redirect);
                }
                let users = self.admin.users().await?;
                Ok(render::users(&users))
            }
        }
    }

    /// Run the interactive loop until `/quit` or EOF
    pub async fn run(&mut self) -> Result<()> {
        println!("{}", render::chrome(&self.restore()));
        println!("Backend: {}", self.auth.probe_backend().await.label());
        println!("Type /help for commands");

        while let Some(line) = self.input.next_line("> ").await? {
            if line.trim().is_empty() {
                continue;
            }
            let command = match cli::parse_command(&line) {
                Ok(command) => command,
                Err(e) => {
                    println!("{}", e.user_message());
                    continue;
                }
            };
            let quit = command == Command::Quit;

            match self.execute(command).await {
                Ok(output) => println!("{}", output),
                Err(e) => {
                    log::debug!("Command failed: {}", e);
                    println!("{}", e.user_message());
                    if e.needs_login() {
                        println!("Use /login <email> <password> or /register to continue");
                    }
                }
            }
            if quit {
                break;
            }
        }
        Ok(())
    }
}
