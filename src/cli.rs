//! CLI interface for the library client
//!
//! Command parsing, book-form parsing, confirmation prompts and the async
//! line reader shared by the main loop and those prompts.

use crate::actions::Confirm;
use crate::error::{ClientError, Result};
use crate::models::{Book, BookDraft};
use futures::future::BoxFuture;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::Mutex;

pub const HELP: &str = "\
Commands:
  /login <email> <password>            Log in
  /register <name> <email> <password>  Create an account and log in
  /logout                              Log out
  /books                               List every book
  /search <term>                       Search title, author and category
  /filter <category>                   Show one category
  /borrow <book id>                    Borrow a book from the last listing
  /borrows                             Your current loans and history
  /return <borrow id>                  Return a borrowed book
  /admin-books [term]                  Admin book table (ISBN searchable)
  /add title|author|isbn|category|description|total|available
  /edit <id> title|author|isbn|category|description|total|available
                                       Blank fields keep their current value
  /delete <book id>                    Delete a book
  /stats                               Admin dashboard counters
  /activity                            Latest borrowings and returns
  /all-borrows                         Every user's borrows
  /users                               Registered users
  /whoami                              Current session
  /health                              Backend status
  /help                                This text
  /quit                                Exit";

/// Number of `|`-separated fields in a book form
const FORM_FIELDS: usize = 7;

/// Command types for CLI
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Login { email: String, password: String },
    Register { name: String, email: String, password: String },
    Logout,
    Books { term: String, category: String },
    Borrow(i64),
    Borrows,
    Return(i64),
    AdminBooks(String),
    Add(Vec<String>),
    Edit(i64, Vec<String>),
    Delete(i64),
    Stats,
    Activity,
    AllBorrows,
    Users,
    WhoAmI,
    Health,
    Help,
    Quit,
}

fn usage(text: &str) -> ClientError {
    ClientError::InvalidCommand(format!("Usage: {}", text))
}

fn parse_id(arg: &str, text: &str) -> Result<i64> {
    arg.trim().parse().map_err(|_| usage(text))
}

fn split_form(rest: &str) -> Vec<String> {
    rest.split('|').map(|f| f.trim().to_string()).collect()
}

/// Parse a command from user input
pub fn parse_command(input: &str) -> Result<Command> {
    let input = input.trim();
    let (name, rest) = match input.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (input, ""),
    };
    let args: Vec<&str> = rest.split_whitespace().collect();

    let command = match name {
        "/quit" | "/exit" => Command::Quit,
        "/help" => Command::Help,
        "/logout" => Command::Logout,
        "/whoami" => Command::WhoAmI,
        "/health" => Command::Health,
        "/login" => match args.as_slice() {
            [email, password] => Command::Login {
                email: email.to_string(),
                password: password.to_string(),
            },
            _ => return Err(usage("/login <email> <password>")),
        },
        "/register" => {
            // The name may contain spaces; email and password are the last two words
            if args.len() < 3 {
                return Err(usage("/register <name> <email> <password>"));
            }
            let (name_parts, creds) = args.split_at(args.len() - 2);
            Command::Register {
                name: name_parts.join(" "),
                email: creds[0].to_string(),
                password: creds[1].to_string(),
            }
        }
        "/books" => Command::Books {
            term: String::new(),
            category: String::new(),
        },
        "/search" => Command::Books {
            term: rest.to_string(),
            category: String::new(),
        },
        "/filter" => Command::Books {
            term: String::new(),
            category: rest.to_string(),
        },
        "/borrow" => Command::Borrow(parse_id(rest, "/borrow <book id>")?),
        "/borrows" => Command::Borrows,
        "/return" => Command::Return(parse_id(rest, "/return <borrow id>")?),
        "/admin-books" => Command::AdminBooks(rest.to_string()),
        "/add" => {
            let fields = split_form(rest);
            if fields.len() != FORM_FIELDS {
                return Err(usage("/add title|author|isbn|category|description|total|available"));
            }
            Command::Add(fields)
        }
        "/edit" => {
            let text = "/edit <id> title|author|isbn|category|description|total|available";
            let (id, form) = rest.split_once(char::is_whitespace).ok_or_else(|| usage(text))?;
            let fields = split_form(form);
            if fields.len() != FORM_FIELDS {
                return Err(usage(text));
            }
            Command::Edit(parse_id(id, text)?, fields)
        }
        "/delete" => Command::Delete(parse_id(rest, "/delete <book id>")?),
        "/stats" => Command::Stats,
        "/activity" => Command::Activity,
        "/all-borrows" => Command::AllBorrows,
        "/users" => Command::Users,
        _ => {
            return Err(ClientError::InvalidCommand(format!(
                "Unknown command: {} (try /help)",
                input
            )))
        }
    };
    Ok(command)
}

fn parse_count(value: &str, base: Option<i64>) -> Result<i64> {
    match (value.is_empty(), base) {
        (true, Some(current)) => Ok(current),
        (true, None) => Ok(0),
        (false, _) => value.parse().map_err(|_| {
            ClientError::InvalidCommand("Copy counts must be whole numbers".to_string())
        }),
    }
}

/// Build a draft from form fields. Blank fields take the value from `base`.
pub fn draft_from_fields(fields: &[String], base: Option<&Book>) -> Result<BookDraft> {
    if fields.len() != FORM_FIELDS {
        return Err(ClientError::InvalidCommand(format!(
            "Expected {} fields, got {}",
            FORM_FIELDS,
            fields.len()
        )));
    }
    let text = |i: usize, current: Option<&str>| -> String {
        if fields[i].is_empty() {
            current.unwrap_or_default().to_string()
        } else {
            fields[i].clone()
        }
    };
    let optional = |value: String| if value.is_empty() { None } else { Some(value) };

    Ok(BookDraft {
        title: text(0, base.map(|b| b.title.as_str())),
        author: text(1, base.map(|b| b.author.as_str())),
        isbn: text(2, base.map(|b| b.isbn.as_str())),
        category: optional(text(3, base.and_then(|b| b.category.as_deref()))),
        description: optional(text(4, base.and_then(|b| b.description.as_deref()))),
        total_copies: parse_count(&fields[5], base.map(|b| b.total_copies))?,
        available_copies: parse_count(&fields[6], base.map(|b| b.available_copies))?,
    })
}

type LineSource = Box<dyn AsyncBufRead + Unpin + Send>;

/// Line-oriented input shared by the command loop and confirmation prompts
///
/// Both must read through the same buffer: a second handle on stdin would
/// miss lines the first one has already buffered when input is piped.
#[derive(Clone)]
pub struct LineInput {
    reader: Arc<Mutex<LineSource>>,
}

impl LineInput {
    pub fn new<R>(reader: R) -> Self
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        LineInput {
            reader: Arc::new(Mutex::new(Box::new(reader))),
        }
    }

    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }

    /// Print `prompt` and read the next line
    pub async fn next_line(&self, prompt: &str) -> Result<Option<String>> {
        let mut reader = self.reader.lock().await;
        read_line_async(&mut *reader, prompt).await
    }
}

/// Asks on the terminal and waits for y/n on the shared input
pub struct PromptConfirm {
    input: LineInput,
}

impl PromptConfirm {
    pub fn new(input: LineInput) -> Self {
        PromptConfirm { input }
    }
}

impl Confirm for PromptConfirm {
    fn confirm<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, bool> {
        Box::pin(async move {
            match self.input.next_line(&format!("{} [y/N] ", prompt)).await {
                Ok(Some(answer)) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
                Ok(None) => false,
                Err(e) => {
                    log::warn!("Failed to read confirmation: {}", e);
                    false
                }
            }
        })
    }
}

/// Async line reader that yields one line at a time
///
/// Prints the prompt and flushes stdout before waiting for input.
///
/// # Returns
/// - `Ok(Some(line))` - User entered a line
/// - `Ok(None)` - EOF reached (Ctrl+D)
/// - `Err(e)` - I/O error
pub async fn read_line_async<R>(reader: &mut R, prompt: &str) -> Result<Option<String>>
where
    R: AsyncBufRead + Unpin + ?Sized,
{
    print!("{}", prompt);
    std::io::stdout().flush()?;

    let mut line = String::new();
    match reader.read_line(&mut line).await {
        Ok(0) => Ok(None), // EOF
        Ok(_) => {
            if line.ends_with('\n') {
                line.pop();
                if line.ends_with('\r') {
                    line.pop();
                }
            }
            Ok(Some(line))
        }
        Err(e) => Err(e.into()),
    }
}
