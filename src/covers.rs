//! Cover image resolution.
//!
//! Purely cosmetic and fully deterministic: the same book always gets the
//! same picture, and a broken image falls back to the default without
//! another lookup.

use crate::models::Book;

pub const DEFAULT_COVER: &str =
    "https://images.unsplash.com/photo-1519682337058-a94d519337bc?w=400&h=500&fit=fill&crop=faces";

const COVERS: &[&str] = &[
    "https://images.unsplash.com/photo-1544947950-fa07a98d237f?w=400&h=500&fit=fill&crop=faces",
    "https://images.unsplash.com/photo-1512820790803-83ca734da794?w=400&h=500&fit=fill&crop=faces",
    "https://images.unsplash.com/photo-1532012197267-da84d127e765?w=400&h=500&fit=fill&crop=faces",
    "https://images.unsplash.com/photo-1507003211169-0a1dd7228f2d?w=400&h=500&fit=fill&crop=faces",
    "https://images.unsplash.com/photo-1541963463532-d68292c34b19?w=400&h=500&fit=fill&crop=faces",
    "https://images.unsplash.com/photo-1554224155-8d04cb21cd6c?w=400&h=500&fit=fill&crop=faces",
    "https://images.unsplash.com/photo-1532094349884-543bc11b234d?w=400&h=500&fit=fill&crop=faces",
    "https://images.unsplash.com/photo-1517077304055-6e89abbf09b0?w=400&h=500&fit=fill&crop=faces",
    "https://images.unsplash.com/photo-1635070041078-e363dbe005cb?w=400&h=500&fit=fill&crop=faces",
    "https://images.unsplash.com/photo-1532187863486-abf9dbad1b69?w=400&h=500&fit=fill&crop=faces",
    "https://images.unsplash.com/photo-1516979187457-637abb4f9353?w=400&h=500&fit=fill&crop=faces",
    "https://images.unsplash.com/photo-1481627834876-b7833e8f5570?w=400&h=500&fit=fill&crop=faces",
    "https://images.unsplash.com/photo-1506880018603-83d5b814b5a6?w=400&h=500&fit=fill&crop=faces",
    "https://images.unsplash.com/photo-1524995997946-a1c2e315a42f?w=400&h=500&fit=fill&crop=faces",
    "https://images.unsplash.com/photo-1518373714866-3f1478910cc0?w=400&h=500&fit=fill&crop=faces",
];

const CATEGORY_COVERS: &[(&str, usize)] = &[
    ("Fiction", 10),
    ("African Literature", 10),
    ("Science Fiction", 3),
    ("Biography", 4),
    ("Mystery", 1),
    ("Thriller", 2),
    ("Romance", 5),
    ("Self-Help", 6),
    ("Business", 4),
    ("History", 3),
    ("Science", 7),
    ("Poetry", 8),
    ("Drama", 9),
    ("Computer Science", 7),
    ("Mathematics", 8),
    ("Chemistry", 9),
];

/// Resolved cover with its client-side fallback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverImage {
    pub url: &'static str,
    pub fallback: &'static str,
}

impl CoverImage {
    /// URL to show after the primary image failed to load
    pub fn on_error(&self) -> &'static str {
        self.fallback
    }
}

/// ISBN first, then the category (known name, else hashed), then the default
pub fn resolve(book: &Book) -> CoverImage {
    let isbn = book.isbn.trim();
    let url = if !isbn.is_empty() {
        COVERS[index_for(isbn)]
    } else {
        match book.category.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            Some(category) => CATEGORY_COVERS
                .iter()
                .find(|(name, _)| *name == category)
                .map(|(_, idx)| COVERS[*idx])
                .unwrap_or_else(|| COVERS[index_for(category)]),
            None => DEFAULT_COVER,
        }
    };

    CoverImage {
        url,
        fallback: DEFAULT_COVER,
    }
}

// FNV-1a; stable across runs and platforms
fn index_for(key: &str) -> usize {
    let mut hash: u32 = 0x811c_9dc5;
    for byte in key.bytes() {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(0x0100_0193);
    }
    hash as usize % COVERS.len()
}
