//! Corpus Generator
//!
//! Builds the synthetic catalog from a seeded random sequence. Every call
//! re-seeds, so two calls with the same seed and size yield identical corpora.
//!
//! Draw order per record: author, genre, year, price.

use super::book::Book;
use super::rng::DeterministicRng;

pub const AUTHORS: [&str; 10] = [
    "Толстой Л.Н.",
    "Достоевский Ф.М.",
    "Пушкин А.С.",
    "Чехов А.П.",
    "Булгаков М.А.",
    "Тургенев И.С.",
    "Гоголь Н.В.",
    "Лермонтов М.Ю.",
    "Горький М.",
    "Шолохов М.А.",
];

pub const GENRES: [&str; 5] = ["Роман", "Повесть", "Рассказ", "Драма", "Поэма"];

pub const SEED_DEFAULT: u64 = 42;
pub const CORPUS_SIZE_DEFAULT: usize = 200_000;

pub const YEAR_MIN: i32 = 1800;
pub const YEAR_MAX: i32 = 2024;
const PRICE_MIN_CENTS: u64 = 10_000;
const PRICE_SPAN_CENTS: u64 = 90_000;

/// Error raised when the corpus cannot be materialized
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerateError {
    /// The allocator refused the corpus buffer
    Allocation { requested: usize },
}

impl std::fmt::Display for GenerateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerateError::Allocation { requested } => {
                write!(f, "Cannot allocate corpus of {} books", requested)
            }
        }
    }
}

impl std::error::Error for GenerateError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorpusGenerator {
    seed: u64,
    size: usize,
}

impl Default for CorpusGenerator {
    fn default() -> Self {
        Self::new(SEED_DEFAULT, CORPUS_SIZE_DEFAULT)
    }
}

impl CorpusGenerator {
    pub fn new(seed: u64, size: usize) -> Self {
        CorpusGenerator { seed, size }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Materialize the whole corpus.
    pub fn generate(&self) -> Result<Vec<Book>, GenerateError> {
        let mut books = Vec::new();
        books
            .try_reserve_exact(self.size)
            .map_err(|_| GenerateError::Allocation {
                requested: self.size,
            })?;
        books.extend(self.iter());
        debug_assert_eq!(books.len(), self.size);
        Ok(books)
    }

    /// Lazily produce the same sequence `generate` returns.
    pub fn iter(&self) -> CorpusIter {
        CorpusIter {
            rng: DeterministicRng::new(self.seed),
            next_id: 1,
            size: self.size as u64,
        }
    }
}

pub struct CorpusIter {
    rng: DeterministicRng,
    next_id: u64,
    size: u64,
}

impl Iterator for CorpusIter {
    type Item = Book;

    fn next(&mut self) -> Option<Book> {
        if self.next_id > self.size {
            return None;
        }
        let id = self.next_id;
        self.next_id += 1;

        let author = AUTHORS[self.rng.gen_index(AUTHORS.len())];
        let genre = GENRES[self.rng.gen_index(GENRES.len())];
        let year = YEAR_MIN + self.rng.gen_range(0, (YEAR_MAX - YEAR_MIN + 1) as u64) as i32;
        let cents = PRICE_MIN_CENTS + self.rng.gen_range(0, PRICE_SPAN_CENTS);

        Some(Book {
            id,
            title: format!("Книга №{}", id),
            author: author.to_string(),
            genre: genre.to_string(),
            year,
            price: cents as f64 / 100.0,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.size - (self.next_id - 1)) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for CorpusIter {}
