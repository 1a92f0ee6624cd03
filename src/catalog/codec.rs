//! Record Codec
//!
//! Flat comma-delimited text form of a `Book`:
//!
//! ```text
//! id,title,author,genre,year,price
//! 17,Книга №17,Чехов А.П.,Драма,1893,412.07
//! ```
//!
//! There is no quoting. A comma inside a text field shifts every following
//! field, and `decode` rejects the line. Prices are written with 2 decimal
//! digits, so the round trip is exact only for prices on the cent grid.

use super::book::Book;

pub const DELIMITER: char = ',';
const FIELD_COUNT: usize = 6;
const FIELD_NAMES: [&str; FIELD_COUNT] = ["id", "title", "author", "genre", "year", "price"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Line did not split into exactly six fields
    FieldCount { expected: usize, found: usize },
    /// A numeric field did not parse
    InvalidField { field: &'static str, value: String },
}

impl std::fmt::Display for CodecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodecError::FieldCount { expected, found } => {
                write!(f, "Expected {} fields, found {}", expected, found)
            }
            CodecError::InvalidField { field, value } => {
                write!(f, "Invalid value for field '{}': {:?}", field, value)
            }
        }
    }
}

impl std::error::Error for CodecError {}

pub fn encode(book: &Book) -> String {
    format!(
        "{},{},{},{},{},{:.2}",
        book.id, book.title, book.author, book.genre, book.year, book.price
    )
}

pub fn decode(line: &str) -> Result<Book, CodecError> {
    let parts: Vec<&str> = line.split(DELIMITER).collect();
    if parts.len() != FIELD_COUNT {
        return Err(CodecError::FieldCount {
            expected: FIELD_COUNT,
            found: parts.len(),
        });
    }

    Ok(Book {
        id: parse_field(parts[0], 0)?,
        title: parts[1].to_string(),
        author: parts[2].to_string(),
        genre: parts[3].to_string(),
        year: parse_field(parts[4], 4)?,
        price: parse_field(parts[5], 5)?,
    })
}

/// Encode then decode. Functionally the identity on well-formed records.
pub fn round_trip(book: &Book) -> Result<Book, CodecError> {
    decode(&encode(book))
}

fn parse_field<T: std::str::FromStr>(raw: &str, index: usize) -> Result<T, CodecError> {
    raw.parse().map_err(|_| CodecError::InvalidField {
        field: FIELD_NAMES[index],
        value: raw.to_string(),
    })
}
