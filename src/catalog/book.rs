//! Book record
//!
//! The single record type flowing through the provider pipeline, the wire
//! and the client. Field `genre` is the catalog category.

use serde::{Deserialize, Serialize, Serializer};

/// A catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    /// Sequential identifier, 1..=N within one generated corpus
    pub id: u64,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub year: i32,
    /// Price on the cent grid, serialized with 2 decimal places
    #[serde(serialize_with = "serialize_price")]
    pub price: f64,
}

impl Book {
    pub fn new(
        id: u64,
        title: impl Into<String>,
        author: impl Into<String>,
        genre: impl Into<String>,
        year: i32,
        price: f64,
    ) -> Self {
        Book {
            id,
            title: title.into(),
            author: author.into(),
            genre: genre.into(),
            year,
            price,
        }
    }
}

/// Round a price to the cent grid.
pub fn round_price(price: f64) -> f64 {
    (price * 100.0).round() / 100.0
}

fn serialize_price<S>(price: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64(round_price(*price))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_field_names() {
        let book = Book::new(7, "Книга №7", "Чехов А.П.", "Драма", 1901, 250.5);
        let json = serde_json::to_value(&book).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["genre"], "Драма");
        assert_eq!(json["year"], 1901);
        assert!(json.get("category").is_none());
    }

    #[test]
    fn test_price_serialized_with_two_decimals() {
        let book = Book::new(1, "t", "a", "g", 1900, 123.456_789);
        let json = serde_json::to_string(&book).unwrap();
        assert!(json.contains("\"price\":123.46"), "got {}", json);
    }

    #[test]
    fn test_round_price() {
        assert_eq!(round_price(100.004), 100.0);
        assert_eq!(round_price(999.994), 999.99);
    }
}
