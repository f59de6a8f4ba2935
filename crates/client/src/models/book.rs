//! Catalog book types.

use serde::{Deserialize, Serialize};

use booknest_core::{BookId, Money};

use super::Keyed;

/// A catalog entry as returned by `GET /book`.
///
/// Wishlist entries are stored as plain copies of this type; cart lines wrap
/// it with a quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    #[serde(rename = "_id", alias = "id")]
    pub id: BookId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub author: String,
    pub price: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<Money>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<u8>,
}

impl Book {
    /// Case-insensitive substring match over name, author and category.
    #[must_use]
    pub fn matches(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        [&self.name, &self.author, &self.category]
            .iter()
            .any(|field| field.to_lowercase().contains(&term))
    }
}

impl Keyed for Book {
    type Key = BookId;

    fn key(&self) -> &BookId {
        &self.id
    }
}

/// Body for `POST /book` and `PUT /book/:id`.
///
/// Build it from admin form input and call
/// [`validate`](crate::services::validation::validate_book_draft) before sending.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookDraft {
    pub name: String,
    pub author: String,
    pub price: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<Money>,
    pub category: String,
    pub image: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<u8>,
}

impl From<&Book> for BookDraft {
    fn from(book: &Book) -> Self {
        Self {
            name: book.name.clone(),
            author: book.author.clone(),
            price: book.price,
            original_price: book.original_price,
            category: book.category.clone(),
            image: book.image.clone(),
            description: book.description.clone(),
            rating: book.rating,
            discount: book.discount,
        }
    }
}
