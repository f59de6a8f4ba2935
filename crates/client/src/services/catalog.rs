//! Public catalog browsing.

use std::sync::Arc;

use booknest_core::BookId;

use super::admin::search_books;
use crate::api::CatalogApi;
use crate::error::Result;
use crate::models::Book;

/// Read-only access to the book catalog.
#[derive(Clone)]
pub struct CatalogService {
    api: Arc<dyn CatalogApi>,
}

impl std::fmt::Debug for CatalogService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogService").finish_non_exhaustive()
    }
}

impl CatalogService {
    #[must_use]
    pub fn new(api: Arc<dyn CatalogApi>) -> Self {
        Self { api }
    }

    /// # Errors
    ///
    /// Backend failures.
    pub async fn list(&self) -> Result<Vec<Book>> {
        Ok(self.api.list_books().await?)
    }

    /// # Errors
    ///
    /// `NotFound` for unknown ids, otherwise backend failures.
    pub async fn get(&self, id: &BookId) -> Result<Book> {
        Ok(self.api.get_book(id).await?)
    }

    /// Books whose name, author or category contains `term`.
    ///
    /// # Errors
    ///
    /// Backend failures.
    pub async fn search(&self, term: &str) -> Result<Vec<Book>> {
        let books = self.list().await?;
        Ok(search_books(&books, term).into_iter().cloned().collect())
    }
}
