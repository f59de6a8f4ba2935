//! Dashboard aggregates.

use chrono::Datelike;
use serde::Serialize;

use booknest_core::{BookId, Money};

use crate::models::{Book, RemoteOrder};

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const RECENT_ORDERS: usize = 5;
const TOP_SELLERS: usize = 5;

/// Headline numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardTotals {
    /// Σ price × quantity over every item of every order.
    pub revenue: Money,
    pub orders: usize,
    pub customers: usize,
    pub books: usize,
    pub subscribers: usize,
}

/// A book ranked by copies sold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopSeller {
    pub book_id: Option<BookId>,
    pub name: String,
    pub image: String,
    pub quantity: u64,
}

/// Sales for one calendar month, all years combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthlySales {
    pub month: &'static str,
    pub sales: Money,
}

/// Number of catalog books in one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub name: String,
    pub count: usize,
}

/// Everything the admin dashboard shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub totals: DashboardTotals,
    /// Newest first.
    pub recent_orders: Vec<RemoteOrder>,
    pub top_sellers: Vec<TopSeller>,
    /// January to December.
    pub monthly_sales: Vec<MonthlySales>,
    /// In order of first appearance in the catalog.
    pub categories: Vec<CategoryCount>,
}

impl DashboardStats {
    /// Aggregate the fetched collections.
    #[must_use]
    pub fn compute(
        books: &[Book],
        orders: &[RemoteOrder],
        customers: usize,
        subscribers: usize,
    ) -> Self {
        let revenue = orders.iter().map(RemoteOrder::items_total).sum();

        let mut recent: Vec<&RemoteOrder> = orders.iter().collect();
        recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let recent_orders = recent.into_iter().take(RECENT_ORDERS).cloned().collect();

        Self {
            totals: DashboardTotals {
                revenue,
                orders: orders.len(),
                customers,
                books: books.len(),
                subscribers,
            },
            recent_orders,
            top_sellers: top_sellers(orders),
            monthly_sales: monthly_sales(orders),
            categories: categories(books),
        }
    }
}

fn top_sellers(orders: &[RemoteOrder]) -> Vec<TopSeller> {
    let mut sellers: Vec<TopSeller> = Vec::new();
    for item in orders.iter().flat_map(|o| &o.items) {
        let existing = sellers.iter_mut().find(|s| match (&s.book_id, &item.book_id) {
            (Some(a), Some(b)) => a == b,
            (None, None) => s.name == item.name,
            _ => false,
        });
        match existing {
            Some(seller) => seller.quantity += u64::from(item.quantity),
            None => sellers.push(TopSeller {
                book_id: item.book_id.clone(),
                name: item.name.clone(),
                image: item.image.clone(),
                quantity: u64::from(item.quantity),
            }),
        }
    }
    // Stable: ties keep first-seen order.
    sellers.sort_by(|a, b| b.quantity.cmp(&a.quantity));
    sellers.truncate(TOP_SELLERS);
    sellers
}

fn monthly_sales(orders: &[RemoteOrder]) -> Vec<MonthlySales> {
    let mut totals = [Money::ZERO; 12];
    for order in orders {
        let Some(created_at) = order.created_at else {
            continue;
        };
        let index = created_at.month0() as usize;
        if let Some(slot) = totals.get_mut(index) {
            *slot = *slot + order.items_total();
        }
    }
    MONTHS
        .into_iter()
        .zip(totals)
        .map(|(month, sales)| MonthlySales { month, sales })
        .collect()
}

fn categories(books: &[Book]) -> Vec<CategoryCount> {
    let mut counts: Vec<CategoryCount> = Vec::new();
    for book in books {
        let name = if book.category.trim().is_empty() {
            "Other"
        } else {
            book.category.as_str()
        };
        match counts.iter_mut().find(|c| c.name == name) {
            Some(entry) => entry.count += 1,
            None => counts.push(CategoryCount {
                name: name.to_string(),
                count: 1,
            }),
        }
    }
    counts
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn orders() -> Vec<RemoteOrder> {
        serde_json::from_str(
            r#"[
            {"_id":"o1","createdAt":"2026-01-10T00:00:00Z",
             "items":[{"_id":"b1","name":"Dune","price":10,"quantity":2},
                      {"_id":"b2","name":"Emma","price":5,"quantity":1}]},
            {"_id":"o2","createdAt":"2026-03-02T00:00:00Z",
             "items":[{"_id":"b2","name":"Emma","price":5,"quantity":4}]},
            {"_id":"o3","createdAt":"2025-03-20T00:00:00Z",
             "items":[{"_id":"b3","name":"Ulysses","price":20,"quantity":1}]},
            {"_id":"o4","items":[]}
        ]"#,
        )
        .unwrap()
    }

    fn books() -> Vec<Book> {
        serde_json::from_str(
            r#"[{"_id":"b1","name":"Dune","price":10,"category":"Sci-Fi"},
                {"_id":"b2","name":"Emma","price":5,"category":"Classic"},
                {"_id":"b3","name":"Ulysses","price":20,"category":"Classic"},
                {"_id":"b4","name":"Untitled","price":1}]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_totals() {
        let stats = DashboardStats::compute(&books(), &orders(), 7, 3);
        assert_eq!(stats.totals.revenue, Money::from_cents(2500 + 2000 + 2000));
        assert_eq!(stats.totals.orders, 4);
        assert_eq!(stats.totals.customers, 7);
        assert_eq!(stats.totals.books, 4);
        assert_eq!(stats.totals.subscribers, 3);
    }

    #[test]
    fn test_recent_orders_newest_first() {
        let stats = DashboardStats::compute(&books(), &orders(), 0, 0);
        let ids: Vec<_> = stats.recent_orders.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, ["o2", "o1", "o3", "o4"]);
    }

    #[test]
    fn test_top_sellers() {
        let stats = DashboardStats::compute(&books(), &orders(), 0, 0);
        let ranking: Vec<_> = stats
            .top_sellers
            .iter()
            .map(|s| (s.name.as_str(), s.quantity))
            .collect();
        assert_eq!(ranking, [("Emma", 5), ("Dune", 2), ("Ulysses", 1)]);
    }

    #[test]
    fn test_monthly_sales_merge_years() {
        let stats = DashboardStats::compute(&books(), &orders(), 0, 0);
        assert_eq!(stats.monthly_sales.len(), 12);
        assert_eq!(stats.monthly_sales[0].month, "Jan");
        assert_eq!(stats.monthly_sales[0].sales, Money::from_cents(2500));
        assert_eq!(stats.monthly_sales[2].sales, Money::from_cents(4000));
        assert_eq!(stats.monthly_sales[11].sales, Money::ZERO);
    }

    #[test]
    fn test_categories_default_other() {
        let stats = DashboardStats::compute(&books(), &[], 0, 0);
        assert_eq!(
            stats.categories,
            vec![
                CategoryCount {
                    name: "Sci-Fi".to_string(),
                    count: 1
                },
                CategoryCount {
                    name: "Classic".to_string(),
                    count: 2
                },
                CategoryCount {
                    name: "Other".to_string(),
                    count: 1
                },
            ]
        );
    }
}
