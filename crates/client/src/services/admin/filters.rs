//! Back-office list filters.

use std::str::FromStr;

use chrono::{DateTime, Months, TimeDelta, Utc};

use booknest_core::OrderStatus;

use crate::api::Subscriber;
use crate::models::{Book, RemoteOrder};

/// Creation-date window for admin lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateWindow {
    /// Since midnight (UTC) today.
    Today,
    /// The last seven days.
    Week,
    /// The last calendar month.
    Month,
    #[default]
    All,
}

impl DateWindow {
    /// Earliest timestamp inside the window, or `None` for no bound.
    #[must_use]
    pub fn start(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::Today => now
                .date_naive()
                .and_hms_opt(0, 0, 0)
                .map(|midnight| midnight.and_utc()),
            Self::Week => Some(now - TimeDelta::days(7)),
            Self::Month => now.checked_sub_months(Months::new(1)),
            Self::All => None,
        }
    }

    /// Whether `at` falls inside the window. Undated entries only match
    /// [`DateWindow::All`].
    #[must_use]
    pub fn contains(self, at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        match self.start(now) {
            None => true,
            Some(start) => at.is_some_and(|at| at >= start),
        }
    }
}

impl FromStr for DateWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "today" => Ok(Self::Today),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "all" => Ok(Self::All),
            other => Err(format!("invalid date window: {other}")),
        }
    }
}

/// Books whose name, author or category contains `term`.
#[must_use]
pub fn search_books<'a>(books: &'a [Book], term: &str) -> Vec<&'a Book> {
    books.iter().filter(|book| book.matches(term)).collect()
}

/// Order list filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFilter {
    /// `None` matches every status.
    pub status: Option<OrderStatus>,
    pub window: DateWindow,
    /// Matched against order number, customer name and e-mail, and city.
    pub search: String,
}

impl OrderFilter {
    #[must_use]
    pub fn matches(&self, order: &RemoteOrder, now: DateTime<Utc>) -> bool {
        if self
            .status
            .is_some_and(|status| order.status_or_pending() != status)
        {
            return false;
        }
        if !self.window.contains(order.created_at, now) {
            return false;
        }

        let term = self.search.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        let customer = order.user.as_ref();
        let city = order
            .shipping_address
            .as_ref()
            .and_then(|a| a.city.as_deref());
        [
            Some(order.display_id()),
            customer.and_then(|c| c.name.as_deref()),
            customer.and_then(|c| c.email.as_deref()),
            city,
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&term))
    }

    /// Apply the filter, keeping the input order.
    #[must_use]
    pub fn apply<'a>(&self, orders: &'a [RemoteOrder], now: DateTime<Utc>) -> Vec<&'a RemoteOrder> {
        orders.iter().filter(|o| self.matches(o, now)).collect()
    }
}

/// Subscriber list filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriberFilter {
    pub window: DateWindow,
    /// Matched against the e-mail address.
    pub search: String,
}

impl SubscriberFilter {
    #[must_use]
    pub fn apply<'a>(&self, subscribers: &'a [Subscriber], now: DateTime<Utc>) -> Vec<&'a Subscriber> {
        let term = self.search.trim().to_lowercase();
        subscribers
            .iter()
            .filter(|s| self.window.contains(s.created_at, now))
            .filter(|s| term.is_empty() || s.email.to_lowercase().contains(&term))
            .collect()
    }
}

/// Render subscribers as CSV with an `Email,Subscription Date` header.
#[must_use]
pub fn subscribers_csv<'a>(subscribers: impl IntoIterator<Item = &'a Subscriber>) -> String {
    let mut csv = String::from("Email,Subscription Date\n");
    for subscriber in subscribers {
        let date = subscriber
            .created_at
            .map(|at| at.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        csv.push_str(&subscriber.email);
        csv.push(',');
        csv.push_str(&date);
        csv.push('\n');
    }
    csv
}
