//! Order history pagination state machine.
//!
//! ```text
//! Idle ──begin_refresh──▶ Loading ──apply──▶ Loaded | Empty | Error
//!                            ▲                  │
//!                            └─begin_next_page──┘ (Loaded, more pages, nothing in flight)
//! ```
//!
//! The machine performs no I/O. A caller takes a [`PageRequest`] from
//! `begin_*`, runs the fetch, and hands the outcome back to
//! [`OrderHistory::apply`] or [`OrderHistory::fail`].
//! Each request carries a token; a completion whose token is no longer the
//! one in flight is stale and dropped.

use std::collections::HashSet;

use tracing::debug;

use stealth_core::OrderId;

use super::OrderHistoryResponse;
use crate::api::ApiError;
use crate::models::Order;

/// Where the history is in its load cycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum HistoryPhase {
    #[default]
    Idle,
    Loading,
    Loaded,
    /// The user has no orders.
    Empty,
    /// The last load failed; already loaded orders are kept.
    Error(String),
}

/// Paging position within the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationState {
    /// Last page applied (1-based), 0 before the first load.
    pub current_page: u32,
    pub total_pages: u32,
    pub page_size: u32,
    pub total_count: u32,
}

impl PaginationState {
    const fn new(page_size: u32) -> Self {
        Self {
            current_page: 0,
            total_pages: 0,
            page_size,
            total_count: 0,
        }
    }

    /// Whether a page after `current_page` exists.
    #[must_use]
    pub const fn has_more_pages(&self) -> bool {
        self.current_page < self.total_pages
    }
}

/// A page load handed out by the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    token: u64,
    /// Page to fetch (1-based).
    pub page: u32,
}

/// Paginated order history for one user.
#[derive(Debug, Clone)]
pub struct OrderHistory {
    phase: HistoryPhase,
    orders: Vec<Order>,
    pagination: PaginationState,
    in_flight: Option<PageRequest>,
    last_token: u64,
    requested_page_size: u32,
}

impl OrderHistory {
    #[must_use]
    pub const fn new(page_size: u32) -> Self {
        Self {
            phase: HistoryPhase::Idle,
            orders: Vec::new(),
            pagination: PaginationState::new(page_size),
            in_flight: None,
            last_token: 0,
            requested_page_size: page_size,
        }
    }

    #[must_use]
    pub const fn phase(&self) -> &HistoryPhase {
        &self.phase
    }

    #[must_use]
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    #[must_use]
    pub const fn pagination(&self) -> PaginationState {
        self.pagination
    }

    #[must_use]
    pub const fn has_more_pages(&self) -> bool {
        self.pagination.has_more_pages()
    }

    /// Whether a request is outstanding.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Start loading page 1.
    ///
    /// Always allowed. Any outstanding request is superseded and its
    /// completion will be dropped.
    pub fn begin_refresh(&mut self) -> PageRequest {
        if let Some(previous) = self.in_flight {
            debug!(page = previous.page, "Superseding in-flight history request");
        }
        self.issue(1)
    }

    /// Start loading the next page.
    ///
    /// Returns `None` unless the history is `Loaded`, has more pages and has
    /// nothing in flight.
    pub fn begin_next_page(&mut self) -> Option<PageRequest> {
        if self.phase != HistoryPhase::Loaded || !self.has_more_pages() || self.is_loading() {
            return None;
        }
        Some(self.issue(self.pagination.current_page + 1))
    }

    fn issue(&mut self, page: u32) -> PageRequest {
        self.last_token += 1;
        let request = PageRequest {
            token: self.last_token,
            page,
        };
        self.in_flight = Some(request);
        self.phase = HistoryPhase::Loading;
        request
    }

    /// Apply a successful response to `request`.
    ///
    /// Page 1 replaces the loaded orders; later pages append, skipping ids
    /// already loaded. Returns `false` if `request` was superseded, in which
    /// case nothing changes.
    pub fn apply(&mut self, request: PageRequest, response: OrderHistoryResponse) -> bool {
        if !self.complete(request) {
            return false;
        }

        match response {
            OrderHistoryResponse::NoOrders => {
                if request.page == 1 {
                    self.orders.clear();
                    self.pagination = PaginationState {
                        current_page: 1,
                        total_pages: 1,
                        total_count: 0,
                        ..self.pagination
                    };
                } else {
                    // Ran past the last page.
                    self.pagination.total_pages = self.pagination.current_page;
                }
            }
            OrderHistoryResponse::Page(page) => {
                if request.page == 1 {
                    self.orders = page.orders;
                } else {
                    let known: HashSet<OrderId> =
                        self.orders.iter().map(|o| o.id.clone()).collect();
                    self.orders
                        .extend(page.orders.into_iter().filter(|o| !known.contains(&o.id)));
                }
                self.pagination.current_page = request.page;
                self.pagination.total_pages = page.pagination.pages;
                self.pagination.total_count = page.pagination.total;
                if page.pagination.limit > 0 {
                    self.pagination.page_size = page.pagination.limit;
                }
            }
        }

        self.phase = if self.orders.is_empty() {
            HistoryPhase::Empty
        } else {
            HistoryPhase::Loaded
        };
        true
    }

    /// Record that `request` failed. Loaded orders are kept.
    ///
    /// Returns `false` if `request` was superseded.
    pub fn fail(&mut self, request: PageRequest, error: &ApiError) -> bool {
        if !self.complete(request) {
            return false;
        }
        self.phase = HistoryPhase::Error(error.user_message());
        true
    }

    fn complete(&mut self, request: PageRequest) -> bool {
        if self.in_flight != Some(request) {
            debug!(page = request.page, "Dropping stale history completion");
            return false;
        }
        self.in_flight = None;
        true
    }

    /// Forget everything, e.g. on logout.
    pub fn reset(&mut self) {
        *self = Self::new(self.requested_page_size);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::decode::{ListShape, Pagination};
    use crate::orders::OrderPage;

    fn order(id: &str) -> Order {
        serde_json::from_str(&format!(r#"{{"_id":"{id}"}}"#)).unwrap()
    }

    fn page(ids: &[&str], current: u32, pages: u32) -> OrderHistoryResponse {
        OrderHistoryResponse::Page(OrderPage {
            orders: ids.iter().map(|id| order(id)).collect(),
            pagination: Pagination {
                total: 0,
                page: current,
                pages,
                limit: 2,
            },
            shape: ListShape::Envelope("orders"),
        })
    }

    fn ids(history: &OrderHistory) -> Vec<&str> {
        history.orders().iter().map(|o| o.id.as_str()).collect()
    }

    #[test]
    fn test_refresh_then_next_page_appends() {
        let mut history = OrderHistory::new(2);
        assert_eq!(history.phase(), &HistoryPhase::Idle);

        let first = history.begin_refresh();
        assert_eq!(first.page, 1);
        assert_eq!(history.phase(), &HistoryPhase::Loading);
        assert!(history.apply(first, page(&["a", "b"], 1, 2)));
        assert_eq!(history.phase(), &HistoryPhase::Loaded);
        assert!(history.has_more_pages());

        let second = history.begin_next_page().unwrap();
        assert_eq!(second.page, 2);
        assert!(history.apply(second, page(&["b", "c"], 2, 2)));
        assert_eq!(ids(&history), vec!["a", "b", "c"]);
        assert!(!history.has_more_pages());
        assert!(history.begin_next_page().is_none());
    }

    #[test]
    fn test_refresh_replaces() {
        let mut history = OrderHistory::new(2);
        let request = history.begin_refresh();
        history.apply(request, page(&["a", "b"], 1, 2));
        let request = history.begin_next_page().unwrap();
        history.apply(request, page(&["c"], 2, 2));

        let request = history.begin_refresh();
        history.apply(request, page(&["z"], 1, 1));
        assert_eq!(ids(&history), vec!["z"]);
        assert_eq!(history.pagination().current_page, 1);
    }

    #[test]
    fn test_next_page_blocked_while_in_flight() {
        let mut history = OrderHistory::new(2);
        let request = history.begin_refresh();
        history.apply(request, page(&["a"], 1, 3));

        let next = history.begin_next_page().unwrap();
        assert!(history.is_loading());
        assert!(history.begin_next_page().is_none());
        history.apply(next, page(&["b"], 2, 3));
        assert!(history.begin_next_page().is_some());
    }

    #[test]
    fn test_next_page_only_from_loaded() {
        let mut history = OrderHistory::new(2);
        assert!(history.begin_next_page().is_none());

        let request = history.begin_refresh();
        history.fail(
            request,
            &ApiError::Server {
                status: 500,
                message: None,
            },
        );
        assert!(matches!(history.phase(), HistoryPhase::Error(_)));
        assert!(history.begin_next_page().is_none());
    }

    #[test]
    fn test_stale_failure_dropped() {
        let mut history = OrderHistory::new(2);
        let stale = history.begin_refresh();
        let fresh = history.begin_refresh();
        let error = ApiError::Server {
            status: 500,
            message: None,
        };
        assert!(!history.fail(stale, &error));
        assert_eq!(history.phase(), &HistoryPhase::Loading);
        assert!(history.apply(fresh, page(&["a"], 1, 1)));
    }

    #[test]
    fn test_stale_completion_dropped() {
        let mut history = OrderHistory::new(2);
        let stale = history.begin_refresh();
        let fresh = history.begin_refresh();

        assert!(history.apply(fresh, page(&["new"], 1, 1)));
        assert!(!history.apply(stale, page(&["old"], 1, 1)));
        assert_eq!(ids(&history), vec!["new"]);
        assert_eq!(history.phase(), &HistoryPhase::Loaded);
    }

    #[test]
    fn test_no_orders_is_empty_not_error() {
        let mut history = OrderHistory::new(10);
        let request = history.begin_refresh();
        history.apply(request, OrderHistoryResponse::NoOrders);
        assert_eq!(history.phase(), &HistoryPhase::Empty);
        assert!(!history.has_more_pages());
    }

    #[test]
    fn test_empty_page_is_empty() {
        let mut history = OrderHistory::new(10);
        let request = history.begin_refresh();
        history.apply(request, page(&[], 1, 1));
        assert_eq!(history.phase(), &HistoryPhase::Empty);
        assert!(!history.has_more_pages());
    }

    #[test]
    fn test_error_keeps_loaded_orders() {
        let mut history = OrderHistory::new(2);
        let request = history.begin_refresh();
        history.apply(request, page(&["a"], 1, 2));
        let next = history.begin_next_page().unwrap();
        history.fail(
            next,
            &ApiError::Server {
                status: 503,
                message: Some("Service unavailable".into()),
            },
        );
        assert_eq!(
            history.phase(),
            &HistoryPhase::Error("Service unavailable".to_string())
        );
        assert_eq!(ids(&history), vec!["a"]);
    }

    #[test]
    fn test_reset() {
        let mut history = OrderHistory::new(5);
        let request = history.begin_refresh();
        history.apply(request, page(&["a"], 1, 1));
        history.reset();
        assert!(history.orders().is_empty());
        assert_eq!(history.phase(), &HistoryPhase::Idle);
        assert_eq!(history.pagination().page_size, 5);
    }
}
