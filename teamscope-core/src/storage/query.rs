//! Query parameter types for the event feed

use serde::{Deserialize, Serialize};

use super::types::EventSummary;
use crate::classify::EventCategory;

/// Default page size for event queries.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Filters plus pagination for the event feed. Filters combine with AND.
#[derive(Debug, Clone, PartialEq)]
pub struct EventQuery {
    /// 1-based page number
    pub page: u32,
    /// Rows per page; zero yields an empty page and zero pages
    pub page_size: u32,
    /// Filter by category
    pub category: Option<EventCategory>,
    /// Filter by acting agent
    pub agent: Option<String>,
    /// Filter by tool name
    pub tool: Option<String>,
}

impl Default for EventQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            category: None,
            agent: None,
            tool: None,
        }
    }
}

impl EventQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Row offset of the requested page.
    pub fn offset(&self) -> u32 {
        self.page.saturating_sub(1).saturating_mul(self.page_size)
    }
}

/// One page of events plus pagination totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPage {
    pub events: Vec<EventSummary>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
    pub page_count: u32,
}

impl EventPage {
    /// Ceiling division; a zero page size means zero pages.
    pub(crate) fn page_count_for(total: i64, page_size: u32) -> u32 {
        if page_size == 0 {
            0
        } else {
            (total as u64).div_ceil(page_size as u64) as u32
        }
    }
}
