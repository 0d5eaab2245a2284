//! Paging

use serde::{Deserialize, Serialize};

/// One page of a result set
///
/// `index` is 1-based. A `size` of zero means "no paging". Drivers fill
/// `total` with the unpaged row count after a select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paging {
    pub index: u32,
    pub size: u32,
    #[serde(default)]
    pub total: Option<u64>,
}

impl Default for Paging {
    fn default() -> Self {
        Self::disabled()
    }
}

impl Paging {
    /// Page `index` (clamped to 1) of `size` rows
    pub fn page(index: u32, size: u32) -> Self {
        Self {
            index: index.max(1),
            size,
            total: None,
        }
    }

    /// First page of `size` rows
    pub fn first(size: u32) -> Self {
        Self::page(1, size)
    }

    /// Return every row
    pub fn disabled() -> Self {
        Self {
            index: 1,
            size: 0,
            total: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.size > 0
    }

    /// Rows to skip before this page
    pub fn offset(&self) -> usize {
        if !self.is_enabled() {
            return 0;
        }
        (self.index.max(1) as usize - 1) * self.size as usize
    }

    /// Number of pages, once `total` is known
    pub fn page_count(&self) -> Option<u64> {
        let total = self.total?;
        if !self.is_enabled() {
            return Some(if total == 0 { 0 } else { 1 });
        }
        let size = self.size as u64;
        Some((total + size - 1) / size)
    }
}
