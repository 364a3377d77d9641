// SPDX-License-Identifier: MIT

//! Zero-based pagination over an already-filtered, already-ordered result
//! set, with the page metadata flags the list endpoints expose.

/// One page of results plus the derived navigation flags.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_previous: bool,
    pub first: bool,
    pub last: bool,
}

impl<T> Page<T> {
    /// Slice the requested window out of the full result set.
    ///
    /// An empty set or an out-of-range page index yields a well-formed page
    /// with empty content, never an error.
    pub fn from_full(items: Vec<T>, page: u32, size: u32) -> Self {
        let total_elements = items.len() as u64;
        let total_pages = if size == 0 {
            0
        } else {
            ((total_elements + size as u64 - 1) / size as u64) as u32
        };

        // Window math stays in u64 so a maximal page index cannot overflow
        let start = page as u64 * size as u64;
        let content: Vec<T> = if start < total_elements {
            items
                .into_iter()
                .skip(start as usize)
                .take(size as usize)
                .collect()
        } else {
            Vec::new()
        };

        let has_previous = page > 0;
        let has_next = (page as u64) + 1 < total_pages as u64;

        Self {
            content,
            page,
            size,
            total_elements,
            total_pages,
            has_next,
            has_previous,
            first: !has_previous,
            last: !has_next,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
            has_next: self.has_next,
            has_previous: self.has_previous,
            first: self.first,
            last: self.last,
        }
    }
}
