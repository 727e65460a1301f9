use serde::Deserialize;

/// The `?page=` query parameter. Kept as a raw string so a malformed value
/// falls back to the first page instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    page: Option<String>,
}

impl PageQuery {
    pub fn new(page: Option<&str>) -> Self {
        Self {
            page: page.map(str::to_owned),
        }
    }

    pub fn raw(&self) -> Option<&str> {
        self.page.as_deref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paginator {
    total: usize,
    per_page: usize,
}

impl Paginator {
    pub fn new(total: usize, per_page: usize) -> Self {
        Self {
            total,
            per_page: per_page.max(1),
        }
    }

    /// An empty collection still has one (empty) page.
    pub fn num_pages(&self) -> usize {
        if self.total == 0 {
            1
        } else {
            self.total.div_ceil(self.per_page)
        }
    }

    /// Resolves the requested page: missing or malformed means the first page,
    /// anything out of range means the last one.
    pub fn resolve(&self, query: &PageQuery) -> usize {
        let Some(raw) = query.raw() else {
            return 1;
        };
        match raw.trim().parse::<i64>() {
            Ok(number) if number >= 1 && (number as usize) <= self.num_pages() => number as usize,
            Ok(_) => self.num_pages(),
            Err(_) => 1,
        }
    }

    /// `(offset, limit)` of a resolved page.
    pub fn bounds(&self, number: usize) -> (usize, usize) {
        let offset = (number.max(1) - 1) * self.per_page;
        (offset, self.per_page)
    }

    pub fn page<T>(&self, number: usize, items: Vec<T>) -> Page<T> {
        Page {
            items,
            number,
            num_pages: self.num_pages(),
            total: self.total,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: usize,
    pub num_pages: usize,
    pub total: usize,
}

impl<T> Page<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn previous_number(&self) -> usize {
        self.number.saturating_sub(1).max(1)
    }

    pub fn next_number(&self) -> usize {
        (self.number + 1).min(self.num_pages)
    }

    pub fn has_other_pages(&self) -> bool {
        self.num_pages > 1
    }
}
