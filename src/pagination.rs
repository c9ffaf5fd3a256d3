//! Pagination math and controls.
//!
//! ```text
//! paginate(total = 95, size = 10, current = 5, max_visible = 7)
//!
//!   pages 1..=10 exceed max_visible, so keep first, last and current ± 1:
//!
//!   [1] … [4] (5) [6] … [10]
//! ```

use crate::utils::html::push_escaped;
use smallvec::SmallVec;

/// One slot of the visible page list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSlot {
    Page(usize),
    Ellipsis,
}

/// Pagination state for one listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageInfo {
    pub current_page: usize,
    pub total_pages: usize,
    pub has_prev: bool,
    pub has_next: bool,
    /// Page numbers to show, with ellipsis markers; empty without pagination.
    pub visible: SmallVec<[PageSlot; 9]>,
}

impl PageInfo {
    /// Whether there is more than one page.
    pub fn is_paginated(&self) -> bool {
        self.total_pages > 1
    }
}

/// Compute page metadata.
///
/// A zero page size counts as 1; `current_page` is clamped into range.
pub fn paginate(total_items: usize, page_size: usize, current_page: usize, max_visible: usize) -> PageInfo {
    let total_pages = total_items.div_ceil(page_size.max(1));
    let current_page = current_page.clamp(1, total_pages.max(1));

    let mut visible = SmallVec::new();
    if total_pages > 1 {
        if total_pages <= max_visible {
            visible.extend((1..=total_pages).map(PageSlot::Page));
        } else {
            let mut numbers: SmallVec<[usize; 5]> = SmallVec::new();
            for n in [1, current_page - 1, current_page, current_page + 1, total_pages] {
                if (1..=total_pages).contains(&n) && !numbers.contains(&n) {
                    numbers.push(n);
                }
            }
            numbers.sort_unstable();

            let mut prev = 0;
            for n in numbers {
                if prev > 0 && n - prev > 1 {
                    visible.push(PageSlot::Ellipsis);
                }
                visible.push(PageSlot::Page(n));
                prev = n;
            }
        }
    }

    PageInfo {
        current_page,
        total_pages,
        has_prev: current_page > 1,
        has_next: current_page < total_pages,
        visible,
    }
}

// ============================================================================
// Controls
// ============================================================================

/// Display options of [`pagination_controls`].
#[derive(Debug, Clone, Copy)]
pub struct Controls<'a> {
    /// URL the page parameter is appended to (usually the listing page).
    pub base_url: &'a str,
    /// Query parameter carrying the page number.
    pub param: &'a str,
    pub prev_label: &'a str,
    pub next_label: &'a str,
}

impl Default for Controls<'_> {
    fn default() -> Self {
        Self {
            base_url: "",
            param: "page",
            prev_label: "« Previous",
            next_label: "Next »",
        }
    }
}

impl Controls<'_> {
    fn href(&self, page: usize) -> String {
        let sep = if self.base_url.contains('?') { '&' } else { '?' };
        format!("{}{sep}{}={page}", self.base_url, self.param)
    }
}

/// Render the pagination `<nav>` for a collection listing.
///
/// Carries `data-collection`, `data-per-page` and `data-total` so a client
/// component can re-slice statically generated lists. Empty when everything
/// fits on one page.
pub fn pagination_controls(collection: &str, total_items: usize, per_page: usize, info: &PageInfo, controls: &Controls<'_>) -> String {
    if !info.is_paginated() {
        return String::new();
    }

    let mut out = String::from("<nav class=\"pagination\" aria-label=\"Pagination\" data-collection=\"");
    push_escaped(&mut out, collection);
    out.push_str(&format!("\" data-per-page=\"{}\" data-total=\"{total_items}\">\n", per_page.max(1)));

    if info.has_prev {
        push_link(&mut out, controls, info.current_page - 1, "pagination-prev", Some("prev"), controls.prev_label);
    } else {
        push_disabled(&mut out, "pagination-prev", controls.prev_label);
    }

    for slot in &info.visible {
        match *slot {
            PageSlot::Ellipsis => out.push_str("<span class=\"pagination-ellipsis\">…</span>\n"),
            PageSlot::Page(n) if n == info.current_page => {
                out.push_str(&format!("<span class=\"pagination-page\" aria-current=\"page\">{n}</span>\n"));
            }
            PageSlot::Page(n) => push_link(&mut out, controls, n, "pagination-page", None, &n.to_string()),
        }
    }

    if info.has_next {
        push_link(&mut out, controls, info.current_page + 1, "pagination-next", Some("next"), controls.next_label);
    } else {
        push_disabled(&mut out, "pagination-next", controls.next_label);
    }

    out.push_str("</nav>");
    out
}

fn push_link(out: &mut String, controls: &Controls<'_>, page: usize, class: &str, rel: Option<&str>, label: &str) {
    out.push_str(&format!("<a class=\"{class}\" href=\""));
    push_escaped(out, &controls.href(page));
    out.push('"');
    if let Some(rel) = rel {
        out.push_str(&format!(" rel=\"{rel}\""));
    }
    out.push('>');
    push_escaped(out, label);
    out.push_str("</a>\n");
}

fn push_disabled(out: &mut String, class: &str, label: &str) {
    out.push_str(&format!("<span class=\"{class} disabled\" aria-disabled=\"true\">"));
    push_escaped(out, label);
    out.push_str("</span>\n");
}
