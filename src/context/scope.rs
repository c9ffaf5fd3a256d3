//! Scoped iterators.
//!
//! A [`ScopedIter`] walks a list of records and keeps the matching scope of the
//! [`RenderContext`] pointed at the item being visited, so bare field
//! references inside a loop body resolve against that item.
//!
//! ```ignore
//! let posts = engine.iterate_pages(None);
//! for _page in posts {
//!     // "url" now resolves against the page being visited
//!     let url = engine.resolve_field("url", "", source, ResolveOptions::default());
//! }
//! // scope released: the loop exhausted the iterator
//! ```
//!
//! The scope is released when the iterator runs past its last item and when it
//! is dropped, whichever comes first.

use super::{RenderContext, Scope, ScopeKind};
use crate::blueprint::Blueprint;
use crate::storage::Record;
use serde_json::Value;
use std::sync::Arc;

/// Restartable iterator over records that drives one scope kind.
pub struct ScopedIter<'c> {
    ctx: &'c RenderContext,
    kind: ScopeKind,
    items: Vec<Record>,
    blueprint: Option<Arc<Blueprint>>,
    /// Position of the current item; `None` before the first positioning.
    cursor: Option<usize>,
    /// Stack index of our scope while one is active.
    slot: Option<usize>,
}

impl<'c> ScopedIter<'c> {
    pub fn new(
        ctx: &'c RenderContext,
        kind: ScopeKind,
        items: Vec<Record>,
        blueprint: Option<Arc<Blueprint>>,
    ) -> Self {
        Self { ctx, kind, items, blueprint, cursor: None, slot: None }
    }

    /// Navigation items (pages).
    pub fn nav(ctx: &'c RenderContext, items: Vec<Record>) -> Self {
        Self::new(ctx, ScopeKind::Nav, items, None)
    }

    /// Items of a `structure`/`collection` field.
    ///
    /// Scalar items are exposed as `{ "value": item }`.
    pub fn structure(ctx: &'c RenderContext, items: Vec<Value>, blueprint: Option<Arc<Blueprint>>) -> Self {
        let items = items
            .into_iter()
            .map(|item| match item {
                Value::Object(record) => record,
                scalar => {
                    let mut record = Record::new();
                    record.insert("value".into(), scalar);
                    record
                }
            })
            .collect();
        Self::new(ctx, ScopeKind::Structure, items, blueprint)
    }

    /// Collection query results.
    pub fn collection(ctx: &'c RenderContext, items: Vec<Record>, blueprint: Option<Arc<Blueprint>>) -> Self {
        Self::new(ctx, ScopeKind::CollectionItem, items, blueprint)
    }

    /// Media file records.
    pub fn files(ctx: &'c RenderContext, items: Vec<Record>) -> Self {
        Self::new(ctx, ScopeKind::FileItem, items, None)
    }

    pub fn kind(&self) -> ScopeKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// All items, without touching the scope.
    pub fn items(&self) -> &[Record] {
        &self.items
    }

    /// Consume the iterator without visiting, releasing any scope.
    pub fn into_records(mut self) -> Vec<Record> {
        self.release();
        std::mem::take(&mut self.items)
    }

    // ------------------------------------------------------------------------
    // Positioning
    // ------------------------------------------------------------------------

    /// Restart at the first item.
    pub fn rewind(&mut self) {
        self.cursor = Some(0);
        self.sync();
    }

    /// Peek at the current item, positioning on the first one if the
    /// iteration has not started.
    pub fn current(&mut self) -> Option<&Record> {
        let index = *self.cursor.get_or_insert(0);
        self.sync();
        self.items.get(index)
    }

    /// Move to the next item (or the first, if not started).
    pub fn advance(&mut self) {
        self.cursor = Some(self.cursor.map_or(0, |i| i + 1));
        self.sync();
    }

    /// Whether the cursor is past the last item.
    pub fn is_done(&self) -> bool {
        self.cursor.unwrap_or(0) >= self.items.len()
    }

    /// Visit every item from the start with its scope active.
    ///
    /// The scope is released when this returns, however `f` exits.
    pub fn for_each_scoped(mut self, mut f: impl FnMut(usize, &Record)) {
        self.rewind();
        while let Some(index) = self.cursor.filter(|&i| i < self.items.len()) {
            f(index, &self.items[index]);
            self.advance();
        }
    }

    /// Point the scope at the current item, or release it past the end.
    fn sync(&mut self) {
        let Some(record) = self.cursor.and_then(|i| self.items.get(i)) else {
            self.release();
            return;
        };

        let scope = Scope::with_blueprint(record.clone(), self.blueprint.clone());
        self.slot = Some(match self.slot {
            Some(index) => self.ctx.replace(self.kind, index, scope),
            None => self.ctx.enter(self.kind, scope),
        });
    }

    fn release(&mut self) {
        if let Some(index) = self.slot.take() {
            self.ctx.leave(self.kind, index);
        }
    }
}

impl Iterator for ScopedIter<'_> {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        self.advance();
        self.cursor.and_then(|i| self.items.get(i)).cloned()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = match self.cursor {
            None => self.items.len(),
            Some(i) => self.items.len().saturating_sub(i + 1),
        };
        (remaining, Some(remaining))
    }
}

impl Drop for ScopedIter<'_> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records(titles: &[&str]) -> Vec<Record> {
        titles
            .iter()
            .map(|t| json!({"title": t}).as_object().cloned().unwrap())
            .collect()
    }

    fn active_title(ctx: &RenderContext, kind: ScopeKind) -> Option<String> {
        ctx.active(kind)
            .and_then(|s| s.record.get("title").and_then(|v| v.as_str()).map(str::to_owned))
    }

    #[test]
    fn test_iteration_sets_scope_per_item() {
        let ctx = RenderContext::new();
        let iter = ScopedIter::collection(&ctx, records(&["a", "b", "c"]), None);

        let mut seen = Vec::new();
        for item in iter {
            let active = active_title(&ctx, ScopeKind::CollectionItem).unwrap();
            assert_eq!(item.get("title").and_then(|v| v.as_str()), Some(active.as_str()));
            seen.push(active);
        }
        assert_eq!(seen, ["a", "b", "c"]);
        assert!(!ctx.is_active(ScopeKind::CollectionItem));
    }

    #[test]
    fn test_exhaustion_clears_scope_before_drop() {
        let ctx = RenderContext::new();
        let mut iter = ScopedIter::nav(&ctx, records(&["a"]));
        assert!(iter.next().is_some());
        assert!(ctx.is_active(ScopeKind::Nav));
        assert!(iter.next().is_none());
        assert!(!ctx.is_active(ScopeKind::Nav));
        assert!(iter.is_done());
    }

    #[test]
    fn test_early_break_clears_scope_on_drop() {
        let ctx = RenderContext::new();
        for _ in ScopedIter::files(&ctx, records(&["a", "b", "c"])) {
            break;
        }
        assert!(!ctx.is_active(ScopeKind::FileItem));
    }

    #[test]
    fn test_rewind_current_advance() {
        let ctx = RenderContext::new();
        let mut iter = ScopedIter::collection(&ctx, records(&["a", "b"]), None);
        assert!(!iter.is_done());
        assert!(!ctx.is_active(ScopeKind::CollectionItem));

        iter.rewind();
        assert_eq!(active_title(&ctx, ScopeKind::CollectionItem).as_deref(), Some("a"));
        iter.advance();
        assert_eq!(iter.current().and_then(|r| r.get("title")), Some(&json!("b")));
        assert_eq!(active_title(&ctx, ScopeKind::CollectionItem).as_deref(), Some("b"));
        iter.advance();
        assert!(iter.is_done());
        assert!(iter.current().is_none());
        assert!(!ctx.is_active(ScopeKind::CollectionItem));

        // Restartable
        iter.rewind();
        assert_eq!(active_title(&ctx, ScopeKind::CollectionItem).as_deref(), Some("a"));
        drop(iter);
        assert!(!ctx.is_active(ScopeKind::CollectionItem));
    }

    #[test]
    fn test_current_before_start_positions_on_first() {
        let ctx = RenderContext::new();
        let mut iter = ScopedIter::nav(&ctx, records(&["x", "y"]));
        assert_eq!(iter.current().and_then(|r| r.get("title")), Some(&json!("x")));
        assert_eq!(iter.next().and_then(|r| r.get("title").cloned()), Some(json!("y")));
    }

    #[test]
    fn test_empty_iterator() {
        let ctx = RenderContext::new();
        let mut iter = ScopedIter::collection(&ctx, Vec::new(), None);
        assert!(iter.is_done());
        assert!(iter.next().is_none());
        assert!(!ctx.is_active(ScopeKind::CollectionItem));
    }

    #[test]
    fn test_structure_wraps_scalars() {
        let ctx = RenderContext::new();
        let iter = ScopedIter::structure(&ctx, vec![json!("plain"), json!({"a": 1})], None);
        let items = iter.into_records();
        assert_eq!(items[0].get("value"), Some(&json!("plain")));
        assert_eq!(items[1].get("a"), Some(&json!(1)));
    }

    #[test]
    fn test_for_each_scoped() {
        let ctx = RenderContext::new();
        let mut seen = Vec::new();
        ScopedIter::structure(&ctx, vec![json!({"title": "s1"}), json!({"title": "s2"})], None)
            .for_each_scoped(|index, _| {
                seen.push((index, active_title(&ctx, ScopeKind::Structure).unwrap()));
            });
        assert_eq!(seen, [(0, "s1".to_string()), (1, "s2".to_string())]);
        assert!(!ctx.is_active(ScopeKind::Structure));
    }

    #[test]
    fn test_size_hint() {
        let ctx = RenderContext::new();
        let mut iter = ScopedIter::nav(&ctx, records(&["a", "b", "c"]));
        assert_eq!(iter.size_hint(), (3, Some(3)));
        iter.next();
        assert_eq!(iter.size_hint(), (2, Some(2)));
    }
}
