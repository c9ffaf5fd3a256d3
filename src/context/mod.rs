//! Render context: which record fields are currently being resolved for.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────── RenderContext ────────────────────────┐
//! │  priority   kind             stack (top = active)             │
//! │  1          Nav              [ page item ]                    │
//! │  2          Structure        [ gallery item ]                 │
//! │  3          CollectionItem   [ post ]                         │
//! │  4          FileItem         [ ]                              │
//! └───────────────────────────────────────────────────────────────┘
//!        ▲ push / replace / pop                ▲ read
//!        │                                     │
//!   ScopeGuard, ScopedIter                 Resolver::resolve()
//!   (RAII: released on drop)               (highest-priority active scope owns the key)
//! ```
//!
//! The context is an explicit object owned by one render pass, not process
//! state. Scopes are entered through RAII handles ([`ScopeGuard`],
//! [`ScopedIter`]) that release on drop, so an abandoned loop can never leak
//! its item into a later, unrelated resolution.
//!
//! Single-threaded: the slots use `RefCell`. Do not hold a reference from
//! [`RenderContext::active`] across a call that enters or leaves a scope.

pub mod resolve;
pub mod scope;

pub use resolve::{DataSource, ResolveOptions, Resolver};
pub use scope::ScopedIter;

use crate::blueprint::Blueprint;
use crate::storage::Record;
use std::{
    cell::{Ref, RefCell},
    sync::Arc,
};

/// Kind of scope, in resolution priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    Nav,
    Structure,
    CollectionItem,
    FileItem,
}

impl ScopeKind {
    /// All kinds, highest priority first.
    pub const PRIORITY: [Self; 4] = [Self::Nav, Self::Structure, Self::CollectionItem, Self::FileItem];

    const fn index(self) -> usize {
        match self {
            Self::Nav => 0,
            Self::Structure => 1,
            Self::CollectionItem => 2,
            Self::FileItem => 3,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Nav => "nav",
            Self::Structure => "structure",
            Self::CollectionItem => "collection item",
            Self::FileItem => "file item",
        }
    }
}

/// One active record plus the schema used to type-render its fields.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    pub record: Record,
    pub blueprint: Option<Arc<Blueprint>>,
}

impl Scope {
    pub fn new(record: Record) -> Self {
        Self { record, blueprint: None }
    }

    pub fn with_blueprint(record: Record, blueprint: Option<Arc<Blueprint>>) -> Self {
        Self { record, blueprint }
    }
}

/// Per-render-pass scope stacks, one per [`ScopeKind`].
#[derive(Debug, Default)]
pub struct RenderContext {
    slots: RefCell<[Vec<Scope>; 4]>,
}

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a scope until the returned guard is dropped.
    pub fn push(&self, kind: ScopeKind, scope: Scope) -> ScopeGuard<'_> {
        let index = self.enter(kind, scope);
        ScopeGuard { ctx: self, kind, index }
    }

    /// Run `f` with `scope` active, releasing it afterwards (even on unwind).
    pub fn with_scope<R>(&self, kind: ScopeKind, scope: Scope, f: impl FnOnce() -> R) -> R {
        let _guard = self.push(kind, scope);
        f()
    }

    /// The active (top) scope of `kind`.
    pub fn active(&self, kind: ScopeKind) -> Option<Ref<'_, Scope>> {
        Ref::filter_map(self.slots.borrow(), |slots| slots[kind.index()].last()).ok()
    }

    pub fn is_active(&self, kind: ScopeKind) -> bool {
        !self.slots.borrow()[kind.index()].is_empty()
    }

    /// Number of stacked scopes of `kind`.
    pub fn depth(&self, kind: ScopeKind) -> usize {
        self.slots.borrow()[kind.index()].len()
    }

    /// Push a scope, returning its stack index.
    pub(crate) fn enter(&self, kind: ScopeKind, scope: Scope) -> usize {
        let mut slots = self.slots.borrow_mut();
        let stack = &mut slots[kind.index()];
        stack.push(scope);
        stack.len() - 1
    }

    /// Replace the scope at `index`, re-entering it if it was released.
    pub(crate) fn replace(&self, kind: ScopeKind, index: usize, scope: Scope) -> usize {
        let mut slots = self.slots.borrow_mut();
        let stack = &mut slots[kind.index()];
        match stack.get_mut(index) {
            Some(slot) => {
                *slot = scope;
                index
            }
            None => {
                stack.push(scope);
                stack.len() - 1
            }
        }
    }

    /// Release the scope at `index` and everything stacked above it.
    pub(crate) fn leave(&self, kind: ScopeKind, index: usize) {
        self.slots.borrow_mut()[kind.index()].truncate(index);
    }
}

/// RAII handle for a scope entered with [`RenderContext::push`].
#[must_use = "the scope is released as soon as the guard is dropped"]
pub struct ScopeGuard<'c> {
    ctx: &'c RenderContext,
    kind: ScopeKind,
    index: usize,
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        self.ctx.leave(self.kind, self.index);
    }
}
