//! Scope chain
//!
//! Each link holds an object used as a binding record. Function and catch
//! records are prototype-less objects; the global record is the global
//! object and a `with` record is the user's object, both searched along
//! their prototype chains.

use crate::runtime::ObjectRef;
use std::rc::Rc;

/// What introduced a scope link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Global,
    Function,
    /// Holds only the name of a named function expression
    FunctionName,
    Catch,
    With,
}

/// One link of the scope chain
pub struct Scope {
    pub record: ObjectRef,
    pub parent: Option<ScopeRef>,
    pub kind: ScopeKind,
}

/// Shared handle to a scope link
pub type ScopeRef = Rc<Scope>;

impl Scope {
    /// Outermost scope over the global object
    pub fn global(record: ObjectRef) -> ScopeRef {
        Rc::new(Scope {
            record,
            parent: None,
            kind: ScopeKind::Global,
        })
    }

    /// New innermost link on top of `parent`
    pub fn child(parent: &ScopeRef, record: ObjectRef, kind: ScopeKind) -> ScopeRef {
        Rc::new(Scope {
            record,
            parent: Some(parent.clone()),
            kind,
        })
    }

    /// Links from innermost to outermost
    pub fn chain(self: &Rc<Self>) -> impl Iterator<Item = &Scope> {
        std::iter::successors(Some(&**self), |s| s.parent.as_deref())
    }
}
