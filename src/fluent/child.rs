//! Child resources defined and updated through their parent
//!
//! A child definition or update owns its parent builder and hands it back on
//! `attach` / `parent`, so chains read top to bottom:
//!
//! ```ignore
//! table.update()
//!     .define_route("to-firewall")
//!         .with_destination_address_prefix("0.0.0.0/0")
//!         .with_next_hop_to_virtual_appliance("10.0.1.4")
//!         .attach()
//!     .without_route("legacy")
//!     .apply()
//!     .await?;
//! ```
//!
//! Children are identified by exact name within their parent. Nothing is
//! sent until the parent's `create` or `apply`.

use super::kind::{ChildKind, ChildOf};
use super::stage::{Blank, WithAttach};
use crate::error::{Error, Result};
use crate::model::ChildInner;
use std::fmt;
use std::marker::PhantomData;

/// A builder that owns children of kind `C`
pub trait ChildParent<C: ChildKind>: Sized {
    fn children_mut(&mut self) -> &mut Vec<ChildOf<C>>;

    /// Add `child`, replacing any child with the same name
    fn attach_child(mut self, child: ChildOf<C>) -> Self {
        let children = self.children_mut();
        match children.iter_mut().find(|c| c.name == child.name) {
            Some(existing) => *existing = child,
            None => children.push(child),
        }
        self
    }

    /// Remove the child named `name`, if present
    fn detach_child(mut self, name: &str) -> Self {
        self.children_mut().retain(|c| c.name != name);
        self
    }

    fn define_child(self, name: &str) -> ChildDefinition<C, Self, Blank> {
        ChildDefinition {
            parent: self,
            inner: ChildInner::named(name),
            _stage: PhantomData,
        }
    }

    /// Start updating an existing child; fails if there is none by that name
    fn update_child(mut self, name: &str) -> Result<ChildUpdate<C, Self>> {
        if !self.children_mut().iter().any(|c| c.name == name) {
            return Err(Error::not_found(C::DISPLAY_NAME, name));
        }
        Ok(ChildUpdate {
            parent: self,
            name: name.to_string(),
            _kind: PhantomData,
        })
    }
}

/// A child being defined inside parent `P`, currently at stage `S`
#[must_use]
pub struct ChildDefinition<C: ChildKind, P, S> {
    parent: P,
    inner: ChildOf<C>,
    _stage: PhantomData<fn() -> S>,
}

impl<C: ChildKind, P, S> ChildDefinition<C, P, S> {
    pub(crate) fn advance<T>(self) -> ChildDefinition<C, P, T> {
        ChildDefinition {
            parent: self.parent,
            inner: self.inner,
            _stage: PhantomData,
        }
    }

    pub(crate) fn edit(mut self, f: impl FnOnce(&mut C::Properties)) -> Self {
        f(&mut self.inner.properties);
        self
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }
}

impl<C: ChildKind, P: ChildParent<C>> ChildDefinition<C, P, WithAttach> {
    /// Add the child to the parent and return to it
    pub fn attach(self) -> P {
        self.parent.attach_child(self.inner)
    }
}

impl<C: ChildKind, P, S> fmt::Debug for ChildDefinition<C, P, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildDefinition")
            .field("kind", &C::DISPLAY_NAME)
            .field("inner", &self.inner)
            .finish()
    }
}

/// Changes to an existing child of parent `P`
#[must_use]
pub struct ChildUpdate<C: ChildKind, P> {
    parent: P,
    name: String,
    _kind: PhantomData<fn() -> C>,
}

impl<C: ChildKind, P: ChildParent<C>> ChildUpdate<C, P> {
    pub(crate) fn edit(mut self, f: impl FnOnce(&mut C::Properties)) -> Self {
        let name = &self.name;
        if let Some(child) = self.parent.children_mut().iter_mut().find(|c| &c.name == name) {
            f(&mut child.properties);
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return to the parent
    pub fn parent(self) -> P {
        self.parent
    }
}

impl<C: ChildKind, P> fmt::Debug for ChildUpdate<C, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildUpdate")
            .field("kind", &C::DISPLAY_NAME)
            .field("name", &self.name)
            .finish()
    }
}
