//! Field instances: the runtime holders of a message's values.
//!
//! [Single] holds zero or one value inline. [Multi] holds any number of values as a list of
//! nodes placed in an [Arena], which keeps values in place for the whole transaction.
//!
//! The engine accesses both through the object-safe [Slot] trait.

use crate::{arena::Arena, codec::Codec, context::DecodeContext, Error};
use core::{cell::Cell, fmt};

/// Type-erased view of one field instance, as seen by the container engine.
pub trait Slot<'a> {
    /// Number of values currently held.
    fn count(&self) -> usize;

    /// Calls `f` for each value in order, stopping at the first error.
    fn for_each(
        &self,
        f: &mut dyn FnMut(&dyn Codec<'a>) -> Result<(), Error>,
    ) -> Result<(), Error>;

    /// Sums `f` over every value.
    fn sum_len(&self, f: &mut dyn FnMut(&dyn Codec<'a>) -> usize) -> usize;

    /// Calls `f` with a value holding `count`, built with [Codec::from_count].
    ///
    /// Returns `None` if the value type cannot represent `count`.
    fn with_count(
        &self,
        count: usize,
        f: &mut dyn FnMut(&dyn Codec<'a>) -> Result<(), Error>,
    ) -> Option<Result<(), Error>>;

    /// Decodes one more value from `ctx` and appends it.
    fn read_next(&mut self, ctx: &mut DecodeContext<'a>) -> Result<(), Error>;

    /// Interprets the held value as an instance count.
    fn as_count(&self) -> Option<usize>;

    /// Removes all values.
    fn clear(&mut self);
}

/// Holder of a single-instance (mandatory or optional) field.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Single<T> {
    value: Option<T>,
}

impl<T> Single<T> {
    pub fn new(value: T) -> Self {
        Self { value: Some(value) }
    }

    pub fn set(&mut self, value: T) {
        self.value = Some(value);
    }

    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.value.as_mut()
    }

    /// Returns the value, inserting a default one if the field is empty.
    pub fn get_or_default(&mut self) -> &mut T
    where
        T: Default,
    {
        self.value.get_or_insert_with(T::default)
    }

    pub fn take(&mut self) -> Option<T> {
        self.value.take()
    }

    pub fn is_set(&self) -> bool {
        self.value.is_some()
    }

    pub fn clear(&mut self) {
        self.value = None;
    }
}

impl<'a, T: Codec<'a> + Default> Slot<'a> for Single<T> {
    fn count(&self) -> usize {
        usize::from(self.value.is_some())
    }

    fn for_each(
        &self,
        f: &mut dyn FnMut(&dyn Codec<'a>) -> Result<(), Error>,
    ) -> Result<(), Error> {
        match &self.value {
            Some(value) => f(value),
            None => Ok(()),
        }
    }

    fn sum_len(&self, f: &mut dyn FnMut(&dyn Codec<'a>) -> usize) -> usize {
        self.value.as_ref().map_or(0, |value| f(value))
    }

    fn with_count(
        &self,
        count: usize,
        f: &mut dyn FnMut(&dyn Codec<'a>) -> Result<(), Error>,
    ) -> Option<Result<(), Error>> {
        T::from_count(count).map(|value| f(&value))
    }

    fn read_next(&mut self, ctx: &mut DecodeContext<'a>) -> Result<(), Error> {
        if self.value.is_some() {
            return Err(Error::ExcessField {
                field: ctx.field(),
                expected: 1,
                got: 2,
                offset: ctx.offset(),
            });
        }
        let mut value = T::default();
        value.read(ctx)?;
        self.value = Some(value);
        Ok(())
    }

    fn as_count(&self) -> Option<usize> {
        self.value.as_ref().and_then(|value| value.as_count())
    }

    fn clear(&mut self) {
        self.value = None;
    }
}

struct Node<'a, T> {
    value: T,
    next: Cell<Option<&'a Node<'a, T>>>,
}

/// Holder of a multi-instance field, backed by an [Arena].
pub struct Multi<'a, T> {
    head: Option<&'a Node<'a, T>>,
    tail: Option<&'a Node<'a, T>>,
    len: usize,
}

impl<'a, T> Multi<'a, T> {
    pub fn new() -> Self {
        Self {
            head: None,
            tail: None,
            len: 0,
        }
    }

    /// Appends `value`, storing it in `arena`.
    pub fn push(&mut self, arena: &'a Arena<'_>, value: T) -> Result<(), Error> {
        let node: &'a Node<'a, T> = arena.alloc(Node {
            value,
            next: Cell::new(None),
        })?;
        match self.tail {
            Some(tail) => tail.next.set(Some(node)),
            None => self.head = Some(node),
        }
        self.tail = Some(node);
        self.len += 1;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn first(&self) -> Option<&'a T> {
        self.head.map(|node| &node.value)
    }

    pub fn get(&self, index: usize) -> Option<&'a T> {
        self.iter().nth(index)
    }

    /// Iterates over the values in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &'a T> {
        core::iter::successors(self.head, |node| node.next.get()).map(|node| &node.value)
    }

    /// Forgets all values. Their storage is reclaimed when the arena is reset.
    pub fn clear(&mut self) {
        self.head = None;
        self.tail = None;
        self.len = 0;
    }
}

impl<T> Default for Multi<'_, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for Multi<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq> PartialEq for Multi<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<'a, T: Codec<'a> + Default> Slot<'a> for Multi<'a, T> {
    fn count(&self) -> usize {
        self.len
    }

    fn for_each(
        &self,
        f: &mut dyn FnMut(&dyn Codec<'a>) -> Result<(), Error>,
    ) -> Result<(), Error> {
        for value in self.iter() {
            f(value)?;
        }
        Ok(())
    }

    fn sum_len(&self, f: &mut dyn FnMut(&dyn Codec<'a>) -> usize) -> usize {
        self.iter().map(|value| f(value)).sum()
    }

    fn with_count(
        &self,
        _: usize,
        _: &mut dyn FnMut(&dyn Codec<'a>) -> Result<(), Error>,
    ) -> Option<Result<(), Error>> {
        None
    }

    fn read_next(&mut self, ctx: &mut DecodeContext<'a>) -> Result<(), Error> {
        let mut value = T::default();
        value.read(ctx)?;
        self.push(ctx.arena(), value)
    }

    fn as_count(&self) -> Option<usize> {
        None
    }

    fn clear(&mut self) {
        Multi::clear(self);
    }
}
