//! Bump allocation in a fixed, caller-supplied buffer.
//!
//! An [Arena] hands out storage from one contiguous free region delimited by two cursors:
//!
//! ```text
//! +-----------------+----------------------+-----------------+
//! | forward allocs  |     free region      | backward allocs |
//! +-----------------+----------------------+-----------------+
//! 0               front                  back              len
//! ```
//!
//! Forward allocations advance `front`, backward allocations retreat `back` (and with it the
//! externally visible end of the buffer, see [Arena::end]). Every allocation checks that the
//! aligned placement keeps `front <= back`. There is no per-allocation release: [Arena::reset]
//! reclaims everything at once. Because allocations borrow the arena and `reset` borrows it
//! mutably, no allocation can outlive a reset.
//!
//! Destructors of values placed in the arena are never run.

use crate::Error;
use core::{
    alloc::Layout,
    any::type_name,
    cell::Cell,
    marker::PhantomData,
    ptr::NonNull,
};
use tracing::trace;

/// Fixed-buffer bump allocator for transaction-scoped storage.
pub struct Arena<'b> {
    base: NonNull<u8>,
    len: usize,
    front: Cell<usize>,
    back: Cell<usize>,
    _buffer: PhantomData<&'b mut [u8]>,
}

impl<'b> Arena<'b> {
    /// Creates an arena over `buf`, which stays exclusively borrowed for the arena's lifetime.
    pub fn new(buf: &'b mut [u8]) -> Self {
        let len = buf.len();
        Self {
            base: NonNull::from(buf).cast(),
            len,
            front: Cell::new(0),
            back: Cell::new(len),
            _buffer: PhantomData,
        }
    }

    /// Restores both cursors to the bounds of the buffer.
    pub fn reset(&mut self) {
        self.front.set(0);
        self.back.set(self.len);
    }

    /// Total size of the underlying buffer.
    pub fn capacity(&self) -> usize {
        self.len
    }

    /// Number of bytes between the two cursors.
    pub fn available(&self) -> usize {
        self.back.get() - self.front.get()
    }

    /// Offset of the forward cursor.
    pub fn begin(&self) -> usize {
        self.front.get()
    }

    /// Offset of the end of the space left to forward allocations.
    pub fn end(&self) -> usize {
        self.back.get()
    }

    /// Allocates a default-constructed `T` from the front of the free region.
    pub fn allocate<T: Default>(&self) -> Result<&mut T, Error> {
        self.alloc(T::default())
    }

    /// Allocates a default-constructed `T` from the back of the free region.
    pub fn allocate_back<T: Default>(&self) -> Result<&mut T, Error> {
        self.alloc_back(T::default())
    }

    /// Moves `value` into the front of the free region.
    pub fn alloc<T>(&self, value: T) -> Result<&mut T, Error> {
        let layout = Layout::new::<T>();
        let offset = self.place_front(layout).ok_or_else(Self::exhausted::<T>)?;
        trace!(offset, size = layout.size(), "allocated forward");

        // SAFETY: `place_front` returned an offset inside the buffer whose address is aligned
        // for `T` and followed by at least `size_of::<T>()` bytes that no other allocation
        // covers. The buffer is exclusively borrowed for `'b`, which outlives `&self`.
        unsafe { Ok(self.write(offset, value)) }
    }

    /// Moves `value` into the back of the free region.
    pub fn alloc_back<T>(&self, value: T) -> Result<&mut T, Error> {
        let layout = Layout::new::<T>();
        let offset = self.place_back(layout).ok_or_else(Self::exhausted::<T>)?;
        trace!(offset, size = layout.size(), "allocated backward");

        // SAFETY: see `alloc`.
        unsafe { Ok(self.write(offset, value)) }
    }

    fn exhausted<T>() -> Error {
        Error::OutOfMemory {
            type_name: type_name::<T>(),
            size: core::mem::size_of::<T>(),
        }
    }

    fn addr(&self, offset: usize) -> usize {
        self.base.as_ptr() as usize + offset
    }

    fn place_front(&self, layout: Layout) -> Option<usize> {
        let start = self.addr(self.front.get());
        let aligned = start.checked_add(layout.align() - 1)? & !(layout.align() - 1);
        let offset = aligned - self.addr(0);
        let end = offset.checked_add(layout.size())?;
        if end > self.back.get() {
            return None;
        }
        self.front.set(end);
        Some(offset)
    }

    fn place_back(&self, layout: Layout) -> Option<usize> {
        let back = self.back.get();
        if back < self.front.get() + layout.size() {
            return None;
        }
        let aligned = (self.addr(back) - layout.size()) & !(layout.align() - 1);
        if aligned < self.addr(self.front.get()) {
            return None;
        }
        let offset = aligned - self.addr(0);
        self.back.set(offset);
        Some(offset)
    }

    unsafe fn write<T>(&self, offset: usize, value: T) -> &mut T {
        let ptr = self.base.as_ptr().add(offset).cast::<T>();
        ptr.write(value);
        &mut *ptr
    }
}

impl core::fmt::Debug for Arena<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Arena")
            .field("capacity", &self.len)
            .field("front", &self.front.get())
            .field("back", &self.back.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Kind;

    #[repr(C, align(8))]
    struct Aligned<const N: usize>([u8; N]);

    #[test]
    fn test_exhaustion_keeps_earlier_allocations() {
        const N: usize = 4;
        let mut storage = Aligned([0u8; N * 8]);
        let arena = Arena::new(&mut storage.0);

        let mut values = Vec::new();
        for i in 0..N {
            let value = arena.alloc(i as u64 * 0x0101).unwrap();
            values.push(value);
        }
        let err = arena.alloc(0xFFu64).unwrap_err();
        assert_eq!(err.kind(), Kind::OutOfMemory);
        assert_eq!(
            err,
            Error::OutOfMemory {
                type_name: "u64",
                size: 8
            }
        );
        for (i, value) in values.iter().enumerate() {
            assert_eq!(**value, i as u64 * 0x0101);
        }
    }

    #[test]
    fn test_forward_alignment() {
        let mut storage = Aligned([0u8; 32]);
        let arena = Arena::new(&mut storage.0);

        let byte: &mut u8 = arena.allocate().unwrap();
        *byte = 7;
        assert_eq!(arena.begin(), 1);

        // The next u32 is rounded up to offset 4
        let word = arena.alloc(0xDEADBEEFu32).unwrap();
        assert_eq!(arena.begin(), 8);
        assert_eq!(*word, 0xDEADBEEF);
        assert_eq!(*byte, 7);
    }

    #[test]
    fn test_backward_shrinks_end() {
        let mut storage = Aligned([0u8; 16]);
        let arena = Arena::new(&mut storage.0);
        assert_eq!(arena.end(), 16);

        let word = arena.alloc_back(1u32).unwrap();
        assert_eq!(arena.end(), 12);
        let byte = arena.alloc_back(2u8).unwrap();
        assert_eq!(arena.end(), 11);

        // The next u32 is rounded down to offset 4
        let other = arena.alloc_back(3u32).unwrap();
        assert_eq!(arena.end(), 4);
        assert_eq!((*word, *byte, *other), (1, 2, 3));

        // Forward allocations cannot reach reserved space
        let _ = arena.alloc(4u32).unwrap();
        assert_eq!(arena.available(), 0);
        assert!(arena.alloc(5u8).is_err());
        assert!(arena.alloc_back(5u8).is_err());
    }

    #[test]
    fn test_rounding_past_cursor() {
        let mut storage = Aligned([0u8; 16]);
        let arena = Arena::new(&mut storage.0);

        // front = 1, back = 8: 7 bytes free but no aligned slot for a u64
        arena.alloc(1u8).unwrap();
        arena.alloc_back(2u64).unwrap();
        assert_eq!(arena.available(), 7);
        assert_eq!(arena.alloc(3u64).unwrap_err().kind(), Kind::OutOfMemory);
        assert_eq!(arena.alloc_back(3u64).unwrap_err().kind(), Kind::OutOfMemory);

        // Smaller types still fit
        arena.alloc(4u32).unwrap();
        assert_eq!(arena.available(), 0);
    }

    #[test]
    fn test_reset_reclaims() {
        let mut storage = Aligned([0u8; 8]);
        let mut arena = Arena::new(&mut storage.0);
        arena.alloc(1u64).unwrap();
        assert!(arena.alloc(1u8).is_err());

        arena.reset();
        assert_eq!(arena.available(), 8);
        assert_eq!(arena.capacity(), 8);
        let value = arena.alloc_back(9u64).unwrap();
        assert_eq!(*value, 9);
    }

    #[test]
    fn test_empty_buffer() {
        let arena = Arena::new(&mut []);
        assert!(arena.alloc(1u8).is_err());
        assert!(arena.alloc_back(1u8).is_err());
        // Zero-sized values need no space
        arena.alloc(()).unwrap();
    }
}
