use core::iter::FusedIterator;
use core::marker::PhantomData;
use core::ops::Range;
use core::ptr::{self, NonNull};

use allocator_api2::alloc::{Allocator, Global};
use allocator_api2::vec::{self, Vec};

use crate::arena::{Arena, NodeId};
use crate::util::impl_iter;
use crate::UnrolledList;

/// Walks the live part of every node block, in chain order from both ends.
///
/// The arena is held by pointer. Iterators built with `new_mut`
/// take block pointers through `as_mut_ptr`, the others through `as_ptr`.
pub(super) struct RawChunksIter<'a, T, A: Allocator + Clone> {
    nodes: NonNull<Arena<T, A>>,
    writable: bool,
    front: Option<NodeId>,
    back: Option<NodeId>,
    remaining: usize,
    _marker: PhantomData<&'a Arena<T, A>>,
}

impl<'a, T, A: Allocator + Clone> RawChunksIter<'a, T, A> {
    pub(super) fn new(list: &'a UnrolledList<T, A>) -> Self {
        Self {
            nodes: NonNull::from(&list.nodes),
            writable: false,
            front: list.head,
            back: list.tail,
            remaining: list.node_count,
            _marker: PhantomData,
        }
    }

    pub(super) fn new_mut(list: &'a mut UnrolledList<T, A>) -> Self {
        Self {
            front: list.head,
            back: list.tail,
            remaining: list.node_count,
            nodes: NonNull::from(&mut list.nodes),
            writable: true,
            _marker: PhantomData,
        }
    }

    fn arena(&self) -> &Arena<T, A> {
        // No `&mut Arena` outlives a call to `block`.
        unsafe { self.nodes.as_ref() }
    }

    fn block(&mut self, id: NodeId) -> NonNull<[T]> {
        let ptr = if self.writable {
            // Reborrows the node header only. Chunks handed out earlier live in
            // other blocks' buffers.
            let block = unsafe { &mut self.nodes.as_mut().node_mut(id).block };
            ptr::slice_from_raw_parts_mut(block.as_mut_ptr(), block.len())
        } else {
            let block = &self.arena().node(id).block;
            ptr::slice_from_raw_parts(block.as_ptr(), block.len()) as *mut [T]
        };

        unsafe { NonNull::new_unchecked(ptr) }
    }
}

impl<'a, T, A: Allocator + Clone> Iterator for RawChunksIter<'a, T, A> {
    type Item = NonNull<[T]>;

    fn next(&mut self) -> Option<NonNull<[T]>> {
        if self.remaining == 0 {
            return None;
        }

        let id = self.front?;
        self.remaining -= 1;
        self.front = self.arena().node(id).next;
        Some(self.block(id))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T, A: Allocator + Clone> DoubleEndedIterator for RawChunksIter<'a, T, A> {
    fn next_back(&mut self) -> Option<NonNull<[T]>> {
        if self.remaining == 0 {
            return None;
        }

        let id = self.back?;
        self.remaining -= 1;
        self.back = self.arena().node(id).prev;
        Some(self.block(id))
    }
}

impl<'a, T, A: Allocator + Clone> Clone for RawChunksIter<'a, T, A> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes,
            writable: self.writable,
            front: self.front,
            back: self.back,
            remaining: self.remaining,
            _marker: PhantomData,
        }
    }
}

// Shares the arena like `&'a Arena<T, A>`. Bounds on `T` come from the wrapping iterator.
unsafe impl<'a, T, A: Allocator + Clone + Sync> Send for RawChunksIter<'a, T, A> {}

unsafe impl<'a, T, A: Allocator + Clone + Sync> Sync for RawChunksIter<'a, T, A> {}

/// Returned by [`UnrolledList::chunks`].
pub struct ChunksIter<'a, T: 'a, A: Allocator + Clone = Global> {
    raw: RawChunksIter<'a, T, A>,
    _marker: PhantomData<&'a [T]>,
}

impl<'a, T: 'a, A: Allocator + Clone> ChunksIter<'a, T, A> {
    pub(super) fn new(list: &'a UnrolledList<T, A>) -> Self {
        Self {
            raw: RawChunksIter::new(list),
            _marker: PhantomData,
        }
    }
}

impl_iter! {
    on = ChunksIter { 'a, T, A } where { T: 'a, A: Allocator + Clone };
    inner = raw;
    item = { &'a [T] };
    map = { |_this: &mut Self, ptr: NonNull<[T]>|
        unsafe {
            Some(ptr.as_ref())
        }
    };
    clone = { |this: &Self| Self {
        raw: this.raw.clone(),
        _marker: PhantomData,
    }};
}

/// Returned by [`UnrolledList::chunks_mut`].
pub struct ChunksIterMut<'a, T: 'a, A: Allocator + Clone = Global> {
    raw: RawChunksIter<'a, T, A>,
    _marker: PhantomData<&'a mut [T]>,
}

impl<'a, T: 'a, A: Allocator + Clone> ChunksIterMut<'a, T, A> {
    pub(super) fn new(list: &'a mut UnrolledList<T, A>) -> Self {
        Self {
            raw: RawChunksIter::new_mut(list),
            _marker: PhantomData,
        }
    }
}

impl_iter! {
    on = ChunksIterMut { 'a, T, A } where { T: 'a, A: Allocator + Clone };
    inner = raw;
    item = { &'a mut [T] };
    map = { |_this: &mut Self, mut ptr: NonNull<[T]>|
        unsafe {
            Some(ptr.as_mut())
        }
    };
    clone = false;
}

struct RawSlice<T> {
    base: NonNull<T>,
    range: Range<usize>,
}

impl<T> RawSlice<T> {
    fn empty() -> Self {
        Self {
            base: NonNull::dangling(),
            range: 0..0,
        }
    }

    fn new(chunk: NonNull<[T]>) -> Self {
        Self {
            base: chunk.cast::<T>(),
            range: 0..chunk.len(),
        }
    }

    unsafe fn get(&self, index: usize) -> NonNull<T> {
        NonNull::new_unchecked(self.base.as_ptr().add(index))
    }
}

impl<T> Clone for RawSlice<T> {
    fn clone(&self) -> Self {
        Self {
            base: self.base,
            range: self.range.clone(),
        }
    }
}

// Only a view into a block owned by the list; the iterators carry the real bounds.
unsafe impl<T> Send for RawSlice<T> {}

unsafe impl<T> Sync for RawSlice<T> {}

pub(super) struct RawIter<'a, T, A: Allocator + Clone> {
    chunks: RawChunksIter<'a, T, A>,
    len: usize,
    front: RawSlice<T>,
    back: RawSlice<T>,
}

impl<'a, T, A: Allocator + Clone> RawIter<'a, T, A> {
    pub(super) fn new(list: &'a UnrolledList<T, A>) -> Self {
        Self {
            len: list.len(),
            chunks: RawChunksIter::new(list),
            front: RawSlice::empty(),
            back: RawSlice::empty(),
        }
    }

    pub(super) fn new_mut(list: &'a mut UnrolledList<T, A>) -> Self {
        Self {
            len: list.len(),
            chunks: RawChunksIter::new_mut(list),
            front: RawSlice::empty(),
            back: RawSlice::empty(),
        }
    }
}

impl<'a, T, A: Allocator + Clone> Iterator for RawIter<'a, T, A> {
    type Item = NonNull<T>;

    fn next(&mut self) -> Option<NonNull<T>> {
        #[allow(clippy::iter_nth_zero)]
        self.nth(0)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }

    fn nth(&mut self, n: usize) -> Option<NonNull<T>> {
        let mut remaining = n + 1;

        if remaining > self.len {
            self.len = 0;
            return None;
        } else {
            self.len -= remaining;
        }

        loop {
            let mut slice = &mut self.front;

            if slice.range.is_empty() {
                if let Some(next_chunk) = self.chunks.next() {
                    *slice = RawSlice::new(next_chunk);
                } else {
                    slice = &mut self.back;
                }
            }

            debug_assert!(!slice.range.is_empty());

            let offset = slice.range.len().min(remaining);
            remaining -= offset;
            slice.range.start += offset;

            if remaining == 0 {
                return Some(unsafe { slice.get(slice.range.start - 1) });
            }
        }
    }
}

impl<'a, T, A: Allocator + Clone> DoubleEndedIterator for RawIter<'a, T, A> {
    fn next_back(&mut self) -> Option<NonNull<T>> {
        self.nth_back(0)
    }

    fn nth_back(&mut self, n: usize) -> Option<NonNull<T>> {
        let mut remaining = n + 1;

        if remaining > self.len {
            self.len = 0;
            return None;
        } else {
            self.len -= remaining;
        }

        loop {
            let mut slice = &mut self.back;

            if slice.range.is_empty() {
                if let Some(next_chunk) = self.chunks.next_back() {
                    *slice = RawSlice::new(next_chunk);
                } else {
                    slice = &mut self.front;
                }
            }

            debug_assert!(!slice.range.is_empty());

            let offset = slice.range.len().min(remaining);
            remaining -= offset;
            slice.range.end -= offset;

            if remaining == 0 {
                return Some(unsafe { slice.get(slice.range.end) });
            }
        }
    }
}

impl<'a, T, A: Allocator + Clone> FusedIterator for RawIter<'a, T, A> {}

impl<'a, T, A: Allocator + Clone> ExactSizeIterator for RawIter<'a, T, A> {}

impl<'a, T, A: Allocator + Clone> Clone for RawIter<'a, T, A> {
    fn clone(&self) -> Self {
        Self {
            chunks: self.chunks.clone(),
            len: self.len,
            front: self.front.clone(),
            back: self.back.clone(),
        }
    }
}

/// Returned by [`UnrolledList::iter`].
pub struct Iter<'a, T: 'a, A: Allocator + Clone = Global> {
    raw: RawIter<'a, T, A>,
    _marker: PhantomData<&'a T>,
}

impl<'a, T: 'a, A: Allocator + Clone> Iter<'a, T, A> {
    pub(super) fn new(list: &'a UnrolledList<T, A>) -> Self {
        Self {
            raw: RawIter::new(list),
            _marker: PhantomData,
        }
    }
}

impl_iter! {
    on = Iter { 'a, T, A } where { T: 'a, A: Allocator + Clone };
    inner = raw;
    item = { &'a T };
    map = { |_this: &mut Self, ptr: NonNull<T>|
        unsafe {
            Some(ptr.as_ref())
        }
    };
    clone = { |this: &Self| Self {
        raw: this.raw.clone(),
        _marker: PhantomData,
    }};
}

/// Returned by [`UnrolledList::iter_mut`].
pub struct IterMut<'a, T: 'a, A: Allocator + Clone = Global> {
    raw: RawIter<'a, T, A>,
    _marker: PhantomData<&'a mut T>,
}

impl<'a, T: 'a, A: Allocator + Clone> IterMut<'a, T, A> {
    pub(super) fn new(list: &'a mut UnrolledList<T, A>) -> Self {
        Self {
            raw: RawIter::new_mut(list),
            _marker: PhantomData,
        }
    }
}

impl_iter! {
    on = IterMut { 'a, T, A } where { T: 'a, A: Allocator + Clone };
    inner = raw;
    item = { &'a mut T };
    map = { |_this: &mut Self, mut ptr: NonNull<T>|
        unsafe {
            Some(ptr.as_mut())
        }
    };
    clone = false;
}

/// Returned by [`UnrolledList::into_iter`].
///
/// Node blocks are detached from the chain one at a time as the iterator reaches
/// them, from either end. Elements not yet yielded are dropped with the iterator.
pub struct IntoIter<T, A: Allocator + Clone = Global> {
    list: UnrolledList<T, A>,
    front_node: Option<NodeId>,
    back_node: Option<NodeId>,
    nodes_left: usize,
    front: Option<vec::IntoIter<T, A>>,
    back: Option<vec::IntoIter<T, A>>,
    len: usize,
}

impl<T, A: Allocator + Clone> IntoIter<T, A> {
    pub(super) fn new(list: UnrolledList<T, A>) -> Self {
        Self {
            front_node: list.head,
            back_node: list.tail,
            nodes_left: list.node_count,
            len: list.len(),
            front: None,
            back: None,
            list,
        }
    }

    fn detach(&mut self, id: NodeId) -> vec::IntoIter<T, A> {
        let empty = Vec::new_in(self.list.nodes.allocator().clone());
        let block = core::mem::replace(&mut self.list.nodes.node_mut(id).block, empty);
        self.nodes_left -= 1;
        block.into_iter()
    }

    fn detach_front(&mut self) -> Option<vec::IntoIter<T, A>> {
        if self.nodes_left == 0 {
            return None;
        }

        let id = self.front_node?;
        self.front_node = self.list.nodes.node(id).next;
        Some(self.detach(id))
    }

    fn detach_back(&mut self) -> Option<vec::IntoIter<T, A>> {
        if self.nodes_left == 0 {
            return None;
        }

        let id = self.back_node?;
        self.back_node = self.list.nodes.node(id).prev;
        Some(self.detach(id))
    }
}

impl<T, A: Allocator + Clone> Iterator for IntoIter<T, A> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        loop {
            if let Some(value) = self.front.as_mut().and_then(Iterator::next) {
                self.len -= 1;
                return Some(value);
            }

            match self.detach_front() {
                Some(block) => self.front = Some(block),
                None => {
                    let value = self.back.as_mut()?.next()?;
                    self.len -= 1;
                    return Some(value);
                }
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<T, A: Allocator + Clone> DoubleEndedIterator for IntoIter<T, A> {
    fn next_back(&mut self) -> Option<T> {
        loop {
            if let Some(value) = self.back.as_mut().and_then(DoubleEndedIterator::next_back) {
                self.len -= 1;
                return Some(value);
            }

            match self.detach_back() {
                Some(block) => self.back = Some(block),
                None => {
                    let value = self.front.as_mut()?.next_back()?;
                    self.len -= 1;
                    return Some(value);
                }
            }
        }
    }
}

impl<T, A: Allocator + Clone> FusedIterator for IntoIter<T, A> {}

impl<T, A: Allocator + Clone> ExactSizeIterator for IntoIter<T, A> {}

impl<T, A: Allocator + Clone> core::fmt::Debug for IntoIter<T, A> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("IntoIter").field("remaining", &self.len).finish()
    }
}
