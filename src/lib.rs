#![doc = include_str!("doc.md")]
#![cfg_attr(not(any(test, doc)), no_std)]
#![cfg_attr(feature = "nightly", feature(allocator_api))]
#![warn(missing_debug_implementations, missing_docs)]

extern crate alloc;

use alloc::alloc::handle_alloc_error;
use core::alloc::Layout;
use core::cmp::Ordering;
use core::fmt::{self, Debug, Formatter};
use core::hash::{Hash, Hasher};
use core::mem;
use core::ops::{Index, IndexMut};

use allocator_api2::alloc::{AllocError, Allocator, Global};

pub use cursor::{Cursor, Direction, Forward, Reverse};
pub use error::Error;
pub use iter::{ChunksIter, ChunksIterMut, IntoIter, Iter, IterMut};
pub use node_size::DEFAULT_NODE_SIZE;

use crate::arena::{Arena, NodeId};
use crate::cursor::Position;
use crate::node_size::NodeSize;
use crate::util::debug_invariants;

mod arena;
mod cursor;
mod error;
mod iter;
mod node_size;
mod util;

/// A sequence stored as a doubly-linked chain of fixed-capacity blocks.
///
/// Every block ("node") holds exactly [`node_size`](UnrolledList::node_size)
/// elements except the last one, which holds between one and `node_size`.
/// Appending and popping at the back are amortized O(1) and never move existing
/// elements. Indexing walks the chain and is O(len / node_size). Erasing shifts
/// every element after the erased one by a single slot, pulling the first element
/// of each following node into the node before it.
///
/// Positions are described by [`Cursor`]s, which do not borrow the list.
///
/// # Examples
///
/// ```
/// # use unrolled_list::UnrolledList;
/// let mut list = UnrolledList::with_node_size(4);
/// list.extend(0..10);
///
/// assert_eq!(list.node_count(), 3);
/// assert_eq!(list.tail_size(), 2);
///
/// let cursor = list.find(&3);
/// let after = list.erase(cursor);
/// assert_eq!(after.get(&list), Some(&4));
/// assert!(Iterator::eq(list.iter().copied(), [0, 1, 2, 4, 5, 6, 7, 8, 9]));
/// ```
pub struct UnrolledList<T, A: Allocator + Clone = Global> {
    nodes: Arena<T, A>,
    head: Option<NodeId>,
    tail: Option<NodeId>,
    node_size: NodeSize,
    node_count: usize,
}

impl<T> Default for UnrolledList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> UnrolledList<T> {
    /// Creates an empty list with [`DEFAULT_NODE_SIZE`] elements per node.
    ///
    /// # Examples
    ///
    /// ```
    /// # use unrolled_list::UnrolledList;
    /// let list = UnrolledList::<u32>::new();
    /// assert_eq!(list.node_size(), 50);
    /// ```
    pub fn new() -> Self {
        Self::new_in(Global)
    }

    /// Creates an empty list with `node_size` elements per node.
    ///
    /// # Panics
    ///
    /// If `node_size` is zero.
    ///
    /// # Examples
    ///
    /// ```
    /// # use unrolled_list::UnrolledList;
    /// let list = UnrolledList::<u32>::with_node_size(8);
    /// assert_eq!(list.node_size(), 8);
    /// ```
    #[track_caller]
    pub fn with_node_size(node_size: usize) -> Self {
        Self::with_node_size_in(node_size, Global)
    }

    /// Creates a list with `node_size` elements per node holding the elements of `iter`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use unrolled_list::UnrolledList;
    /// let list = UnrolledList::from_iter_with_node_size(0..7, 3);
    ///
    /// let expected: [&[i32]; 3] = [&[0, 1, 2], &[3, 4, 5], &[6]];
    /// assert!(Iterator::eq(list.chunks(), expected));
    /// ```
    #[track_caller]
    pub fn from_iter_with_node_size<I: IntoIterator<Item = T>>(iter: I, node_size: usize) -> Self {
        let mut list = Self::with_node_size(node_size);
        list.extend(iter);
        list
    }
}

impl<T, A: Allocator + Clone> UnrolledList<T, A> {
    /// Creates an empty list with the default node size and a custom allocator.
    ///
    /// Every node block, and the table the nodes live in, is allocated with `alloc`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use allocator_api2::alloc::Global;
    /// # use unrolled_list::UnrolledList;
    /// let list = UnrolledList::<u32, _>::new_in(Global);
    /// assert!(list.is_empty());
    /// ```
    pub fn new_in(alloc: A) -> Self {
        Self::with_node_size_in(DEFAULT_NODE_SIZE, alloc)
    }

    /// Creates an empty list with `node_size` elements per node and a custom allocator.
    ///
    /// # Panics
    ///
    /// If `node_size` is zero.
    #[track_caller]
    pub fn with_node_size_in(node_size: usize, alloc: A) -> Self {
        Self {
            nodes: Arena::new_in(alloc),
            head: None,
            tail: None,
            node_size: NodeSize::new(node_size),
            node_count: 0,
        }
    }

    /// Access the allocator used by the list.
    pub fn allocator(&self) -> &A {
        self.nodes.allocator()
    }

    /// Returns the number of elements in the list.
    ///
    /// # Examples
    ///
    /// ```
    /// # use unrolled_list::UnrolledList;
    /// let mut list = UnrolledList::with_node_size(2);
    /// assert_eq!(list.len(), 0);
    ///
    /// list.extend([1, 2, 3]);
    /// assert_eq!(list.len(), 3);
    /// ```
    pub fn len(&self) -> usize {
        match self.node_count {
            0 => 0,
            nodes => self.node_size.cumulative_capacity(nodes - 1) + self.tail_size(),
        }
    }

    /// Returns `true` if the list contains no elements.
    pub fn is_empty(&self) -> bool {
        self.node_count == 0
    }

    /// Returns the number of element slots in every node.
    pub fn node_size(&self) -> usize {
        self.node_size.get()
    }

    /// Returns the number of nodes currently in the chain.
    ///
    /// # Examples
    ///
    /// ```
    /// # use unrolled_list::UnrolledList;
    /// let mut list = UnrolledList::with_node_size(50);
    /// list.extend(0..101);
    /// assert_eq!(list.node_count(), 3);
    /// ```
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Returns the number of elements in the last node, or zero if the list is empty.
    pub fn tail_size(&self) -> usize {
        self.tail
            .map_or(0, |tail| self.nodes.node(tail).block.len())
    }

    /// Returns a reference to the first element, or `None` if the list is empty.
    pub fn front(&self) -> Option<&T> {
        self.nodes.node(self.head?).block.first()
    }

    /// Returns a mutable reference to the first element, or `None` if the list is empty.
    pub fn front_mut(&mut self) -> Option<&mut T> {
        self.nodes.node_mut(self.head?).block.first_mut()
    }

    /// Returns a reference to the last element, or `None` if the list is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// # use unrolled_list::UnrolledList;
    /// let mut list = UnrolledList::new();
    /// assert_eq!(list.back(), None);
    ///
    /// list.push_back(1);
    /// list.push_back(2);
    /// assert_eq!(list.front(), Some(&1));
    /// assert_eq!(list.back(), Some(&2));
    /// ```
    pub fn back(&self) -> Option<&T> {
        self.nodes.node(self.tail?).block.last()
    }

    /// Returns a mutable reference to the last element, or `None` if the list is empty.
    pub fn back_mut(&mut self) -> Option<&mut T> {
        self.nodes.node_mut(self.tail?).block.last_mut()
    }

    /// Returns a reference to the element located at the index, or `None` if the index is out of bounds.
    ///
    /// The chain is walked from whichever end is closer, so this is O(node count).
    /// Prefer [`iter`](UnrolledList::iter) or a [`Cursor`] for sequential access.
    ///
    /// # Examples
    ///
    /// ```
    /// # use unrolled_list::UnrolledList;
    /// let mut list = UnrolledList::new();
    /// assert_eq!(list.get(0), None);
    ///
    /// list.push_back(1);
    /// assert_eq!(list.get(0), Some(&1));
    /// ```
    pub fn get(&self, index: usize) -> Option<&T> {
        let (id, offset) = self.locate(index)?;
        Some(&self.nodes.node(id).block[offset])
    }

    /// Returns a mutable reference to the element located at the index, or `None` if the index is out of bounds.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        let (id, offset) = self.locate(index)?;
        Some(&mut self.nodes.node_mut(id).block[offset])
    }

    /// Returns a reference to the element located at the index.
    ///
    /// # Errors
    ///
    /// [`Error::IndexOutOfRange`] if `index >= self.len()`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use unrolled_list::{Error, UnrolledList};
    /// let list = UnrolledList::from_iter([1, 2, 3]);
    ///
    /// assert_eq!(list.at(2), Ok(&3));
    /// assert_eq!(list.at(3), Err(Error::IndexOutOfRange { index: 3, len: 3 }));
    /// ```
    pub fn at(&self, index: usize) -> Result<&T, Error> {
        self.get(index).ok_or(Error::IndexOutOfRange {
            index,
            len: self.len(),
        })
    }

    /// Like [`at`](UnrolledList::at), but returning a mutable reference.
    pub fn at_mut(&mut self, index: usize) -> Result<&mut T, Error> {
        let len = self.len();
        self.get_mut(index)
            .ok_or(Error::IndexOutOfRange { index, len })
    }

    fn locate(&self, index: usize) -> Option<(NodeId, usize)> {
        if index >= self.len() {
            return None;
        }

        let (node_number, offset) = self.node_size.translate_index(index);

        let id = if node_number <= self.node_count / 2 {
            let mut id = self.head?;
            for _ in 0..node_number {
                id = self.nodes.node(id).next?;
            }
            id
        } else {
            let mut id = self.tail?;
            for _ in node_number + 1..self.node_count {
                id = self.nodes.node(id).prev?;
            }
            id
        };

        Some((id, offset))
    }

    /// Adds an element to the end of the list.
    ///
    /// # Panics
    ///
    /// If the allocator fails to allocate a new node. Use
    /// [`try_push_back`](UnrolledList::try_push_back) to recover from that.
    ///
    /// # Examples
    ///
    /// ```
    /// # use unrolled_list::UnrolledList;
    /// let mut list = UnrolledList::with_node_size(2);
    /// list.push_back(1);
    /// list.push_back(2);
    /// list.push_back(3);
    ///
    /// assert_eq!(list[2], 3);
    /// assert_eq!(list.node_count(), 2);
    /// ```
    pub fn push_back(&mut self, value: T) {
        self.try_push_internal(value)
            .unwrap_or_else(|(_, layout)| handle_alloc_error(layout));
    }

    /// Adds an element to the end of the list, handling memory allocation failure gracefully.
    ///
    /// On failure the list is unchanged and `value` is dropped.
    ///
    /// # Examples
    ///
    /// We generally don't expect allocation to fail:
    ///
    /// ```
    /// # use unrolled_list::UnrolledList;
    /// let mut list = UnrolledList::new();
    /// assert!(list.try_push_back(1).is_ok());
    /// ```
    ///
    /// But it might:
    ///
    /// ```
    /// # use std::alloc::Layout;
    /// # use std::ptr::NonNull;
    /// # use allocator_api2::alloc::{Allocator, AllocError};
    /// # use unrolled_list::UnrolledList;
    /// #[derive(Clone)]
    /// struct DummyAllocator;
    ///
    /// unsafe impl Allocator for DummyAllocator {
    ///     fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
    ///         Err(AllocError)
    ///     }
    ///
    ///     unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {}
    /// }
    ///
    /// let mut list = UnrolledList::new_in(DummyAllocator);
    /// assert!(list.try_push_back(1).is_err());
    /// assert!(list.is_empty());
    /// ```
    pub fn try_push_back(&mut self, value: T) -> Result<(), AllocError> {
        self.try_push_internal(value)
            .map(|_| ())
            .map_err(|(err, _)| err)
    }

    /// Appends the value produced by `make` and returns a reference to it.
    ///
    /// # Examples
    ///
    /// ```
    /// # use unrolled_list::UnrolledList;
    /// let mut list = UnrolledList::new();
    /// let value = list.emplace_back(|| String::from("first"));
    /// value.push_str(" element");
    ///
    /// assert_eq!(list.back().map(String::as_str), Some("first element"));
    /// ```
    pub fn emplace_back<F: FnOnce() -> T>(&mut self, make: F) -> &mut T {
        let value = make();
        let tail = self
            .try_push_internal(value)
            .unwrap_or_else(|(_, layout)| handle_alloc_error(layout));

        let block = &mut self.nodes.node_mut(tail).block;
        let last = block.len() - 1;
        &mut block[last]
    }

    fn try_push_internal(&mut self, value: T) -> Result<NodeId, (AllocError, Layout)> {
        let tail = self.tail_with_room()?;
        self.nodes.node_mut(tail).block.push(value);

        debug_invariants!(self);
        Ok(tail)
    }

    /// Like [`extend`](UnrolledList::extend), but with graceful handling of allocation failure.
    ///
    /// If the method fails, the elements appended so far stay in the list and the
    /// rest of the iterator is left unconsumed.
    ///
    /// # Examples
    ///
    /// ```
    /// # use unrolled_list::UnrolledList;
    /// let mut list = UnrolledList::new();
    /// assert!(list.try_extend(0..100).is_ok());
    /// assert_eq!(list.len(), 100);
    /// ```
    pub fn try_extend<I: IntoIterator<Item = T>>(&mut self, iter: I) -> Result<(), AllocError> {
        self.try_extend_internal(iter).map_err(|(err, _)| err)
    }

    fn try_extend_internal<I: IntoIterator<Item = T>>(
        &mut self,
        iter: I,
    ) -> Result<(), (AllocError, Layout)> {
        let node_size = self.node_size.get();
        let mut iter = iter.into_iter();

        let Some(mut next) = iter.next() else { return Ok(()) };

        loop {
            let tail = self.tail_with_room()?;
            let block = &mut self.nodes.node_mut(tail).block;
            block.push(next);

            while block.len() < node_size {
                match iter.next() {
                    Some(value) => block.push(value),
                    None => {
                        debug_invariants!(self);
                        return Ok(());
                    }
                }
            }

            next = match iter.next() {
                Some(next) => next,
                None => {
                    debug_invariants!(self);
                    return Ok(());
                }
            };
        }
    }

    fn tail_with_room(&mut self) -> Result<NodeId, (AllocError, Layout)> {
        match self.tail {
            Some(tail) if self.nodes.node(tail).block.len() < self.node_size.get() => Ok(tail),
            _ => self.try_add_node(),
        }
    }

    #[inline(never)]
    fn try_add_node(&mut self) -> Result<NodeId, (AllocError, Layout)> {
        let id = self
            .nodes
            .try_alloc(self.node_size.get(), self.tail)
            .map_err(|err| (err, self.node_size.block_layout::<T>()))?;

        if self.head.is_none() {
            self.head = Some(id);
        }

        self.tail = Some(id);
        self.node_count += 1;
        Ok(id)
    }

    /// Removes and returns the last element in the list, if it exists.
    ///
    /// When the last node becomes empty it is freed, which invalidates every
    /// [`Cursor`] into it.
    ///
    /// # Examples
    ///
    /// ```
    /// # use unrolled_list::UnrolledList;
    /// let mut list = UnrolledList::with_node_size(1);
    ///
    /// list.push_back(1);
    /// list.push_back(2);
    ///
    /// assert_eq!(list.pop_back(), Some(2));
    /// assert_eq!(list.node_count(), 1);
    /// assert_eq!(list.pop_back(), Some(1));
    /// assert_eq!(list.pop_back(), None);
    /// ```
    pub fn pop_back(&mut self) -> Option<T> {
        let tail = self.tail?;
        let block = &mut self.nodes.node_mut(tail).block;
        let value = block.pop();

        if block.is_empty() {
            self.free_tail();
        }

        debug_invariants!(self);
        value
    }

    fn free_tail(&mut self) {
        let Some(tail) = self.tail else { return };

        self.tail = self.nodes.node(tail).prev;
        if self.tail.is_none() {
            self.head = None;
        }

        self.nodes.free_suffix(tail);
        self.node_count -= 1;
    }

    /// Shortens the list, keeping the first `len` elements.
    ///
    /// Whole nodes are freed from the back while that does not go below `len`;
    /// the remainder is cut from the last node in one step. Does nothing if the
    /// list is already shorter.
    ///
    /// # Examples
    ///
    /// ```
    /// # use unrolled_list::UnrolledList;
    /// let mut list = UnrolledList::from_iter_with_node_size(0..10, 4);
    /// list.truncate(5);
    ///
    /// assert!(Iterator::eq(list.iter().copied(), 0..5));
    /// assert_eq!(list.node_count(), 2);
    /// assert_eq!(list.tail_size(), 1);
    /// ```
    pub fn truncate(&mut self, len: usize) {
        while self.len() > len {
            let tail_size = self.tail_size();

            if self.len() - tail_size >= len {
                self.free_tail();
            } else if let Some(tail) = self.tail {
                let excess = self.len() - len;
                self.nodes.node_mut(tail).block.truncate(tail_size - excess);
            }
        }

        debug_invariants!(self);
    }

    /// Resizes the list so that its length equals `new_len`.
    ///
    /// Growing appends the values returned by `fill`, shrinking behaves like
    /// [`truncate`](UnrolledList::truncate).
    ///
    /// # Examples
    ///
    /// ```
    /// # use unrolled_list::UnrolledList;
    /// let mut list = UnrolledList::from_iter([1, 2]);
    /// let mut next = 10;
    /// list.resize_with(4, || { next += 1; next });
    ///
    /// assert!(Iterator::eq(list.iter().copied(), [1, 2, 11, 12]));
    /// ```
    pub fn resize_with<F: FnMut() -> T>(&mut self, new_len: usize, fill: F) {
        let len = self.len();

        if new_len <= len {
            self.truncate(new_len);
        } else {
            self.extend(core::iter::repeat_with(fill).take(new_len - len));
        }
    }

    /// Resizes the list so that its length equals `new_len`, appending clones of `value` when growing.
    ///
    /// # Examples
    ///
    /// ```
    /// # use unrolled_list::UnrolledList;
    /// let mut list = UnrolledList::from_iter_with_node_size(0..101, 50);
    ///
    /// list.resize(151, 69);
    /// assert_eq!(list.node_count(), 4);
    /// assert!(list.iter().skip(101).all(|&value| value == 69));
    ///
    /// list.resize(50, 0);
    /// assert_eq!(list.node_count(), 1);
    /// assert_eq!(list.tail_size(), 50);
    /// ```
    pub fn resize(&mut self, new_len: usize, value: T)
    where
        T: Clone,
    {
        self.resize_with(new_len, || value.clone());
    }

    /// Like [`resize`](UnrolledList::resize), but filling with `T::default()`.
    pub fn resize_default(&mut self, new_len: usize)
    where
        T: Default,
    {
        self.resize_with(new_len, T::default);
    }

    /// Removes every element, freeing all nodes.
    ///
    /// Freed node blocks are kept for reuse by later pushes; call
    /// [`shrink_to_fit`](UnrolledList::shrink_to_fit) to release them.
    pub fn clear(&mut self) {
        if let Some(head) = self.head {
            self.nodes.free_suffix(head);
        }

        self.head = None;
        self.tail = None;
        self.node_count = 0;
    }

    /// Releases the memory of node blocks kept around after nodes were freed.
    pub fn shrink_to_fit(&mut self) {
        self.nodes.release_spare_blocks();
    }

    /// Returns a cursor to the first element equal to `value`, or [`end`](UnrolledList::end).
    ///
    /// # Examples
    ///
    /// ```
    /// # use unrolled_list::UnrolledList;
    /// let list = UnrolledList::from_iter_with_node_size([5, 6, 7, 6], 2);
    ///
    /// let mut cursor = list.find(&6);
    /// cursor.move_prev(&list);
    /// assert_eq!(cursor.get(&list), Some(&5));
    ///
    /// assert_eq!(list.find(&8), list.end());
    /// ```
    pub fn find(&self, value: &T) -> Cursor<Forward>
    where
        T: PartialEq,
    {
        let mut current = self.head;

        while let Some(id) = current {
            let node = self.nodes.node(id);

            if let Some(index) = node.block.iter().position(|item| item == value) {
                return Cursor::new(self.position_at(id, index));
            }

            current = node.next;
        }

        self.end()
    }

    /// Returns `true` if the list contains an element equal to `value`.
    pub fn contains(&self, value: &T) -> bool
    where
        T: PartialEq,
    {
        self.find(value) != self.end()
    }

    /// Returns a forward cursor to the first element, or the end position if the list is empty.
    pub fn begin(&self) -> Cursor<Forward> {
        Cursor::new(self.first_position())
    }

    /// Returns the end position for forward cursors.
    pub fn end(&self) -> Cursor<Forward> {
        Cursor::new(Position::END)
    }

    /// Returns a reverse cursor to the last element, or the end position if the list is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// # use unrolled_list::UnrolledList;
    /// let list = UnrolledList::from_iter_with_node_size(0..5, 2);
    ///
    /// let mut cursor = list.rbegin();
    /// let mut values = Vec::new();
    /// while cursor != list.rend() {
    ///     values.push(*cursor.get(&list).unwrap());
    ///     cursor.move_next(&list);
    /// }
    ///
    /// assert_eq!(values, [4, 3, 2, 1, 0]);
    /// ```
    pub fn rbegin(&self) -> Cursor<Reverse> {
        Cursor::new(self.last_position())
    }

    /// Returns the end position for reverse cursors.
    pub fn rend(&self) -> Cursor<Reverse> {
        Cursor::new(Position::END)
    }

    /// Removes the element under `cursor` and returns a cursor to the element that followed it.
    ///
    /// "Followed" is in the cursor's direction. If the removed element was the
    /// last one in that direction, the end position is returned. Every element
    /// after the removed one moves back one slot, so other cursors past the
    /// removed position now point at a different element; a cursor into a node
    /// that gets freed becomes invalid. The returned cursor is always valid.
    ///
    /// # Panics
    ///
    /// If `cursor` is the end position or has been invalidated.
    ///
    /// # Examples
    ///
    /// ```
    /// # use unrolled_list::UnrolledList;
    /// let mut list = UnrolledList::from_iter_with_node_size(0..6, 2);
    ///
    /// let after = list.erase(list.find(&1));
    /// assert_eq!(after.get(&list), Some(&2));
    /// assert_eq!(list.chunks().map(<[i32]>::len).collect::<Vec<_>>(), [2, 2, 1]);
    ///
    /// let last = list.find(&5);
    /// assert_eq!(list.erase(last), list.end());
    /// ```
    #[track_caller]
    pub fn erase<D: Direction>(&mut self, cursor: Cursor<D>) -> Cursor<D> {
        D::erase(self, cursor)
    }

    /// Removes the element at `position`, returning the position now holding its follower.
    #[track_caller]
    pub(crate) fn erase_at(&mut self, position: Position) -> Position {
        let Some((id, index)) = self.resolve(position) else {
            panic!("cannot erase at the end position");
        };

        self.nodes.node_mut(id).block.remove(index);

        let mut current = id;
        while let Some(next) = self.nodes.node(current).next {
            let moved = self.nodes.node_mut(next).block.remove(0);
            self.nodes.node_mut(current).block.push(moved);
            current = next;
        }

        if self.tail_size() == 0 {
            self.free_tail();
        }

        debug_invariants!(self);

        if self.is_live(position) {
            position
        } else {
            Position::END
        }
    }

    /// Moves the whole chain into a new list, leaving this one empty.
    ///
    /// The returned list has the same node size and allocator. Cursors created
    /// from `self` before the call are valid for the returned list and invalid
    /// for `self`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use unrolled_list::UnrolledList;
    /// let mut list = UnrolledList::from_iter_with_node_size(0..5, 2);
    /// let moved = list.take();
    ///
    /// assert!(list.is_empty());
    /// assert_eq!(list.begin(), list.end());
    /// assert_eq!(list.node_size(), 2);
    /// assert!(Iterator::eq(moved.iter().copied(), 0..5));
    /// ```
    pub fn take(&mut self) -> Self {
        let empty = Self::with_node_size_in(self.node_size(), self.allocator().clone());
        mem::replace(self, empty)
    }

    /// Replaces the contents of this list with clones of the elements of `source`.
    ///
    /// The list keeps its own node size. When both lists use the same node size,
    /// existing nodes are overwritten in place, surplus nodes are freed and missing
    /// ones are appended. Otherwise the chain is rebuilt from scratch.
    ///
    /// # Examples
    ///
    /// ```
    /// # use unrolled_list::UnrolledList;
    /// let source = UnrolledList::from_iter_with_node_size(0..5, 2);
    ///
    /// let mut same = UnrolledList::from_iter_with_node_size(10..30, 2);
    /// same.assign(&source);
    /// assert_eq!(same, source);
    /// assert_eq!(same.node_count(), 3);
    ///
    /// let mut other = UnrolledList::with_node_size(4);
    /// other.assign(&source);
    /// assert_eq!(other, source);
    /// assert_eq!(other.node_count(), 2);
    /// ```
    pub fn assign(&mut self, source: &Self)
    where
        T: Clone,
    {
        if self.node_size != source.node_size {
            self.clear();
            self.extend(source.iter().cloned());
            return;
        }

        let mut dest = self.head;
        let mut src = source.head;
        let mut last = None;

        while let (Some(dest_id), Some(src_id)) = (dest, src) {
            overwrite_block(
                &mut self.nodes.node_mut(dest_id).block,
                &source.nodes.node(src_id).block,
            );

            last = Some(dest_id);
            dest = self.nodes.node(dest_id).next;
            src = source.nodes.node(src_id).next;
        }

        if let Some(surplus) = dest {
            self.node_count -= self.nodes.free_suffix(surplus);
            self.tail = last;

            if last.is_none() {
                self.head = None;
            }
        }

        while let Some(src_id) = src {
            let node = source.nodes.node(src_id);
            self.extend(node.block.iter().cloned());
            src = node.next;
        }

        debug_invariants!(self);
    }

    /// Replaces the contents of this list with the elements of `iter`, keeping the node size.
    pub fn assign_iter<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.clear();
        self.extend(iter);
    }

    /// Returns an iterator over the live part of every node, in order.
    ///
    /// Every chunk is non-empty, and all but the last hold exactly
    /// [`node_size`](UnrolledList::node_size) elements.
    ///
    /// ```
    /// # use unrolled_list::UnrolledList;
    /// # let list = UnrolledList::from_iter([1, 2, 3]);
    /// # assert!(
    /// Iterator::eq(list.chunks().flatten(), list.iter())
    /// # );
    /// ```
    pub fn chunks(&self) -> ChunksIter<T, A> {
        ChunksIter::new(self)
    }

    /// Like [`chunks`](UnrolledList::chunks), but returning mutable slices.
    pub fn chunks_mut(&mut self) -> ChunksIterMut<T, A> {
        ChunksIterMut::new(self)
    }

    /// Returns an iterator over each item in the list.
    ///
    /// # Examples
    ///
    /// ```
    /// # use unrolled_list::UnrolledList;
    /// let list = UnrolledList::from_iter([1, 2, 3]);
    /// let mut iter = list.iter();
    ///
    /// assert_eq!(iter.next(), Some(&1));
    /// assert_eq!(iter.next_back(), Some(&3));
    /// assert_eq!(iter.next(), Some(&2));
    /// assert_eq!(iter.next(), None);
    /// ```
    pub fn iter(&self) -> Iter<T, A> {
        Iter::new(self)
    }

    /// Like [`iter`](UnrolledList::iter), but returning mutable references.
    pub fn iter_mut(&mut self) -> IterMut<T, A> {
        IterMut::new(self)
    }

    #[cfg(debug_assertions)]
    #[track_caller]
    fn assert_invariants(&self) {
        assert_eq!(self.head.is_none(), self.node_count == 0);
        assert_eq!(self.tail.is_none(), self.node_count == 0);

        if let Some(head) = self.head {
            assert!(self.nodes.node(head).prev.is_none());
        }

        if let Some(tail) = self.tail {
            let tail_size = self.tail_size();

            assert!(self.nodes.node(tail).next.is_none());
            assert!(
                tail_size > 0 && tail_size <= self.node_size.get(),
                "tail occupancy out of range (tail_size={}, node_size={})",
                tail_size,
                self.node_size.get()
            );
        }

        #[cfg(test)]
        self.assert_chain();
    }

    #[cfg(all(test, debug_assertions))]
    #[track_caller]
    fn assert_chain(&self) {
        let mut count = 0;
        let mut prev = None;
        let mut current = self.head;

        while let Some(id) = current {
            let node = self.nodes.node(id);
            assert_eq!(node.prev, prev);

            if node.next.is_some() {
                assert_eq!(node.block.len(), self.node_size.get(), "inner node is not full");
            }

            count += 1;
            prev = Some(id);
            current = node.next;
        }

        assert_eq!(prev, self.tail);
        assert_eq!(count, self.node_count);
        assert_eq!(count, self.node_size.nodes_for(self.len()));
    }
}

fn overwrite_block<T: Clone, A: Allocator>(dest: &mut allocator_api2::vec::Vec<T, A>, src: &[T]) {
    dest.truncate(src.len());
    let (init, tail) = src.split_at(dest.len());
    dest.clone_from_slice(init);
    dest.extend_from_slice(tail);
}

impl<T, A: Allocator + Clone> Extend<T> for UnrolledList<T, A> {
    /// Extends the list with zero or more elements.
    ///
    /// # Examples
    ///
    /// ```
    /// # use unrolled_list::UnrolledList;
    /// let mut list = UnrolledList::new();
    /// list.extend(0..5);
    /// assert_eq!(list, UnrolledList::from_iter([0, 1, 2, 3, 4]));
    /// ```
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.try_extend_internal(iter)
            .unwrap_or_else(|(_, layout)| handle_alloc_error(layout))
    }
}

impl<'a, T: Copy + 'a, A: Allocator + Clone> Extend<&'a T> for UnrolledList<T, A> {
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        Extend::<T>::extend(self, iter.into_iter().copied())
    }
}

impl<T> FromIterator<T> for UnrolledList<T> {
    /// Creates a new list with the default node size holding the elements from an iterator.
    ///
    /// # Examples
    ///
    /// ```
    /// # use unrolled_list::UnrolledList;
    /// let mut expected = UnrolledList::new();
    /// let actual = UnrolledList::from_iter([1, 2]);
    ///
    /// expected.push_back(1);
    /// expected.push_back(2);
    ///
    /// assert_eq!(expected, actual);
    /// ```
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = Self::default();
        list.extend(iter);
        list
    }
}

impl<T, const N: usize> From<[T; N]> for UnrolledList<T> {
    fn from(values: [T; N]) -> Self {
        Self::from_iter(values)
    }
}

impl<T, A: Allocator + Clone> IntoIterator for UnrolledList<T, A> {
    type Item = T;
    type IntoIter = IntoIter<T, A>;

    /// Converts the list into an iterator.
    ///
    /// The iterator returns each element by value.
    /// When dropped, the returned iterator drops the rest of the elements.
    fn into_iter(self) -> IntoIter<T, A> {
        IntoIter::new(self)
    }
}

impl<'a, T, A: Allocator + Clone> IntoIterator for &'a UnrolledList<T, A> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T, A>;

    fn into_iter(self) -> Iter<'a, T, A> {
        self.iter()
    }
}

impl<'a, T, A: Allocator + Clone> IntoIterator for &'a mut UnrolledList<T, A> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T, A>;

    fn into_iter(self) -> IterMut<'a, T, A> {
        self.iter_mut()
    }
}

impl<T, A: Allocator + Clone> Index<usize> for UnrolledList<T, A> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        match self.get(index) {
            Some(result) => result,
            None => {
                panic!("index out of bounds (index={}, len={})", index, self.len());
            }
        }
    }
}

impl<T, A: Allocator + Clone> IndexMut<usize> for UnrolledList<T, A> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        let len = self.len();

        match self.get_mut(index) {
            Some(result) => result,
            None => {
                panic!("index out of bounds (index={}, len={})", index, len);
            }
        }
    }
}

impl<T: Debug, A: Allocator + Clone> Debug for UnrolledList<T, A> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_list().entries(self).finish()
    }
}

impl<T: Clone, A: Allocator + Clone> Clone for UnrolledList<T, A> {
    fn clone(&self) -> Self {
        let mut result = Self::with_node_size_in(self.node_size(), self.allocator().clone());
        result.extend(self.iter().cloned());
        result
    }

    /// Reuses the nodes of `self` where possible, see [`assign`](UnrolledList::assign).
    ///
    /// Unlike `clone`, the list keeps its own node size.
    fn clone_from(&mut self, source: &Self) {
        self.assign(source);
    }
}

impl<T: PartialEq, A: Allocator + Clone> PartialEq for UnrolledList<T, A> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && Iterator::eq(self.iter(), other.iter())
    }
}

impl<T: Eq, A: Allocator + Clone> Eq for UnrolledList<T, A> {}

impl<T: Hash, A: Allocator + Clone> Hash for UnrolledList<T, A> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.len());

        for value in self.iter() {
            Hash::hash(value, state);
        }
    }
}

impl<T: PartialOrd, A: Allocator + Clone> PartialOrd for UnrolledList<T, A> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Iterator::partial_cmp(self.iter(), other.iter())
    }
}

impl<T: Ord, A: Allocator + Clone> Ord for UnrolledList<T, A> {
    fn cmp(&self, other: &Self) -> Ordering {
        Iterator::cmp(self.iter(), other.iter())
    }
}
