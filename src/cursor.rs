//! Detached positions into an [`UnrolledList`] and the direction markers.

use core::fmt::Debug;
use core::marker::PhantomData;

use allocator_api2::alloc::Allocator;

use crate::arena::NodeId;
use crate::UnrolledList;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct NodeRef {
    owner: usize,
    id: NodeId,
    generation: u64,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Position {
    node: Option<NodeRef>,
    index: usize,
}

impl Position {
    pub(crate) const END: Self = Self {
        node: None,
        index: 0,
    };
}

impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        match (self.node, other.node) {
            (None, None) => true,
            (Some(a), Some(b)) => a == b && self.index == other.index,
            _ => false,
        }
    }
}

impl Eq for Position {}

impl<T, A: Allocator + Clone> UnrolledList<T, A> {
    pub(crate) fn position_at(&self, id: NodeId, index: usize) -> Position {
        Position {
            node: Some(NodeRef {
                owner: self.nodes.owner(),
                id,
                generation: self.nodes.generation(id),
            }),
            index,
        }
    }

    pub(crate) fn first_position(&self) -> Position {
        match self.head {
            Some(head) => self.position_at(head, 0),
            None => Position::END,
        }
    }

    pub(crate) fn last_position(&self) -> Position {
        match self.tail {
            Some(tail) => self.position_at(tail, self.tail_size() - 1),
            None => Position::END,
        }
    }

    pub(crate) fn is_live(&self, position: Position) -> bool {
        match position.node {
            None => true,
            Some(node) => self
                .nodes
                .get_checked(node.owner, node.id, node.generation)
                .is_some_and(|live| position.index < live.block.len()),
        }
    }

    /// Maps a position to its node and slot, or `None` for the end position.
    #[track_caller]
    pub(crate) fn resolve(&self, position: Position) -> Option<(NodeId, usize)> {
        let node = position.node?;

        if !self.is_live(position) {
            panic!(
                "stale cursor (node={}, index={})",
                node.id.index(),
                position.index
            );
        }

        Some((node.id, position.index))
    }

    #[track_caller]
    pub(crate) fn step_forward(&self, position: Position) -> Position {
        let Some((id, index)) = self.resolve(position) else {
            return self.first_position();
        };

        let node = self.nodes.node(id);

        if index + 1 < node.block.len() {
            Position {
                index: index + 1,
                ..position
            }
        } else {
            match node.next {
                Some(next) => self.position_at(next, 0),
                None => Position::END,
            }
        }
    }

    #[track_caller]
    pub(crate) fn step_backward(&self, position: Position) -> Position {
        let Some((id, index)) = self.resolve(position) else {
            return self.last_position();
        };

        if index > 0 {
            return Position {
                index: index - 1,
                ..position
            };
        }

        // Live length, not node size: the node entered may be partially filled.
        match self.nodes.node(id).prev {
            Some(prev) => self.position_at(prev, self.nodes.node(prev).block.len() - 1),
            None => Position::END,
        }
    }
}

/// Selects which way a [`Cursor`] moves on [`move_next`](Cursor::move_next).
///
/// Implemented by [`Forward`] and [`Reverse`] only.
pub trait Direction: Copy + Debug + private::Sealed {
    #[doc(hidden)]
    fn advance<T, A: Allocator + Clone>(cursor: &mut Cursor<Self>, list: &UnrolledList<T, A>);

    #[doc(hidden)]
    fn retreat<T, A: Allocator + Clone>(cursor: &mut Cursor<Self>, list: &UnrolledList<T, A>);

    #[doc(hidden)]
    fn erase<T, A: Allocator + Clone>(
        list: &mut UnrolledList<T, A>,
        cursor: Cursor<Self>,
    ) -> Cursor<Self>;
}

/// Moves from the first element towards the last.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Forward;

/// Moves from the last element towards the first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Reverse;

impl Direction for Forward {
    fn advance<T, A: Allocator + Clone>(cursor: &mut Cursor<Self>, list: &UnrolledList<T, A>) {
        cursor.position = list.step_forward(cursor.position);
    }

    fn retreat<T, A: Allocator + Clone>(cursor: &mut Cursor<Self>, list: &UnrolledList<T, A>) {
        cursor.position = list.step_backward(cursor.position);
    }

    fn erase<T, A: Allocator + Clone>(
        list: &mut UnrolledList<T, A>,
        cursor: Cursor<Self>,
    ) -> Cursor<Self> {
        // The follower slides into the erased slot.
        Cursor::new(list.erase_at(cursor.position))
    }
}

impl Direction for Reverse {
    fn advance<T, A: Allocator + Clone>(cursor: &mut Cursor<Self>, list: &UnrolledList<T, A>) {
        cursor.position = list.step_backward(cursor.position);
    }

    fn retreat<T, A: Allocator + Clone>(cursor: &mut Cursor<Self>, list: &UnrolledList<T, A>) {
        cursor.position = list.step_forward(cursor.position);
    }

    fn erase<T, A: Allocator + Clone>(
        list: &mut UnrolledList<T, A>,
        cursor: Cursor<Self>,
    ) -> Cursor<Self> {
        // The follower is the physical predecessor, which compaction never moves.
        if cursor.is_end() {
            panic!("cannot erase at the end position");
        }

        let follower = list.step_backward(cursor.position);
        list.erase_at(cursor.position);
        Cursor::new(follower)
    }
}

/// A position in an [`UnrolledList`], moving in direction `D`.
///
/// A cursor is a `(node, slot)` pair. It does not borrow the list: every
/// dereference or step takes the list as an argument, so a cursor can be kept
/// while the list is pushed to, and can be handed to [`UnrolledList::erase`].
///
/// # Invalidation
///
/// Each node carries a generation that changes when the node is freed, and each
/// chain of nodes carries an identity of its own. A cursor remembers both for the
/// node it points into and is checked against them on every use:
///
/// - Appending never invalidates a cursor.
/// - Any operation that frees the cursor's node (popping the last element of the
///   tail, an erase that empties the tail, shrinking, clearing, assignment)
///   invalidates it.
/// - A cursor whose node is still alive but whose slot is no longer occupied
///   (for example after [`UnrolledList::pop_back`]) is also invalid.
/// - A cursor used with a list other than the one that produced it is invalid.
///   [`UnrolledList::take`] moves the chain, so cursors follow it into the
///   returned list and are invalid for the emptied one; the same holds for
///   `*list = other.take()`.
///
/// Using an invalid cursor panics. Only the end position is shared by all lists.
///
/// # The end position
///
/// [`UnrolledList::end`] and [`UnrolledList::rend`] return the same position,
/// which sits between the last and the first element and dereferences to `None`.
/// Stepping past the last element in direction `D` reaches it, stepping again
/// wraps around to the first element.
///
/// # Examples
///
/// ```
/// # use unrolled_list::UnrolledList;
/// let mut list = UnrolledList::with_node_size(2);
/// list.extend([1, 2, 3]);
///
/// let mut cursor = list.begin();
/// assert_eq!(cursor.get(&list), Some(&1));
///
/// cursor.move_next(&list);
/// cursor.move_next(&list);
/// assert_eq!(cursor.get(&list), Some(&3));
///
/// // Appending keeps the cursor valid.
/// list.push_back(4);
/// cursor.move_next(&list);
/// assert_eq!(cursor.get(&list), Some(&4));
///
/// cursor.move_next(&list);
/// assert_eq!(cursor, list.end());
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Cursor<D: Direction = Forward> {
    position: Position,
    _direction: PhantomData<D>,
}

impl<D: Direction> Cursor<D> {
    pub(crate) fn new(position: Position) -> Self {
        Self {
            position,
            _direction: PhantomData,
        }
    }

    /// Returns `true` if this is the end position.
    pub fn is_end(&self) -> bool {
        self.position.node.is_none()
    }

    /// Returns `true` if the cursor can still be used with `list`.
    ///
    /// The end position is always valid.
    pub fn is_valid<T, A: Allocator + Clone>(&self, list: &UnrolledList<T, A>) -> bool {
        list.is_live(self.position)
    }

    /// Returns the element under the cursor, or `None` at the end position.
    ///
    /// # Panics
    ///
    /// If the cursor has been invalidated.
    #[track_caller]
    pub fn get<'a, T, A: Allocator + Clone>(&self, list: &'a UnrolledList<T, A>) -> Option<&'a T> {
        let (id, index) = list.resolve(self.position)?;
        Some(&list.nodes.node(id).block[index])
    }

    /// Like [`get`](Cursor::get), but returning a mutable reference.
    #[track_caller]
    pub fn get_mut<'a, T, A: Allocator + Clone>(
        &self,
        list: &'a mut UnrolledList<T, A>,
    ) -> Option<&'a mut T> {
        let (id, index) = list.resolve(self.position)?;
        Some(&mut list.nodes.node_mut(id).block[index])
    }

    /// Moves to the next element in direction `D`, crossing node boundaries.
    ///
    /// From the last element this reaches the end position; from the end position
    /// it wraps to the first element.
    ///
    /// # Panics
    ///
    /// If the cursor has been invalidated.
    #[track_caller]
    pub fn move_next<T, A: Allocator + Clone>(&mut self, list: &UnrolledList<T, A>) {
        D::advance(self, list);
    }

    /// Moves to the previous element in direction `D`.
    ///
    /// # Panics
    ///
    /// If the cursor has been invalidated.
    #[track_caller]
    pub fn move_prev<T, A: Allocator + Clone>(&mut self, list: &UnrolledList<T, A>) {
        D::retreat(self, list);
    }
}

impl<D: Direction, E: Direction> PartialEq<Cursor<E>> for Cursor<D> {
    fn eq(&self, other: &Cursor<E>) -> bool {
        self.position == other.position
    }
}

impl<D: Direction> Eq for Cursor<D> {}

mod private {
    pub trait Sealed {}

    impl Sealed for super::Forward {}

    impl Sealed for super::Reverse {}
}
