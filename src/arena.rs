use core::mem;
use core::sync::atomic::{AtomicUsize, Ordering};

use allocator_api2::alloc::{AllocError, Allocator};
use allocator_api2::vec::Vec;

/// Stable index of a node slot inside an [`Arena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(usize);

impl NodeId {
    pub(crate) fn index(self) -> usize {
        self.0
    }
}

/// A fixed-capacity block plus its links.
///
/// The block's length is the number of live slots, its capacity is the list's
/// node size. `next` is the owning direction of the chain, `prev` is only used
/// to walk backwards.
pub(crate) struct Node<T, A: Allocator> {
    pub(crate) block: Vec<T, A>,
    pub(crate) prev: Option<NodeId>,
    pub(crate) next: Option<NodeId>,
}

enum Entry<T, A: Allocator> {
    Occupied(Node<T, A>),
    Vacant {
        next_free: Option<NodeId>,
        // Emptied block kept around so the next allocation can skip the allocator.
        spare: Option<Vec<T, A>>,
    },
}

struct Slot<T, A: Allocator> {
    generation: u64,
    entry: Entry<T, A>,
}

static NEXT_OWNER: AtomicUsize = AtomicUsize::new(0);

/// Dense storage for the nodes of one list.
///
/// Freed slots are threaded onto a free list and reused. Every free bumps the
/// slot's generation, which is how cursors into freed nodes are detected. Every
/// arena also gets its own `owner` tag, so a node reference taken from one arena
/// never resolves in another, even though all of them number slots from zero.
pub(crate) struct Arena<T, A: Allocator + Clone> {
    slots: Vec<Slot<T, A>, A>,
    free: Option<NodeId>,
    owner: usize,
    alloc: A,
}

impl<T, A: Allocator + Clone> Arena<T, A> {
    pub(crate) fn new_in(alloc: A) -> Self {
        Self {
            slots: Vec::new_in(alloc.clone()),
            free: None,
            owner: NEXT_OWNER.fetch_add(1, Ordering::Relaxed),
            alloc,
        }
    }

    pub(crate) fn allocator(&self) -> &A {
        &self.alloc
    }

    pub(crate) fn owner(&self) -> usize {
        self.owner
    }

    /// Allocates a node with room for `capacity` elements, linked after `prev`.
    ///
    /// On failure the arena is left untouched.
    pub(crate) fn try_alloc(
        &mut self,
        capacity: usize,
        prev: Option<NodeId>,
    ) -> Result<NodeId, AllocError> {
        let id = match self.free {
            Some(id) => {
                let slot = &mut self.slots[id.0];

                let (next_free, spare) = match &mut slot.entry {
                    Entry::Vacant { next_free, spare } => (*next_free, spare.take()),
                    Entry::Occupied(_) => unreachable!("free list points at a live node"),
                };

                let block = match spare {
                    Some(block) => block,
                    None => Self::new_block(&self.alloc, capacity)?,
                };

                slot.entry = Entry::Occupied(Node {
                    block,
                    prev,
                    next: None,
                });
                self.free = next_free;
                id
            }
            None => {
                let block = Self::new_block(&self.alloc, capacity)?;
                self.slots.try_reserve(1).map_err(|_| AllocError)?;
                self.slots.push(Slot {
                    generation: 0,
                    entry: Entry::Occupied(Node {
                        block,
                        prev,
                        next: None,
                    }),
                });
                NodeId(self.slots.len() - 1)
            }
        };

        if let Some(prev) = prev {
            self.node_mut(prev).next = Some(id);
        }

        Ok(id)
    }

    fn new_block(alloc: &A, capacity: usize) -> Result<Vec<T, A>, AllocError> {
        let mut block = Vec::new_in(alloc.clone());
        block.try_reserve_exact(capacity).map_err(|_| AllocError)?;
        Ok(block)
    }

    /// Frees `start` and every node after it, returning how many were freed.
    ///
    /// The predecessor of `start`, if any, becomes the end of the chain. Walks the
    /// suffix in a loop so long chains never recurse.
    pub(crate) fn free_suffix(&mut self, start: NodeId) -> usize {
        if let Some(prev) = self.node(start).prev {
            self.node_mut(prev).next = None;
        }

        let mut freed = 0;
        let mut current = Some(start);

        while let Some(id) = current {
            current = self.release(id);
            freed += 1;
        }

        freed
    }

    fn release(&mut self, id: NodeId) -> Option<NodeId> {
        let slot = &mut self.slots[id.0];
        let vacant = Entry::Vacant {
            next_free: self.free,
            spare: None,
        };

        let Entry::Occupied(mut node) = mem::replace(&mut slot.entry, vacant) else {
            panic!("node {} freed twice", id.0);
        };

        slot.generation += 1;
        self.free = Some(id);

        node.block.clear();
        if let Entry::Vacant { spare, .. } = &mut slot.entry {
            *spare = Some(node.block);
        }

        node.next
    }

    /// Drops the blocks cached in free slots.
    pub(crate) fn release_spare_blocks(&mut self) {
        for slot in self.slots.iter_mut() {
            if let Entry::Vacant { spare, .. } = &mut slot.entry {
                *spare = None;
            }
        }
    }

    pub(crate) fn generation(&self, id: NodeId) -> u64 {
        self.slots[id.0].generation
    }

    /// Returns the node only if it is still the one `generation` was taken from,
    /// in the arena tagged `owner`.
    pub(crate) fn get_checked(
        &self,
        owner: usize,
        id: NodeId,
        generation: u64,
    ) -> Option<&Node<T, A>> {
        if owner != self.owner {
            return None;
        }

        match self.slots.get(id.0) {
            Some(Slot {
                generation: current,
                entry: Entry::Occupied(node),
            }) if *current == generation => Some(node),
            _ => None,
        }
    }

    #[track_caller]
    pub(crate) fn node(&self, id: NodeId) -> &Node<T, A> {
        match &self.slots[id.0].entry {
            Entry::Occupied(node) => node,
            Entry::Vacant { .. } => panic!("node {} is not allocated", id.0),
        }
    }

    #[track_caller]
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node<T, A> {
        match &mut self.slots[id.0].entry {
            Entry::Occupied(node) => node,
            Entry::Vacant { .. } => panic!("node {} is not allocated", id.0),
        }
    }

    #[cfg(test)]
    pub(crate) fn spare_blocks(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| matches!(slot.entry, Entry::Vacant { spare: Some(_), .. }))
            .count()
    }

    #[cfg(test)]
    pub(crate) fn slot_count(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod test {
    use alloc::sync::Arc;

    use allocator_api2::alloc::Global;

    use super::{Arena, NodeId};

    fn chain(arena: &mut Arena<u32, Global>, nodes: usize) -> alloc::vec::Vec<NodeId> {
        let mut ids = alloc::vec::Vec::new();
        let mut prev = None;

        for _ in 0..nodes {
            let id = arena.try_alloc(4, prev).unwrap();
            ids.push(id);
            prev = Some(id);
        }

        ids
    }

    #[test]
    fn alloc_links_after_prev() {
        let mut arena = Arena::new_in(Global);
        let ids = chain(&mut arena, 3);

        assert_eq!(arena.node(ids[0]).prev, None);
        assert_eq!(arena.node(ids[0]).next, Some(ids[1]));
        assert_eq!(arena.node(ids[1]).prev, Some(ids[0]));
        assert_eq!(arena.node(ids[1]).next, Some(ids[2]));
        assert_eq!(arena.node(ids[2]).next, None);
        assert!(arena.node(ids[2]).block.capacity() >= 4);
    }

    #[test]
    fn free_suffix_unlinks_and_counts() {
        let mut arena = Arena::new_in(Global);
        let ids = chain(&mut arena, 5);

        assert_eq!(arena.free_suffix(ids[2]), 3);
        assert_eq!(arena.node(ids[1]).next, None);
        assert!(arena.get_checked(arena.owner(), ids[2], 0).is_none());
        assert!(arena.get_checked(arena.owner(), ids[1], 0).is_some());
        assert_eq!(arena.spare_blocks(), 3);
    }

    #[test]
    fn freeing_bumps_generation() {
        let mut arena = Arena::new_in(Global);
        let ids = chain(&mut arena, 1);
        let before = arena.generation(ids[0]);

        arena.free_suffix(ids[0]);
        assert_ne!(arena.generation(ids[0]), before);

        let reused = arena.try_alloc(4, None).unwrap();
        assert_eq!(reused, ids[0]);
        assert!(arena.get_checked(arena.owner(), reused, before).is_none());
        assert!(arena.get_checked(arena.owner(), reused, arena.generation(reused)).is_some());
    }

    #[test]
    fn generation_does_not_wrap_at_u32() {
        let mut arena = Arena::new_in(Global);
        let id = chain(&mut arena, 1)[0];
        arena.slots[id.0].generation = u64::from(u32::MAX);

        arena.free_suffix(id);
        let reused = arena.try_alloc(4, None).unwrap();

        assert_eq!(arena.generation(reused), u64::from(u32::MAX) + 1);
        assert!(arena.get_checked(arena.owner(), reused, 0).is_none());
    }

    #[test]
    fn arenas_do_not_share_node_references() {
        let mut first = Arena::new_in(Global);
        let mut second = Arena::new_in(Global);
        let a = chain(&mut first, 1)[0];
        let b = chain(&mut second, 1)[0];

        assert_ne!(first.owner(), second.owner());
        assert_eq!(a, b);
        assert!(second.get_checked(first.owner(), b, 0).is_none());
        assert!(second.get_checked(second.owner(), b, 0).is_some());
    }

    #[test]
    fn reuses_free_slots_and_spare_blocks() {
        let mut arena = Arena::new_in(Global);
        let ids = chain(&mut arena, 3);
        arena.free_suffix(ids[1]);

        let again = arena.try_alloc(4, Some(ids[0])).unwrap();
        assert!(again == ids[1] || again == ids[2]);
        assert_eq!(arena.slot_count(), 3);
        assert_eq!(arena.spare_blocks(), 1);

        arena.release_spare_blocks();
        assert_eq!(arena.spare_blocks(), 0);
    }

    #[test]
    fn freeing_drops_elements() {
        let strong = Arc::new(());
        let weak = Arc::downgrade(&strong);

        let mut arena = Arena::new_in(Global);
        let id = arena.try_alloc(4, None).unwrap();
        arena.node_mut(id).block.push(strong);

        arena.free_suffix(id);
        assert_eq!(weak.strong_count(), 0);
    }

    #[test]
    fn long_chain_teardown_does_not_recurse() {
        let mut arena: Arena<u32, Global> = Arena::new_in(Global);
        let mut prev = None;
        let mut first = None;

        for _ in 0..200_000 {
            let id = arena.try_alloc(1, prev).unwrap();
            first.get_or_insert(id);
            prev = Some(id);
        }

        assert_eq!(arena.free_suffix(first.unwrap()), 200_000);
    }
}
