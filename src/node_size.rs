use core::alloc::Layout;
use core::num::NonZeroUsize;

/// The node capacity used by [`UnrolledList::new`](crate::UnrolledList::new).
pub const DEFAULT_NODE_SIZE: usize = 50;

/// Number of element slots in every node of a list.
///
/// Fixed for the lifetime of the list. All index arithmetic that depends on the
/// capacity goes through here.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct NodeSize(NonZeroUsize);

impl Default for NodeSize {
    fn default() -> Self {
        Self::new(DEFAULT_NODE_SIZE)
    }
}

impl NodeSize {
    #[track_caller]
    pub(crate) fn new(capacity: usize) -> Self {
        match NonZeroUsize::new(capacity) {
            Some(capacity) => Self(capacity),
            None => panic!("node size must be greater than zero"),
        }
    }

    pub(crate) fn get(self) -> usize {
        self.0.get()
    }

    /// Splits a logical index into the node number and the slot inside that node.
    pub(crate) fn translate_index(self, index: usize) -> (usize, usize) {
        (index / self.get(), index % self.get())
    }

    /// Elements held by `nodes` full nodes.
    pub(crate) fn cumulative_capacity(self, nodes: usize) -> usize {
        self.get() * nodes
    }

    /// Nodes required to hold `len` elements.
    pub(crate) fn nodes_for(self, len: usize) -> usize {
        len.div_ceil(self.get())
    }

    /// Layout of a single node block, reported when allocating one fails.
    pub(crate) fn block_layout<T>(self) -> Layout {
        Layout::array::<T>(self.get()).unwrap_or_else(|_| Layout::new::<T>())
    }
}
