//! Doubly-linked list stored in an arena.
//!
//! Nodes live in a `Vec` of slots and point at each other by slot index, so
//! unlinking an interior node is a matter of rewriting two indices. Freed
//! slots are recycled by later pushes. A `NodeId` stays valid until the node
//! it names is removed.

/// Stable handle to a node in a [`NodeList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug)]
struct Node<T> {
    item: T,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Insertion-ordered list with O(1) append and O(1) unlink by handle.
#[derive(Debug)]
pub struct NodeList<T> {
    slots: Vec<Option<Node<T>>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl<T> Default for NodeList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> NodeList<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn node(&self, slot: usize) -> Option<&Node<T>> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, slot: usize) -> Option<&mut Node<T>> {
        self.slots.get_mut(slot).and_then(Option::as_mut)
    }

    /// Appends an item after the current tail.
    pub fn push_back(&mut self, item: T) -> NodeId {
        let node = Node {
            item,
            prev: self.tail,
            next: None,
        };

        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(node);
                slot
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        };

        match self.tail {
            Some(tail) => {
                if let Some(tail) = self.node_mut(tail) {
                    tail.next = Some(slot);
                }
            }
            None => self.head = Some(slot),
        }
        self.tail = Some(slot);
        self.len += 1;

        NodeId(slot)
    }

    pub fn get(&self, id: NodeId) -> Option<&T> {
        self.node(id.0).map(|node| &node.item)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        self.node_mut(id.0).map(|node| &mut node.item)
    }

    /// Handle of the node at zero-based `position`, walking from the head.
    pub fn nth(&self, position: usize) -> Option<NodeId> {
        self.iter().nth(position).map(|(id, _)| id)
    }

    /// Handle of the first node whose item matches `predicate`.
    pub fn find(&self, mut predicate: impl FnMut(&T) -> bool) -> Option<NodeId> {
        self.iter()
            .find(|(_, item)| predicate(*item))
            .map(|(id, _)| id)
    }

    /// Unlinks a node, joining its neighbours, and returns its item.
    pub fn remove(&mut self, id: NodeId) -> Option<T> {
        let node = self.slots.get_mut(id.0)?.take()?;

        match node.prev {
            Some(prev) => {
                if let Some(prev) = self.node_mut(prev) {
                    prev.next = node.next;
                }
            }
            None => self.head = node.next,
        }

        match node.next {
            Some(next) => {
                if let Some(next) = self.node_mut(next) {
                    next.prev = node.prev;
                }
            }
            None => self.tail = node.prev,
        }

        self.free.push(id.0);
        self.len -= 1;

        Some(node.item)
    }

    /// Removes every node whose item fails `keep`. Returns how many went.
    pub fn retain(&mut self, mut keep: impl FnMut(&T) -> bool) -> usize {
        let doomed: Vec<NodeId> = self
            .iter()
            .filter(|(_, item)| !keep(*item))
            .map(|(id, _)| id)
            .collect();

        for id in &doomed {
            self.remove(*id);
        }
        doomed.len()
    }

    /// Iterates head to tail, yielding each node's handle and item.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            cursor: self.head,
        }
    }
}

/// Head-to-tail iterator over a [`NodeList`].
pub struct Iter<'a, T> {
    list: &'a NodeList<T>,
    cursor: Option<usize>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (NodeId, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.cursor?;
        let node = self.list.node(slot)?;
        self.cursor = node.next;
        Some((NodeId(slot), &node.item))
    }
}
