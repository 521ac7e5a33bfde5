//! A red-black tree holding distinct values in the order given by a comparator.

use std::cmp::Ordering;
use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ptr::NonNull;

use log::{debug, trace};

mod invariants;
mod iter;
mod shape;

pub use invariants::InvariantError;
pub use iter::Iter;
pub use shape::Shape;

type Link<T> = Option<NonNull<Node<T>>>;

/// Comparator used by [`RBTree::new`].
pub type OrdComparator<T> = fn(&T, &T) -> Ordering;

pub struct RBTree<T, F = OrdComparator<T>> {
    root: Link<T>,
    size: usize,
    compare: F,
    _owns: PhantomData<Box<Node<T>>>,
}

// SAFETY: the tree exclusively owns its nodes, so sending it sends the values.
unsafe impl<T: Send, F: Send> Send for RBTree<T, F> {}
// SAFETY: `&self` methods only read through the node pointers.
unsafe impl<T: Sync, F: Sync> Sync for RBTree<T, F> {}

impl<T: Ord> RBTree<T> {
    pub fn new() -> Self {
        Self::with_comparator(T::cmp)
    }
}

impl<T: Ord> Default for RBTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, F> RBTree<T, F>
where
    F: Fn(&T, &T) -> Ordering,
{
    /// Creates an empty tree ordered by `compare`.
    ///
    /// `compare` must be a strict total order and must answer consistently for
    /// the whole lifetime of the tree.
    pub fn with_comparator(compare: F) -> Self {
        Self {
            root: None,
            size: 0,
            compare,
            _owns: PhantomData,
        }
    }

    /// Inserts `element`, returning `false` if an equal element is already
    /// stored. In that case the tree is left untouched and `element` is dropped.
    pub fn insert(&mut self, element: T) -> bool {
        let mut parent: Link<T> = None;
        let mut side = Side::Left;
        let mut current = self.root;

        while let Some(node) = current {
            parent = current;
            unsafe {
                match (self.compare)(&element, &(*node.as_ptr()).value) {
                    Ordering::Less => {
                        side = Side::Left;
                        current = (*node.as_ptr()).left;
                    }
                    Ordering::Greater => {
                        side = Side::Right;
                        current = (*node.as_ptr()).right;
                    }
                    Ordering::Equal => {
                        trace!("insert: equal element already present");
                        return false;
                    }
                }
            }
        }

        let new_node = Node::new(element, parent);
        match parent {
            Some(parent) => Node::set_child(parent, side, Some(new_node)),
            None => self.root = Some(new_node),
        }
        self.size += 1;
        self.insert_fixup(new_node);
        true
    }

    /// Removes the element equal to `element`, returning whether it was found.
    pub fn remove(&mut self, element: &T) -> bool {
        self.take(element).is_some()
    }

    /// Removes the element equal to `element` and hands it back.
    pub fn take(&mut self, element: &T) -> Option<T> {
        let node = self.find_node(element)?;
        Some(self.delete_node(node))
    }

    pub fn contains(&self, element: &T) -> bool {
        self.find_node(element).is_some()
    }

    /// Returns the stored element equal to `element`.
    pub fn get(&self, element: &T) -> Option<&T> {
        self.find_node(element)
            .map(|node| unsafe { &(*node.as_ptr()).value })
    }

    fn find_node(&self, element: &T) -> Link<T> {
        let mut current = self.root;
        while let Some(node) = current {
            unsafe {
                current = match (self.compare)(element, &(*node.as_ptr()).value) {
                    Ordering::Less => (*node.as_ptr()).left,
                    Ordering::Greater => (*node.as_ptr()).right,
                    Ordering::Equal => return Some(node),
                };
            }
        }
        None
    }
}

impl<T, F> RBTree<T, F> {
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Drops every element.
    pub fn clear(&mut self) {
        if let Some(root) = self.root.take() {
            debug!("clearing tree of {} elements", self.size);
            Node::node_drop(root);
        }
        self.size = 0;
    }

    /// Smallest element.
    pub fn first(&self) -> Option<&T> {
        self.root
            .map(|root| unsafe { &(*Node::minimum(root).as_ptr()).value })
    }

    /// Largest element.
    pub fn last(&self) -> Option<&T> {
        self.root
            .map(|root| unsafe { &(*Node::maximum(root).as_ptr()).value })
    }

    /// Calls `visit` on every element in ascending order.
    pub fn in_order_traversal(&self, mut visit: impl FnMut(&T)) {
        fn inorder<T>(link: Link<T>, visit: &mut impl FnMut(&T)) {
            if let Some(node) = link {
                unsafe {
                    inorder((*node.as_ptr()).left, visit);
                    visit(&(*node.as_ptr()).value);
                    inorder((*node.as_ptr()).right, visit);
                }
            }
        }

        inorder(self.root, &mut visit);
    }

    /// Number of edges on the longest path from the root to a leaf, `-1` when
    /// the tree is empty.
    pub fn height(&self) -> isize {
        fn height<T>(link: Link<T>) -> isize {
            match link {
                Some(node) => unsafe {
                    1 + height((*node.as_ptr()).left).max(height((*node.as_ptr()).right))
                },
                None => -1,
            }
        }

        height(self.root)
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self.root.map(Node::minimum), self.size)
    }

    fn insert_fixup(&mut self, mut node: NonNull<Node<T>>) {
        while let Some(parent) = Node::parent(node) {
            if Node::color(parent) == Color::Black {
                break;
            }
            // A red parent is never the root, so the grandparent exists.
            let Some(grandparent) = Node::parent(parent) else {
                break;
            };
            let side = Node::side_of(grandparent, parent);

            match Node::child(grandparent, side.opposite()) {
                Some(uncle) if Node::color(uncle) == Color::Red => {
                    trace!("insert: red uncle, recoloring");
                    Node::set_color(parent, Color::Black);
                    Node::set_color(uncle, Color::Black);
                    Node::set_color(grandparent, Color::Red);
                    node = grandparent;
                }
                _ => {
                    let mut parent = parent;
                    if Node::child(parent, side.opposite()) == Some(node) {
                        trace!("insert: triangle, rotating parent {:?}", side);
                        self.rotate(parent, side);
                        mem::swap(&mut node, &mut parent);
                    }
                    trace!("insert: line, rotating grandparent {:?}", side.opposite());
                    Node::set_color(parent, Color::Black);
                    Node::set_color(grandparent, Color::Red);
                    self.rotate(grandparent, side.opposite());
                }
            }
        }

        if let Some(root) = self.root {
            Node::set_color(root, Color::Black);
        }
    }

    /// Unlinks `node` and returns the element it held. A node with two
    /// children trades elements with its successor, which is unlinked instead.
    fn delete_node(&mut self, node: NonNull<Node<T>>) -> T {
        let mut target = node;
        unsafe {
            if let (Some(_), Some(right)) = ((*node.as_ptr()).left, (*node.as_ptr()).right) {
                target = Node::minimum(right);
                mem::swap(&mut (*node.as_ptr()).value, &mut (*target.as_ptr()).value);
            }

            let child = (*target.as_ptr()).left.or((*target.as_ptr()).right);
            let parent = (*target.as_ptr()).parent;
            if let Some(child) = child {
                (*child.as_ptr()).parent = parent;
            }
            self.replace_child(parent, target, child);
            self.size -= 1;

            let Node { value, color, .. } = *Box::from_raw(target.as_ptr());
            if color == Color::Black {
                self.delete_fixup(child, parent);
            }
            value
        }
    }

    /// Restores the black height after a black node was spliced out above
    /// `node`. `node` may be absent, so its parent is tracked separately.
    fn delete_fixup(&mut self, mut node: Link<T>, mut parent: Link<T>) {
        while node != self.root && Node::color_of(node) == Color::Black {
            let Some(p) = parent else {
                break;
            };
            let side = if Node::child(p, Side::Left) == node {
                Side::Left
            } else {
                Side::Right
            };
            let far = side.opposite();

            // The removed black node leaves the sibling's subtree with a black
            // height of at least one, so the sibling exists.
            let Some(mut sibling) = Node::child(p, far) else {
                break;
            };

            if Node::color(sibling) == Color::Red {
                trace!("delete: red sibling, rotating parent {:?}", side);
                Node::set_color(sibling, Color::Black);
                Node::set_color(p, Color::Red);
                self.rotate(p, side);
                sibling = match Node::child(p, far) {
                    Some(sibling) => sibling,
                    None => break,
                };
            }

            let near_child = Node::child(sibling, side);
            let far_child = Node::child(sibling, far);
            if Node::color_of(near_child) == Color::Black
                && Node::color_of(far_child) == Color::Black
            {
                trace!("delete: black nephews, moving deficiency up");
                Node::set_color(sibling, Color::Red);
                node = Some(p);
                parent = Node::parent(p);
                continue;
            }

            if Node::color_of(far_child) == Color::Black {
                trace!("delete: red near nephew, rotating sibling {:?}", far);
                if let Some(near_child) = near_child {
                    Node::set_color(near_child, Color::Black);
                }
                Node::set_color(sibling, Color::Red);
                self.rotate(sibling, far);
                sibling = match Node::child(p, far) {
                    Some(sibling) => sibling,
                    None => break,
                };
            }

            trace!("delete: red far nephew, rotating parent {:?}", side);
            Node::set_color(sibling, Node::color(p));
            Node::set_color(p, Color::Black);
            if let Some(far_child) = Node::child(sibling, far) {
                Node::set_color(far_child, Color::Black);
            }
            self.rotate(p, side);
            node = self.root;
            break;
        }

        if let Some(node) = node {
            Node::set_color(node, Color::Black);
        }
    }

    /// Rotates around `node`: `Side::Left` is a left rotation, lifting the
    /// right child into `node`'s place, and `Side::Right` the mirror. Parent
    /// links and the root are kept in sync. Does nothing if the child to lift
    /// is absent.
    fn rotate(&mut self, node: NonNull<Node<T>>, side: Side) {
        let other = side.opposite();
        debug_assert!(Node::child(node, other).is_some());
        let Some(new_top) = Node::child(node, other) else {
            return;
        };

        let moved = Node::child(new_top, side);
        Node::set_child(node, other, moved);
        if let Some(moved) = moved {
            unsafe { (*moved.as_ptr()).parent = Some(node) };
        }

        let parent = Node::parent(node);
        unsafe { (*new_top.as_ptr()).parent = parent };
        self.replace_child(parent, node, Some(new_top));

        Node::set_child(new_top, side, Some(node));
        unsafe { (*node.as_ptr()).parent = Some(new_top) };
    }

    /// Points whichever link of `parent` held `old` (or the root when
    /// `parent` is absent) at `new`.
    fn replace_child(&mut self, parent: Link<T>, old: NonNull<Node<T>>, new: Link<T>) {
        match parent {
            Some(parent) => {
                let side = Node::side_of(parent, old);
                Node::set_child(parent, side, new);
            }
            None => self.root = new,
        }
    }
}

impl<T, F> Drop for RBTree<T, F> {
    fn drop(&mut self) {
        if let Some(root) = self.root.take() {
            Node::node_drop(root);
        }
    }
}

impl<T: fmt::Debug, F> fmt::Debug for RBTree<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T, F> Extend<T> for RBTree<T, F>
where
    F: Fn(&T, &T) -> Ordering,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for element in iter {
            self.insert(element);
        }
    }
}

impl<T: Ord> FromIterator<T> for RBTree<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut tree = RBTree::new();
        tree.extend(iter);
        tree
    }
}

impl<'a, T, F> IntoIterator for &'a RBTree<T, F> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum Color {
    Red,
    Black,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum Side {
    Left,
    Right,
}

impl Side {
    fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

struct Node<T> {
    value: T,
    color: Color,
    left: Link<T>,
    right: Link<T>,
    parent: Link<T>,
}

impl<T> Node<T> {
    fn new(element: T, parent: Link<T>) -> NonNull<Node<T>> {
        unsafe {
            NonNull::new_unchecked(Box::into_raw(Box::new(Node {
                value: element,
                color: Color::Red,
                left: None,
                right: None,
                parent,
            })))
        }
    }

    fn parent(node: NonNull<Node<T>>) -> Link<T> {
        unsafe { (*node.as_ptr()).parent }
    }

    fn color(node: NonNull<Node<T>>) -> Color {
        unsafe { (*node.as_ptr()).color }
    }

    /// Absent children count as black.
    fn color_of(link: Link<T>) -> Color {
        link.map_or(Color::Black, Self::color)
    }

    fn set_color(node: NonNull<Node<T>>, color: Color) {
        unsafe { (*node.as_ptr()).color = color }
    }

    fn child(node: NonNull<Node<T>>, side: Side) -> Link<T> {
        unsafe {
            match side {
                Side::Left => (*node.as_ptr()).left,
                Side::Right => (*node.as_ptr()).right,
            }
        }
    }

    fn set_child(node: NonNull<Node<T>>, side: Side, child: Link<T>) {
        unsafe {
            match side {
                Side::Left => (*node.as_ptr()).left = child,
                Side::Right => (*node.as_ptr()).right = child,
            }
        }
    }

    /// Which side of `parent` holds `child`.
    fn side_of(parent: NonNull<Node<T>>, child: NonNull<Node<T>>) -> Side {
        if Self::child(parent, Side::Left) == Some(child) {
            Side::Left
        } else {
            Side::Right
        }
    }

    fn minimum(mut node: NonNull<Node<T>>) -> NonNull<Node<T>> {
        while let Some(left) = Self::child(node, Side::Left) {
            node = left;
        }
        node
    }

    fn maximum(mut node: NonNull<Node<T>>) -> NonNull<Node<T>> {
        while let Some(right) = Self::child(node, Side::Right) {
            node = right;
        }
        node
    }

    /// In-order successor, found through the right subtree or, failing that,
    /// the first ancestor reached from its left side.
    fn successor(mut node: NonNull<Node<T>>) -> Link<T> {
        if let Some(right) = Self::child(node, Side::Right) {
            return Some(Self::minimum(right));
        }
        let mut parent = Self::parent(node);
        while let Some(p) = parent {
            if Self::child(p, Side::Right) != Some(node) {
                break;
            }
            node = p;
            parent = Self::parent(p);
        }
        parent
    }

    /// Frees `node` and everything below it, following child links only.
    fn node_drop(node: NonNull<Node<T>>) {
        unsafe {
            let boxed_node = Box::from_raw(node.as_ptr());

            if let Some(left) = boxed_node.left {
                Self::node_drop(left);
            }

            if let Some(right) = boxed_node.right {
                Self::node_drop(right);
            }
        }
    }
}
