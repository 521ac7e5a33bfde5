use std::iter::FusedIterator;
use std::marker::PhantomData;

use super::{Link, Node};

/// Ascending iterator over the elements of an [`RBTree`](super::RBTree).
///
/// Steps from node to node through the parent links, so it needs no stack.
pub struct Iter<'a, T> {
    next: Link<T>,
    remaining: usize,
    _marker: PhantomData<&'a T>,
}

// SAFETY: the iterator only hands out shared references to the elements.
unsafe impl<T: Sync> Send for Iter<'_, T> {}
unsafe impl<T: Sync> Sync for Iter<'_, T> {}

impl<'a, T> Iter<'a, T> {
    pub(super) fn new(first: Link<T>, len: usize) -> Self {
        Self {
            next: first,
            remaining: len,
            _marker: PhantomData,
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.next.take().map(|node| {
            self.next = Node::successor(node);
            self.remaining -= 1;
            unsafe { &(*node.as_ptr()).value }
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self {
            next: self.next,
            remaining: self.remaining,
            _marker: PhantomData,
        }
    }
}

#[cfg(test)]
mod test {
    use crate::data_structures::rbtree::RBTree;

    #[test]
    fn empty_tree_yields_nothing() {
        let tree: RBTree<i32> = RBTree::new();
        assert_eq!(tree.iter().next(), None);
        assert_eq!(tree.iter().len(), 0);
    }

    #[test]
    fn walks_up_through_parents() {
        let tree: RBTree<i32> = [50, 30, 70, 20, 40, 60, 80, 10, 45].into_iter().collect();
        let mut iter = tree.iter();
        assert_eq!(iter.len(), 9);
        assert_eq!(iter.next(), Some(&10));
        assert_eq!(iter.len(), 8);
        assert_eq!(
            iter.copied().collect::<Vec<_>>(),
            vec![20, 30, 40, 45, 50, 60, 70, 80]
        );
    }

    #[test]
    fn matches_in_order_traversal() {
        let tree: RBTree<u32> = (0..200).map(|i| (i * 37) % 211).collect();
        let mut visited = Vec::new();
        tree.in_order_traversal(|v| visited.push(*v));
        assert_eq!(tree.iter().copied().collect::<Vec<_>>(), visited);
    }

    #[test]
    fn can_be_sent_to_another_thread() {
        let tree: RBTree<i32> = (1..=10).collect();
        let iter = tree.iter();
        let sum = std::thread::scope(|scope| scope.spawn(move || iter.sum::<i32>()).join().unwrap());
        assert_eq!(sum, 55);
    }

    #[test]
    fn stays_exhausted() {
        let tree: RBTree<i32> = [1].into_iter().collect();
        let mut iter = (&tree).into_iter();
        assert_eq!(iter.next(), Some(&1));
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next(), None);
    }
}
