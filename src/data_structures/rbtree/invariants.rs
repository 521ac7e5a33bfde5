use std::cmp::Ordering;
use std::error::Error;
use std::fmt;
use std::ptr::NonNull;

use super::{Color, Node, RBTree, Side};

/// A broken red-black or search tree property, as reported by
/// [`RBTree::check_invariants`].
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum InvariantError {
    RedRoot,
    RedChildOfRed,
    UnequalBlackHeight { left: usize, right: usize },
    BrokenParentLink,
    OutOfOrder,
    SizeMismatch { recorded: usize, counted: usize },
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RedRoot => write!(f, "root is red"),
            Self::RedChildOfRed => write!(f, "red node has a red child"),
            Self::UnequalBlackHeight { left, right } => write!(
                f,
                "black height differs between subtrees ({left} on the left, {right} on the right)"
            ),
            Self::BrokenParentLink => write!(f, "parent link does not point back to the parent"),
            Self::OutOfOrder => write!(f, "elements are not in comparator order"),
            Self::SizeMismatch { recorded, counted } => write!(
                f,
                "recorded size {recorded} but {counted} nodes are reachable"
            ),
        }
    }
}

impl Error for InvariantError {}

impl<T, F> RBTree<T, F>
where
    F: Fn(&T, &T) -> Ordering,
{
    /// Walks the whole tree and verifies the red-black properties, the search
    /// order under the comparator, the parent links and the cached size.
    ///
    /// On success returns the number of black nodes on every path from the
    /// root to an absent child.
    pub fn check_invariants(&self) -> Result<usize, InvariantError> {
        let Some(root) = self.root else {
            return if self.size == 0 {
                Ok(0)
            } else {
                Err(InvariantError::SizeMismatch {
                    recorded: self.size,
                    counted: 0,
                })
            };
        };

        if Node::color(root) == Color::Red {
            return Err(InvariantError::RedRoot);
        }
        if Node::parent(root).is_some() {
            return Err(InvariantError::BrokenParentLink);
        }

        let mut counted = 0;
        let black_height = self.check_subtree(root, None, None, &mut counted)?;
        if counted != self.size {
            return Err(InvariantError::SizeMismatch {
                recorded: self.size,
                counted,
            });
        }
        Ok(black_height)
    }

    fn check_subtree<'a>(
        &'a self,
        node: NonNull<Node<T>>,
        lower: Option<&'a T>,
        upper: Option<&'a T>,
        counted: &mut usize,
    ) -> Result<usize, InvariantError> {
        *counted += 1;
        let value: &'a T = unsafe { &(*node.as_ptr()).value };

        if lower.is_some_and(|lower| (self.compare)(lower, value) != Ordering::Less)
            || upper.is_some_and(|upper| (self.compare)(value, upper) != Ordering::Less)
        {
            return Err(InvariantError::OutOfOrder);
        }

        let mut heights = [0; 2];
        for (height, side) in heights.iter_mut().zip([Side::Left, Side::Right]) {
            let Some(child) = Node::child(node, side) else {
                continue;
            };
            if Node::parent(child) != Some(node) {
                return Err(InvariantError::BrokenParentLink);
            }
            if Node::color(node) == Color::Red && Node::color(child) == Color::Red {
                return Err(InvariantError::RedChildOfRed);
            }
            *height = match side {
                Side::Left => self.check_subtree(child, lower, Some(value), counted)?,
                Side::Right => self.check_subtree(child, Some(value), upper, counted)?,
            };
        }

        let [left, right] = heights;
        if left != right {
            return Err(InvariantError::UnequalBlackHeight { left, right });
        }
        Ok(left + usize::from(Node::color(node) == Color::Black))
    }
}

#[cfg(test)]
mod test {
    use crate::data_structures::rbtree::{Color, InvariantError, RBTree};

    fn sample() -> RBTree<i32> {
        [50, 30, 70, 20, 40, 60, 80, 10].into_iter().collect()
    }

    #[test]
    fn empty_tree_is_valid() {
        let tree: RBTree<i32> = RBTree::new();
        assert_eq!(tree.check_invariants(), Ok(0));
    }

    #[test]
    fn reports_black_height() {
        let tree: RBTree<i32> = [2, 1, 3].into_iter().collect();
        assert_eq!(tree.check_invariants(), Ok(1));
    }

    #[test]
    fn detects_red_root() {
        let tree = sample();
        unsafe { (*tree.root.unwrap().as_ptr()).color = Color::Red };
        assert_eq!(tree.check_invariants(), Err(InvariantError::RedRoot));
    }

    #[test]
    fn detects_size_mismatch() {
        let mut tree = sample();
        tree.size += 1;
        assert_eq!(
            tree.check_invariants(),
            Err(InvariantError::SizeMismatch {
                recorded: 9,
                counted: 8
            })
        );
    }

    #[test]
    fn detects_out_of_order_values() {
        let tree = sample();
        unsafe {
            let root = tree.root.unwrap();
            let left = (*root.as_ptr()).left.unwrap();
            std::mem::swap(&mut (*root.as_ptr()).value, &mut (*left.as_ptr()).value);
        }
        assert_eq!(tree.check_invariants(), Err(InvariantError::OutOfOrder));
    }

    #[test]
    fn detects_unequal_black_height() {
        let tree: RBTree<i32> = [2, 1, 3].into_iter().collect();
        unsafe {
            let left = (*tree.root.unwrap().as_ptr()).left.unwrap();
            (*left.as_ptr()).color = Color::Black;
        }
        assert_eq!(
            tree.check_invariants(),
            Err(InvariantError::UnequalBlackHeight { left: 1, right: 0 })
        );
    }

    #[test]
    fn detects_red_child_of_red() {
        let tree: RBTree<i32> = [2, 1, 3, 4].into_iter().collect();
        unsafe {
            let right = (*tree.root.unwrap().as_ptr()).right.unwrap();
            (*right.as_ptr()).color = Color::Red;
        }
        assert_eq!(tree.check_invariants(), Err(InvariantError::RedChildOfRed));
    }

    #[test]
    fn detects_broken_parent_link() {
        let tree = sample();
        unsafe {
            let left = (*tree.root.unwrap().as_ptr()).left.unwrap();
            (*left.as_ptr()).parent = None;
        }
        assert_eq!(tree.check_invariants(), Err(InvariantError::BrokenParentLink));
    }

    #[test]
    fn error_messages_name_the_property() {
        let err = InvariantError::SizeMismatch {
            recorded: 3,
            counted: 2,
        };
        assert_eq!(err.to_string(), "recorded size 3 but 2 nodes are reachable");
    }
}
