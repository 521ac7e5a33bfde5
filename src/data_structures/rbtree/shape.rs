use std::fmt::{self, Debug, Display};
use std::ptr::NonNull;

use super::{Node, RBTree};

/// Draws a tree one node per line, with its color and the side it hangs from.
pub struct Shape<'a, T, F> {
    tree: &'a RBTree<T, F>,
}

impl<T, F> RBTree<T, F> {
    pub fn shape(&self) -> Shape<'_, T, F> {
        Shape { tree: self }
    }
}

impl<T: Debug, F> Display for Shape<'_, T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tree.root {
            Some(root) => write_node(f, root, "", true, "root"),
            None => Ok(()),
        }
    }
}

fn write_node<T: Debug>(
    f: &mut fmt::Formatter<'_>,
    node: NonNull<Node<T>>,
    indent: &str,
    is_final: bool,
    append: &str,
) -> fmt::Result {
    let node = unsafe { node.as_ref() };
    writeln!(f, "{indent}+- {:?} # {:?} - {append}", node.value, node.color)?;

    let new_indent = format!("{indent}{}", if is_final { "   " } else { "|  " });
    if let Some(left) = node.left {
        write_node(f, left, &new_indent, node.right.is_none(), "L")?;
    }
    if let Some(right) = node.right {
        write_node(f, right, &new_indent, true, "R")?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use crate::data_structures::rbtree::RBTree;

    #[test]
    fn empty_tree_draws_nothing() {
        let tree: RBTree<i32> = RBTree::new();
        assert_eq!(tree.shape().to_string(), "");
    }

    #[test]
    fn draws_colors_and_sides() {
        let tree: RBTree<i32> = [2, 1, 3, 0].into_iter().collect();
        assert_eq!(
            tree.shape().to_string(),
            "+- 2 # Black - root\n\
             \x20  +- 1 # Black - L\n\
             \x20  |  +- 0 # Red - L\n\
             \x20  +- 3 # Black - R\n"
        );
    }
}
