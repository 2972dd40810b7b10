use crate::types::BookmarkNode;

/// Leaf bookmarks under `nodes`, in tree order.
///
/// Without `recurse` only the direct leaf children count; folders are
/// skipped, not descended into. With `recurse` every reachable leaf is
/// collected depth-first, a folder's contents before its next sibling.
pub fn flatten(nodes: &[BookmarkNode], recurse: bool) -> Vec<&BookmarkNode> {
    let mut leaves = Vec::new();
    for node in nodes {
        append_leaves(node, &mut leaves, recurse);
    }
    leaves
}

fn append_leaves<'a>(node: &'a BookmarkNode, out: &mut Vec<&'a BookmarkNode>, recurse: bool) {
    match &node.children {
        None => out.push(node),
        Some(children) if recurse => {
            for child in children {
                append_leaves(child, out, recurse);
            }
        }
        Some(_) => {}
    }
}
