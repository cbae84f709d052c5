//! Search filtering over the node graph
//!
//! Toggles each node's `enabled` flag against a query. Disabled nodes stay in
//! the tree; downstream consumers (selection cascade, aggregation) skip them.

use crate::tree::node::{Node, NodeId, Tree};

/// Re-evaluate enablement tree-wide.
///
/// `check_text` yields a node's searchable content, `display_text` the text
/// its path is matched against. A node is enabled when the query is empty or
/// either text contains it (case-insensitive). A folder is additionally
/// enabled when any descendant is enabled, so matches stay reachable through
/// the tree.
pub fn apply<C, D>(tree: &mut Tree, query: &str, check_text: &C, display_text: &D)
where
    C: Fn(&Node) -> String,
    D: Fn(&Node) -> String,
{
    if query.is_empty() {
        for id in tree.ids() {
            tree.node_mut(id).enabled = true;
        }
        return;
    }

    let needle = query.to_lowercase();
    if let Some(root) = tree.root() {
        apply_node(tree, root, &needle, check_text, display_text);
    }
}

fn apply_node<C, D>(
    tree: &mut Tree,
    id: NodeId,
    needle: &str,
    check_text: &C,
    display_text: &D,
) -> bool
where
    C: Fn(&Node) -> String,
    D: Fn(&Node) -> String,
{
    let matched = {
        let node = tree.node(id);
        // path match first; content extraction is the expensive side
        display_text(node).to_lowercase().contains(needle)
            || check_text(node).to_lowercase().contains(needle)
    };

    let mut any_child = false;
    for child in tree.node(id).children.clone() {
        any_child |= apply_node(tree, child, needle, check_text, display_text);
    }

    let enabled = matched || any_child;
    tree.node_mut(id).enabled = enabled;
    enabled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::node::NodeKind;
    use std::path::Path;

    fn sample_tree() -> Tree {
        let mut tree = Tree::new();
        let root = tree.insert(NodeKind::Folder, "p", "/p", None);
        let src = tree.insert(NodeKind::Folder, "src", "/p/src", Some(root));
        tree.insert(NodeKind::File, "alpha.txt", "/p/src/alpha.txt", Some(src));
        tree.insert(NodeKind::File, "beta.txt", "/p/src/beta.txt", Some(src));
        let docs = tree.insert(NodeKind::Folder, "docs", "/p/docs", Some(root));
        tree.insert(NodeKind::File, "guide.md", "/p/docs/guide.md", Some(docs));
        tree
    }

    fn path_text(node: &Node) -> String {
        node.full_path.display().to_string()
    }

    fn no_content(_: &Node) -> String {
        String::new()
    }

    fn enabled(tree: &Tree, path: &str) -> bool {
        tree.node(tree.lookup(Path::new(path)).unwrap()).enabled
    }

    #[test]
    fn test_empty_query_enables_everything() {
        let mut tree = sample_tree();
        apply(&mut tree, "alpha", &no_content, &path_text);
        apply(&mut tree, "", &no_content, &path_text);
        for id in tree.ids() {
            assert!(tree.node(id).enabled);
        }
    }

    #[test]
    fn test_path_match_is_case_insensitive() {
        let mut tree = sample_tree();
        apply(&mut tree, "ALPHA", &no_content, &path_text);
        assert!(enabled(&tree, "/p/src/alpha.txt"));
        assert!(!enabled(&tree, "/p/src/beta.txt"));
    }

    #[test]
    fn test_ancestors_of_match_stay_enabled() {
        let mut tree = sample_tree();
        apply(&mut tree, "guide", &no_content, &path_text);
        assert!(enabled(&tree, "/p/docs/guide.md"));
        assert!(enabled(&tree, "/p/docs"));
        assert!(enabled(&tree, "/p"));
        assert!(!enabled(&tree, "/p/src"));
        assert!(!enabled(&tree, "/p/src/alpha.txt"));
    }

    #[test]
    fn test_content_match_enables_node() {
        let mut tree = sample_tree();
        let content = |node: &Node| {
            if node.name == "beta.txt" {
                "needle in the haystack".to_string()
            } else {
                String::new()
            }
        };
        apply(&mut tree, "needle", &content, &path_text);
        assert!(enabled(&tree, "/p/src/beta.txt"));
        assert!(enabled(&tree, "/p/src"));
        assert!(!enabled(&tree, "/p/src/alpha.txt"));
    }

    #[test]
    fn test_no_match_disables_whole_tree() {
        let mut tree = sample_tree();
        apply(&mut tree, "zzz-not-there", &no_content, &path_text);
        for id in tree.ids() {
            assert!(!tree.node(id).enabled);
        }
    }
}
