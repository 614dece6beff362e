//! Debug utilities: structure verification, statistics and a tree printer.

use std::fmt::Write as _;
use std::mem::size_of;
use std::sync::Arc;

use crate::comparer::TrieComparer;
use crate::constants::{BITS_PER_LEVEL, FANOUT, WINDOW};
use crate::node::{digit, Children, Node};
use crate::overflow::Overflow;
use crate::set::HashTrieSet;

/// Shape of a trie, as counted by [`HashTrieSet::stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrieStats {
    pub nodes: usize,
    pub frozen_nodes: usize,
    /// Items in slots and overflow lists together.
    pub items: usize,
    pub overflow_items: usize,
    pub tombstones: usize,
    /// Depth of the deepest node (the root is 0).
    pub max_depth: usize,
}

fn walk<T>(node: &Node<T>, f: &mut impl FnMut(&Node<T>)) {
    f(node);
    let mut from = 0;
    while let Some((d, child)) = node.next_child(from) {
        walk(child, f);
        from = d + 1;
    }
}

#[inline]
fn prefix_mask(depth: u8) -> u32 {
    match u32::from(depth) * BITS_PER_LEVEL {
        0 => 0,
        bits if bits >= 32 => u32::MAX,
        bits => (1 << bits) - 1,
    }
}

impl<T> HashTrieSet<T> {
    pub fn stats(&self) -> TrieStats {
        let mut stats = TrieStats::default();
        if let Some(root) = self.root.as_deref() {
            walk(root, &mut |node| {
                stats.nodes += 1;
                stats.frozen_nodes += usize::from(node.is_frozen());
                stats.items += node.item_count() + node.overflow_len();
                stats.overflow_items += node.overflow_len();
                stats.tombstones += node.deleted_mask().count_ones() as usize;
                stats.max_depth = stats.max_depth.max(usize::from(node.depth()));
            });
        }
        stats
    }

    /// Estimated heap bytes held by the trie. `item_size` is the heap size
    /// owned by each item beyond its inline `size_of::<T>()`, or 0.
    ///
    /// Nodes shared with other handles are counted in full.
    pub fn memory_usage(&self, item_size: usize) -> usize {
        // Arc header: strong and weak counts.
        let node_bytes = size_of::<Node<T>>() + 2 * size_of::<usize>();
        let mut total = 0;
        if let Some(root) = self.root.as_deref() {
            walk(root, &mut |node| {
                total += node_bytes;
                if node.has_children() {
                    total += size_of::<Children<T>>();
                }
                if let Some(overflow) = &node.overflow {
                    total += size_of::<Overflow<T>>() + overflow.spilled_capacity() * size_of::<T>();
                }
                total += (node.item_count() + node.overflow_len()) * item_size;
            });
        }
        total
    }

    /// Verify trie integrity - returns list of issues found.
    ///
    /// `comparer` must be the one the set was built with.
    pub fn verify<C>(&self, comparer: &C) -> Vec<String>
    where
        C: TrieComparer<T> + ?Sized,
    {
        let mut issues = Vec::new();
        if let Some(root) = &self.root {
            if root.depth() != 0 {
                issues.push(format!("root has depth {}", root.depth()));
            }
            self.verify_node(root, 0, comparer, &mut issues);
        }
        issues
    }

    fn verify_node<C>(&self, node: &Arc<Node<T>>, prefix: u32, comparer: &C, issues: &mut Vec<String>)
    where
        C: TrieComparer<T> + ?Sized,
    {
        let depth = node.depth();
        let at = format!("node depth={depth} prefix={prefix:#x}");

        if node.used_mask() & node.deleted_mask() != 0 {
            issues.push(format!("{at}: slot both used and deleted"));
        }
        if node.counter != node.recount() {
            issues.push(format!(
                "{at}: counter {:#x} but contents say {:#x}",
                node.counter,
                node.recount()
            ));
        }
        if node.is_max_depth() && node.has_children() {
            issues.push(format!("{at}: children below maximum depth"));
        }
        if !node.is_max_depth() && node.overflow.is_some() {
            issues.push(format!("{at}: overflow list above maximum depth"));
        }

        let mask = prefix_mask(depth);
        for i in 0..FANOUT {
            let item = node.item(i);
            if node.slot_occupied(i) != item.is_some() {
                issues.push(format!("{at}: slot {i} mask disagrees with contents"));
            }
            let Some(item) = item else { continue };
            let hash = comparer.hash_code(item);
            let home = digit(hash, depth);
            if (i + FANOUT - home) % FANOUT >= WINDOW {
                issues.push(format!("{at}: slot {i} outside the window of home {home}"));
            }
            if node.child(home).is_some() {
                issues.push(format!("{at}: slot {i} shadowed by child {home}"));
            }
            if hash & mask != prefix {
                issues.push(format!("{at}: slot {i} hash {hash:#x} off path"));
            }
            if !self.contains(item, comparer) {
                issues.push(format!("{at}: slot {i} unreachable by lookup"));
            }
        }

        for (j, item) in node.overflow_items().enumerate() {
            let hash = comparer.hash_code(item);
            if hash & mask != prefix {
                issues.push(format!("{at}: overflow {j} hash {hash:#x} off path"));
            }
            if !self.contains(item, comparer) {
                issues.push(format!("{at}: overflow {j} unreachable by lookup"));
            }
        }

        let mut from = 0;
        while let Some((d, child)) = node.next_child(from) {
            from = d + 1;
            if child.depth() != depth + 1 {
                issues.push(format!("{at}: child {d} has depth {}", child.depth()));
                continue;
            }
            if child.is_empty() {
                issues.push(format!("{at}: child {d} is empty"));
            }
            let child_prefix = prefix | ((d as u32) << (u32::from(depth) * BITS_PER_LEVEL));
            self.verify_node(child, child_prefix, comparer, issues);
        }
    }
}

impl<T: std::fmt::Debug> HashTrieSet<T> {
    /// Renders the trie one node per line, children indented.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        match self.root.as_deref() {
            Some(root) => dump_node(root, None, &mut out),
            None => out.push_str("(empty)\n"),
        }
        out
    }

    /// Print the trie structure for debugging.
    pub fn debug_print(&self) {
        println!("=== HashTrieSet ===");
        print!("{}", self.dump());
        println!("===================");
    }
}

fn dump_node<T: std::fmt::Debug>(node: &Node<T>, index: Option<usize>, out: &mut String) {
    let indent = "  ".repeat(usize::from(node.depth()));
    let label = index.map_or_else(|| "root".to_string(), |d| format!("[{d:x}]"));
    let _ = writeln!(
        out,
        "{indent}{label} depth={} items={} children={} overflow={}{}",
        node.depth(),
        node.item_count(),
        node.child_count(),
        node.overflow_len(),
        if node.is_frozen() { " frozen" } else { "" },
    );
    for i in 0..FANOUT {
        if let Some(item) = node.item(i) {
            let _ = writeln!(out, "{indent}  {i:x}: {item:?}");
        } else if node.is_tombstone(i) {
            let _ = writeln!(out, "{indent}  {i:x}: <deleted>");
        }
    }
    for (j, item) in node.overflow_items().enumerate() {
        let _ = writeln!(out, "{indent}  +{j}: {item:?}");
    }
    let mut from = 0;
    while let Some((d, child)) = node.next_child(from) {
        dump_node(child, Some(d), out);
        from = d + 1;
    }
}
