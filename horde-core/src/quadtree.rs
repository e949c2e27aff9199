//! Region quadtree rebuilt every tick for neighbor queries.

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::region::{Quadrant, QueryShape, Region};

/// Depth at which nodes stop subdividing and keep accepting entries past
/// capacity. Only reached when many entries share (nearly) the same point.
pub const MAX_DEPTH: usize = 16;

/// A point stored in the index, tagged with a non-owning handle to its owner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexEntry<T> {
    pub x: f32,
    pub y: f32,
    pub owner: T,
}

impl<T> IndexEntry<T> {
    pub fn new(x: f32, y: f32, owner: T) -> Self {
        Self { x, y, owner }
    }
}

#[derive(Debug, Clone)]
pub struct QuadTree<T> {
    boundary: Region,
    capacity: usize,
    depth: usize,
    entries: Vec<IndexEntry<T>>,
    children: Option<Box<[QuadTree<T>; 4]>>,
}

impl<T: Copy> QuadTree<T> {
    pub fn new(boundary: Region, capacity: usize) -> Self {
        Self::with_depth(boundary, capacity, 0)
    }

    fn with_depth(boundary: Region, capacity: usize, depth: usize) -> Self {
        Self {
            boundary,
            capacity,
            depth,
            entries: Vec::new(),
            children: None,
        }
    }

    pub fn boundary(&self) -> &Region {
        &self.boundary
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_divided(&self) -> bool {
        self.children.is_some()
    }

    /// Inserts `entry`, returning `false` if it lies outside this node.
    ///
    /// Entries are held directly until the node reaches capacity; after that
    /// the node subdivides once and routes every further entry to the first
    /// child (NE, NW, SE, SW) whose boundary contains it.
    pub fn insert(&mut self, entry: IndexEntry<T>) -> bool {
        if !self.boundary.contains_point(entry.x, entry.y) {
            return false;
        }

        if self.entries.len() < self.capacity || self.depth >= MAX_DEPTH {
            self.entries.push(entry);
            return true;
        }

        if self.children.is_none() {
            self.subdivide();
        }

        match self.children.as_deref_mut() {
            Some(children) => children.iter_mut().any(|child| child.insert(entry)),
            None => false,
        }
    }

    fn subdivide(&mut self) {
        let depth = self.depth + 1;
        let capacity = self.capacity;
        let boundary = self.boundary;
        let child =
            |quadrant: Quadrant| QuadTree::with_depth(boundary.quadrant(quadrant), capacity, depth);
        self.children = Some(Box::new(Quadrant::ALL.map(child)));
    }

    /// Appends every entry inside `shape` to `found`.
    ///
    /// Subtrees whose boundary does not intersect the shape are skipped. Each
    /// entry lives in exactly one node, so nothing is reported twice.
    pub fn query<S: QueryShape>(&self, shape: &S, found: &mut Vec<IndexEntry<T>>) {
        if !shape.intersects(&self.boundary) {
            return;
        }

        found.extend(
            self.entries
                .iter()
                .filter(|entry| shape.contains(entry.x, entry.y))
                .copied(),
        );

        if let Some(children) = self.children.as_deref() {
            for child in children.iter() {
                child.query(shape, found);
            }
        }
    }

    /// Runs [`QuadTree::query`] into a fresh vector.
    pub fn query_vec<S: QueryShape>(&self, shape: &S) -> Vec<IndexEntry<T>> {
        let mut found = Vec::new();
        self.query(shape, &mut found);
        found
    }

    /// Drops all entries and children, keeping the boundary and capacity.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.children = None;
    }

    /// Total number of entries in this node and its descendants.
    pub fn len(&self) -> usize {
        let nested = self
            .children
            .as_deref()
            .map_or(0, |children| children.iter().map(QuadTree::len).sum::<usize>());
        self.entries.len() + nested
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.children.is_none()
    }

    /// Number of nodes in the tree, including this one.
    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .as_deref()
            .map_or(0, |children| children.iter().map(QuadTree::node_count).sum::<usize>())
    }
}
