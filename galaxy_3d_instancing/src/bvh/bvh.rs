/// InstanceBvh - static bounding volume hierarchy over instance boxes.
///
/// Built once from the full instance set, then walked every frame to find
/// which instances entered or left the frustum. Each node caches the
/// classification it got on the previous walk, so subtrees whose state did
/// not change are skipped entirely.
///
/// Nodes live in a flat array (root = 0). A node is a tagged variant:
/// interior (two children) or leaf (a range of the shared leaf-instance
/// array). Membership never changes after the build; a significantly
/// changed instance set needs a full rebuild.

use glam::Vec3;
use crate::bounds::AABB;
use crate::camera::{Frustum, VisibilityState};
use crate::config::{BvhConfig, BvhStrategy};
use crate::error::Result;
use crate::instancing::InstanceId;
use crate::{engine_debug, engine_err, engine_warn};

/// Index of the root node in the flat node array.
pub const ROOT: u32 = 0;

/// Bin count of the SAH strategy.
const SAH_BINS: usize = 12;

/// One instance as seen by the BVH builder.
#[derive(Debug, Clone, Copy)]
pub struct BvhItem {
    pub id: InstanceId,
    /// World-space box of the instance
    pub aabb: AABB,
    /// Partitioning key (the instance position)
    pub position: Vec3,
}

/// Node payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BvhNodeKind {
    /// Exactly two children, indices into the node array
    Interior { left: u32, right: u32 },
    /// Range `[first, first + count)` of the leaf-instance array
    Leaf { first: u32, count: u32 },
}

/// A single node in the BVH.
#[derive(Debug, Clone)]
pub struct BvhNode {
    aabb: AABB,
    visibility: VisibilityState,
    depth: u32,
    kind: BvhNodeKind,
}

impl BvhNode {
    /// Tight bound of every instance box in the subtree
    pub fn aabb(&self) -> &AABB {
        &self.aabb
    }

    /// Classification computed on the previous traversal
    pub fn visibility(&self) -> VisibilityState {
        self.visibility
    }

    /// Distance from the root (root = 0)
    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn kind(&self) -> BvhNodeKind {
        self.kind
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, BvhNodeKind::Leaf { .. })
    }
}

/// Static BVH over instance boxes.
#[derive(Debug, Clone)]
pub struct InstanceBvh {
    nodes: Vec<BvhNode>,
    leaf_instances: Vec<InstanceId>,
    config: BvhConfig,
    depth: u32,
    leaf_count: usize,
}

impl InstanceBvh {
    /// Build the hierarchy over `items`.
    ///
    /// Every node holding more than `leaf_capacity` instances (and above
    /// `max_depth`) is split on the longest axis of its box. The split
    /// value comes from the configured strategy, and the instance range is
    /// partitioned in place in a single pass.
    ///
    /// A leaf normally holds at most `leaf_capacity` instances or sits at
    /// `max_depth`. The one exception is a split that puts every position
    /// on the same side (identical positions, or one huge box pulling a
    /// `Center` split past all of them): splitting the same items again
    /// would repeat it on every level, so the node becomes a leaf at its
    /// own depth, over capacity, and the build logs a warning. Culling
    /// treats it like any other leaf.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a zero leaf capacity or more than `u32::MAX`
    /// instances.
    pub fn build(items: &[BvhItem], config: &BvhConfig) -> Result<Self> {
        config.validate()?;
        if items.len() > u32::MAX as usize {
            return Err(engine_err!(
                "galaxy3d::Bvh",
                "Cannot index {} instances with 32-bit ids",
                items.len()
            ));
        }

        let mut builder = BvhBuilder {
            items,
            indexes: (0..items.len() as u32).collect(),
            positions: items.iter().map(|item| item.position).collect(),
            nodes: Vec::with_capacity(Self::estimated_node_count(items.len(), config)),
            leaf_instances: Vec::with_capacity(items.len()),
            config: *config,
            depth: 0,
            leaf_count: 0,
            futile_splits: 0,
        };

        let root_aabb = items.iter().fold(AABB::EMPTY, |mut acc, item| {
            acc.expand(&item.aabb);
            acc
        });

        builder.build_node(root_aabb, 0, items.len(), 0);

        if builder.futile_splits > 0 {
            engine_warn!(
                "galaxy3d::Bvh",
                "{} node(s) kept as oversized leaves: all instance positions fell on one side of the split",
                builder.futile_splits
            );
        }

        engine_debug!(
            "galaxy3d::Bvh",
            "Built BVH ({:?}): {} instances, {} nodes, {} leaves, depth {}",
            config.strategy,
            items.len(),
            builder.nodes.len(),
            builder.leaf_count,
            builder.depth
        );

        Ok(Self {
            nodes: builder.nodes,
            leaf_instances: builder.leaf_instances,
            config: *config,
            depth: builder.depth,
            leaf_count: builder.leaf_count,
        })
    }

    /// Upper bound guess for `Vec::with_capacity`: a balanced tree has
    /// about 2 * n / leaf_capacity nodes.
    fn estimated_node_count(count: usize, config: &BvhConfig) -> usize {
        (2 * count / config.leaf_capacity.max(1)).max(1)
    }

    // ===== TRAVERSAL =====

    /// Re-evaluate visibility against `frustum`.
    ///
    /// Instances whose leaf went from `Out` to `In`/`Intersect` are appended
    /// to `show`, those whose leaf went to `Out` are appended to `hide`.
    /// Every instance appears at most once across both lists.
    pub fn update_visibility(
        &mut self,
        frustum: &Frustum,
        show: &mut Vec<InstanceId>,
        hide: &mut Vec<InstanceId>,
    ) {
        if self.nodes.is_empty() {
            return;
        }
        self.check_node(ROOT, frustum, None, show, hide);
    }

    /// Overwrite the cached state of every node.
    ///
    /// Used when the owner changes instance state wholesale (e.g. turning
    /// per-instance culling back on after all instances were drawn).
    pub fn reset_visibility(&mut self, state: VisibilityState) {
        for node in &mut self.nodes {
            node.visibility = state;
        }
    }

    /// Convenience wrapper around `update_visibility` returning `(show, hide)`.
    pub fn cull(&mut self, frustum: &Frustum) -> (Vec<InstanceId>, Vec<InstanceId>) {
        let mut show = Vec::new();
        let mut hide = Vec::new();
        self.update_visibility(frustum, &mut show, &mut hide);
        (show, hide)
    }

    /// Depth-first visibility update of one node.
    ///
    /// `forced` carries the state of a fully resolved (`In` or `Out`)
    /// ancestor: descendants take it without testing their own boxes.
    fn check_node(
        &mut self,
        index: u32,
        frustum: &Frustum,
        forced: Option<VisibilityState>,
        show: &mut Vec<InstanceId>,
        hide: &mut Vec<InstanceId>,
    ) {
        let node = &self.nodes[index as usize];
        let previous = node.visibility;
        let kind = node.kind;
        let visibility = forced.unwrap_or_else(|| frustum.classify_aabb(&node.aabb));

        if visibility == previous && visibility != VisibilityState::Intersect {
            return;
        }

        match kind {
            BvhNodeKind::Leaf { first, count } => {
                let ids = &self.leaf_instances[first as usize..(first + count) as usize];
                if previous == VisibilityState::Out {
                    show.extend_from_slice(ids);
                } else if visibility == VisibilityState::Out {
                    hide.extend_from_slice(ids);
                }
            }
            BvhNodeKind::Interior { left, right } => {
                let forced = match visibility {
                    VisibilityState::Intersect => None,
                    resolved => Some(resolved),
                };
                self.check_node(left, frustum, forced, show, hide);
                self.check_node(right, frustum, forced, show, hide);
            }
        }

        self.nodes[index as usize].visibility = visibility;
    }

    // ===== INTROSPECTION =====

    pub fn config(&self) -> &BvhConfig {
        &self.config
    }

    pub fn root(&self) -> Option<&BvhNode> {
        self.nodes.first()
    }

    pub fn node(&self, index: u32) -> Option<&BvhNode> {
        self.nodes.get(index as usize)
    }

    pub fn nodes(&self) -> &[BvhNode] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// Depth of the deepest node (root = 0)
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Number of instances indexed by the tree
    pub fn instance_count(&self) -> usize {
        self.leaf_instances.len()
    }

    /// Instances owned by a leaf node (empty for interior nodes).
    pub fn leaf_instances(&self, node: &BvhNode) -> &[InstanceId] {
        match node.kind {
            BvhNodeKind::Leaf { first, count } => {
                &self.leaf_instances[first as usize..(first + count) as usize]
            }
            BvhNodeKind::Interior { .. } => &[],
        }
    }

    /// Depth of every leaf, in node order.
    pub fn leaf_depths(&self) -> Vec<u32> {
        self.leaves().map(|node| node.depth).collect()
    }

    /// Iterate over the leaf nodes.
    pub fn leaves(&self) -> impl Iterator<Item = &BvhNode> + '_ {
        self.nodes.iter().filter(|node| node.is_leaf())
    }
}

// ===== BUILDER =====

/// Scratch state of one build. The index and position arrays are
/// partitioned in lockstep and dropped once the tree exists.
struct BvhBuilder<'a> {
    items: &'a [BvhItem],
    indexes: Vec<u32>,
    positions: Vec<Vec3>,
    nodes: Vec<BvhNode>,
    leaf_instances: Vec<InstanceId>,
    config: BvhConfig,
    depth: u32,
    leaf_count: usize,
    futile_splits: usize,
}

impl<'a> BvhBuilder<'a> {
    /// Build the node covering `[offset, offset + count)` and return its index.
    fn build_node(&mut self, aabb: AABB, offset: usize, count: usize, depth: u32) -> u32 {
        let index = self.nodes.len() as u32;
        self.nodes.push(BvhNode {
            aabb,
            visibility: VisibilityState::In,
            depth,
            kind: BvhNodeKind::Leaf { first: 0, count: 0 },
        });
        self.depth = self.depth.max(depth);

        if depth >= self.config.max_depth || count <= self.config.leaf_capacity {
            self.make_leaf(index, offset, count);
            return index;
        }

        let axis = aabb.longest_axis();
        let split = self.split_value(&aabb, axis, offset, count);
        let (left_end, left_aabb, right_aabb) = self.partition(axis, offset, count, split);

        // Same items on one side means the same box, axis and split on every
        // level below: stop here instead of chaining down to max_depth.
        if left_end == offset || left_end == offset + count {
            self.futile_splits += 1;
            self.make_leaf(index, offset, count);
            return index;
        }

        let left = self.build_node(left_aabb, offset, left_end - offset, depth + 1);
        let right = self.build_node(right_aabb, left_end, offset + count - left_end, depth + 1);
        self.nodes[index as usize].kind = BvhNodeKind::Interior { left, right };
        index
    }

    fn make_leaf(&mut self, index: u32, offset: usize, count: usize) {
        let first = self.leaf_instances.len() as u32;
        let items = self.items;
        self.leaf_instances.extend(
            self.indexes[offset..offset + count]
                .iter()
                .map(|&i| items[i as usize].id),
        );
        self.nodes[index as usize].kind = BvhNodeKind::Leaf { first, count: count as u32 };
        self.leaf_count += 1;
    }

    /// Split value on `axis` for the range, by strategy.
    fn split_value(&self, aabb: &AABB, axis: usize, offset: usize, count: usize) -> f32 {
        let center = (aabb.min[axis] + aabb.max[axis]) * 0.5;
        match self.config.strategy {
            BvhStrategy::Center => center,
            BvhStrategy::Average => {
                let sum: f32 = self.positions[offset..offset + count]
                    .iter()
                    .map(|p| p[axis])
                    .sum();
                sum / count as f32
            }
            BvhStrategy::Sah => self.sah_split(axis, offset, count).unwrap_or(center),
        }
    }

    /// Binned SAH: bucket positions along `axis`, then pick the bin
    /// boundary minimizing `count_left * area_left + count_right * area_right`.
    ///
    /// `None` when all positions coincide on the axis or no boundary
    /// separates them.
    fn sah_split(&self, axis: usize, offset: usize, count: usize) -> Option<f32> {
        let range = offset..offset + count;
        let (lo, hi) = self.positions[range.clone()]
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), p| (lo.min(p[axis]), hi.max(p[axis])));
        let width = hi - lo;
        if !(width > 0.0) {
            return None;
        }

        let mut bin_boxes = [AABB::EMPTY; SAH_BINS];
        let mut bin_counts = [0usize; SAH_BINS];
        for i in range {
            let t = (self.positions[i][axis] - lo) / width;
            let bin = ((t * SAH_BINS as f32) as usize).min(SAH_BINS - 1);
            bin_boxes[bin].expand(&self.items[self.indexes[i] as usize].aabb);
            bin_counts[bin] += 1;
        }

        // Suffix sweep: right-hand area/count for every boundary
        let mut right_area = [0.0f32; SAH_BINS];
        let mut right_count = [0usize; SAH_BINS];
        let mut acc_box = AABB::EMPTY;
        let mut acc_count = 0;
        for bin in (1..SAH_BINS).rev() {
            acc_box.expand(&bin_boxes[bin]);
            acc_count += bin_counts[bin];
            right_area[bin] = acc_box.surface_area();
            right_count[bin] = acc_count;
        }

        let mut best: Option<(f32, usize)> = None;
        let mut left_box = AABB::EMPTY;
        let mut left_count = 0;
        for boundary in 1..SAH_BINS {
            left_box.expand(&bin_boxes[boundary - 1]);
            left_count += bin_counts[boundary - 1];
            if left_count == 0 || right_count[boundary] == 0 {
                continue;
            }
            let cost = left_count as f32 * left_box.surface_area()
                + right_count[boundary] as f32 * right_area[boundary];
            if best.map_or(true, |(best_cost, _)| cost < best_cost) {
                best = Some((cost, boundary));
            }
        }

        best.map(|(_, boundary)| lo + width * boundary as f32 / SAH_BINS as f32)
    }

    /// Two-cursor in-place partition of `[offset, offset + count)`.
    ///
    /// Positions `<= split` end up on the left. The left cursor walks up
    /// while its element belongs left; when it stops, the right cursor
    /// walks down until it finds an element that belongs left, and the two
    /// are swapped. Each side's box grows as elements are assigned to it.
    /// Every step shrinks the unexamined range `[lo, hi)`, so the loop
    /// terminates for any input.
    ///
    /// Returns `(left_end, left_box, right_box)`.
    fn partition(&mut self, axis: usize, offset: usize, count: usize, split: f32) -> (usize, AABB, AABB) {
        let mut left_aabb = AABB::EMPTY;
        let mut right_aabb = AABB::EMPTY;
        let mut lo = offset;
        let mut hi = offset + count;

        while lo < hi {
            if self.positions[lo][axis] > split {
                loop {
                    hi -= 1;
                    if hi == lo {
                        right_aabb.expand(self.item_aabb(lo));
                        return (lo, left_aabb, right_aabb);
                    }
                    if self.positions[hi][axis] < split {
                        self.swap(lo, hi);
                        right_aabb.expand(self.item_aabb(hi));
                        break;
                    }
                    right_aabb.expand(self.item_aabb(hi));
                }
            }
            left_aabb.expand(self.item_aabb(lo));
            lo += 1;
        }

        (lo, left_aabb, right_aabb)
    }

    #[inline]
    fn item_aabb(&self, slot: usize) -> &'a AABB {
        &self.items[self.indexes[slot] as usize].aabb
    }

    #[inline]
    fn swap(&mut self, a: usize, b: usize) {
        self.indexes.swap(a, b);
        self.positions.swap(a, b);
    }
}

#[cfg(test)]
#[path = "bvh_tests.rs"]
mod tests;
