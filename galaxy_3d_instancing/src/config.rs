//! Configuration for BVH construction and instanced-mesh culling.
//!
//! Plain structs with sensible `Default`s. The enums also parse from
//! strings so a host can read them from its own settings files.

use std::fmt;
use std::str::FromStr;
use crate::camera::DepthRange;
use crate::error::{Error, Result};
use crate::engine_err;

// ============================================================================
// BVH
// ============================================================================

/// How an interior BVH node chooses its split value on the longest axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BvhStrategy {
    /// Midpoint of the node box extent
    #[default]
    Center,
    /// Mean of the instance positions
    Average,
    /// Binned surface area heuristic
    Sah,
}

impl FromStr for BvhStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "center" => Ok(BvhStrategy::Center),
            "average" => Ok(BvhStrategy::Average),
            "sah" => Ok(BvhStrategy::Sah),
            other => Err(engine_err!("galaxy3d::Config", "Unknown BVH strategy '{}'", other)),
        }
    }
}

impl fmt::Display for BvhStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BvhStrategy::Center => write!(f, "center"),
            BvhStrategy::Average => write!(f, "average"),
            BvhStrategy::Sah => write!(f, "sah"),
        }
    }
}

/// BVH build parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BvhConfig {
    /// Split strategy for interior nodes
    pub strategy: BvhStrategy,
    /// A node holding at most this many instances becomes a leaf
    pub leaf_capacity: usize,
    /// Nodes at this depth become leaves regardless of their count (root = 0)
    pub max_depth: u32,
}

impl Default for BvhConfig {
    fn default() -> Self {
        Self {
            strategy: BvhStrategy::Center,
            leaf_capacity: 10,
            max_depth: 40,
        }
    }
}

impl BvhConfig {
    /// # Errors
    ///
    /// `InvalidArgument` for a zero leaf capacity.
    pub fn validate(&self) -> Result<()> {
        if self.leaf_capacity == 0 {
            return Err(engine_err!("galaxy3d::Config", "BVH leaf capacity must be > 0"));
        }
        Ok(())
    }
}

// ============================================================================
// Instanced mesh
// ============================================================================

/// Which culling path an instanced mesh uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CullingBehaviour {
    /// Instances rarely move: a BVH is built once and walked every frame
    #[default]
    Static,
    /// Instances move every frame: each one is sphere-tested
    Dynamic,
}

impl FromStr for CullingBehaviour {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "static" => Ok(CullingBehaviour::Static),
            "dynamic" => Ok(CullingBehaviour::Dynamic),
            other => Err(engine_err!("galaxy3d::Config", "Unknown culling behaviour '{}'", other)),
        }
    }
}

/// Instanced mesh settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstancedMeshConfig {
    /// Static (BVH) or dynamic (per-instance sphere) culling
    pub behaviour: CullingBehaviour,
    /// BVH parameters (static behaviour only)
    pub bvh: BvhConfig,
    /// Clip-space depth convention of the matrices passed to `update_culling`
    pub depth_range: DepthRange,
    /// When false, `update_culling` does nothing and only the per-instance
    /// visibility flag decides what is drawn
    pub per_instance_culling: bool,
}

impl Default for InstancedMeshConfig {
    fn default() -> Self {
        Self {
            behaviour: CullingBehaviour::Static,
            bvh: BvhConfig::default(),
            depth_range: DepthRange::ZeroToOne,
            per_instance_culling: true,
        }
    }
}

impl InstancedMeshConfig {
    pub fn validate(&self) -> Result<()> {
        self.bvh.validate()
    }
}
