//! Transformer levels and pass statistics

use std::fmt;
use std::str::FromStr;

use crate::error::TransformError;

/// Optimization level a transformer is registered at
///
/// Levels run in ascending order; enabling a level enables every level
/// below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum TransformerLevel {
    /// Transformers that must always run
    Default,
    /// Semantics-preserving basic rewrites
    Level1,
    /// Extended rewrites, including contrib-operator fusions
    #[default]
    Level2,
    /// Layout-level rewrites
    Level3,
}

impl TransformerLevel {
    /// All levels, in execution order
    pub const ALL: [TransformerLevel; 4] = [
        TransformerLevel::Default,
        TransformerLevel::Level1,
        TransformerLevel::Level2,
        TransformerLevel::Level3,
    ];

    /// Levels enabled when optimizing up to `self`, in execution order
    pub fn enabled_levels(self) -> impl Iterator<Item = TransformerLevel> {
        Self::ALL.into_iter().filter(move |l| *l <= self)
    }
}

impl fmt::Display for TransformerLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransformerLevel::Default => "default",
            TransformerLevel::Level1 => "basic",
            TransformerLevel::Level2 => "extended",
            TransformerLevel::Level3 => "all",
        };
        f.write_str(name)
    }
}

impl FromStr for TransformerLevel {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "0" | "default" | "disable" => Ok(TransformerLevel::Default),
            "1" | "basic" => Ok(TransformerLevel::Level1),
            "2" | "extended" => Ok(TransformerLevel::Level2),
            "3" | "all" | "layout" => Ok(TransformerLevel::Level3),
            other => Err(TransformError::InvalidConfig(format!(
                "unknown optimization level '{}'",
                other
            ))),
        }
    }
}

/// Statistics from a transformer run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TransformStats {
    /// Number of fusions performed
    pub fusions: usize,
    /// Number of nodes added
    pub nodes_added: usize,
    /// Number of nodes removed
    pub nodes_removed: usize,
}

impl TransformStats {
    /// Record one fusion replacing `removed` nodes by one new node
    pub fn record_fusion(&mut self, removed: usize) {
        self.fusions += 1;
        self.nodes_added += 1;
        self.nodes_removed += removed;
    }

    /// Merge with another result
    pub fn merge(&mut self, other: TransformStats) {
        self.fusions += other.fusions;
        self.nodes_added += other.nodes_added;
        self.nodes_removed += other.nodes_removed;
    }

    /// Net change in node count (negative when the graph shrank)
    pub fn net_node_change(&self) -> isize {
        self.nodes_added as isize - self.nodes_removed as isize
    }
}
