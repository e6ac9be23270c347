//! Graph transformers
//!
//! This module provides ready-to-use rewrite passes and the driver that runs
//! them:
//!
//! - [`FuseBiasGelu`]: `Add(X, B) -> Gelu` into `com.microsoft::BiasGelu`
//! - [`GraphTransformerManager`]: runs registered passes per level until the
//!   graph stops changing
//!
//! # Example
//!
//! ```ignore
//! use peephole_fusion::transform::OptimizeOptions;
//! use peephole_fusion::transformers::optimize_graph;
//!
//! let options = OptimizeOptions::default().with_backends(&["cpu"]);
//! let modified = optimize_graph(&mut graph, &options)?;
//! ```

/// Fuse Bias + Gelu
pub mod fuse_bias_gelu;

pub use fuse_bias_gelu::FuseBiasGelu;

use log::Level;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{GraphResult, TransformError};
use crate::graph::Graph;
use crate::logging::{Logger, DEFAULT_LOGGER_ID};
use crate::traits::GraphTransformer;
use crate::transform::config::check_max_steps;
use crate::transform::{OptimizeOptions, TransformerLevel};

/// Runs registered transformers level by level
///
/// Within a level, every enabled transformer is applied in registration
/// order; the round repeats until none reports a change or `max_steps`
/// rounds have run.
pub struct GraphTransformerManager {
    max_steps: usize,
    transformers: FxHashMap<TransformerLevel, Vec<Box<dyn GraphTransformer>>>,
    disabled: FxHashSet<String>,
}

impl GraphTransformerManager {
    /// Create an empty manager; `max_steps` must be at least 1
    pub fn new(max_steps: usize) -> GraphResult<Self> {
        Ok(Self {
            max_steps: check_max_steps(max_steps)?,
            transformers: FxHashMap::default(),
            disabled: FxHashSet::default(),
        })
    }

    /// Manager with the built-in transformers registered per `options`
    pub fn from_options(options: &OptimizeOptions) -> GraphResult<Self> {
        let mut manager = Self::new(options.max_steps)?;
        manager.disable(options.disabled_transformers.iter().cloned());
        manager.register(
            Box::new(FuseBiasGelu::new(options.compatible_backends.iter().cloned())),
            TransformerLevel::Level2,
        )?;
        Ok(manager)
    }

    /// Skip the named transformers when applying
    pub fn disable<I>(&mut self, names: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.disabled.extend(names);
    }

    /// Register a transformer at `level`
    ///
    /// Names are unique across all levels.
    pub fn register(
        &mut self,
        transformer: Box<dyn GraphTransformer>,
        level: TransformerLevel,
    ) -> GraphResult<()> {
        let name = transformer.name();
        if self
            .transformers
            .values()
            .flatten()
            .any(|t| t.name() == name)
        {
            return Err(TransformError::InvalidConfig(format!(
                "transformer '{}' is already registered",
                name
            )));
        }

        self.transformers.entry(level).or_default().push(transformer);
        Ok(())
    }

    /// Names registered at `level`, in registration order
    pub fn transformer_names(&self, level: TransformerLevel) -> Vec<&str> {
        self.transformers
            .get(&level)
            .map(|list| list.iter().map(|t| t.name()).collect())
            .unwrap_or_default()
    }

    /// Maximum rounds per level
    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    /// Apply the transformers of one level until a fixed point
    ///
    /// Returns whether any round changed the graph.
    pub fn apply_transformers(
        &self,
        graph: &mut Graph,
        level: TransformerLevel,
        logger: &Logger,
    ) -> GraphResult<bool> {
        let Some(list) = self.transformers.get(&level) else {
            return Ok(false);
        };

        let mut modified = false;
        for step in 0..self.max_steps {
            let mut changed = false;
            for transformer in list {
                if self.disabled.contains(transformer.name()) {
                    continue;
                }
                changed |= transformer.apply(graph, 0, logger)?;
            }

            if !changed {
                break;
            }
            modified = true;

            if step + 1 == self.max_steps {
                pass_log!(
                    logger,
                    Level::Info,
                    "level {} still changing after {} steps",
                    level,
                    self.max_steps
                );
            }
        }

        Ok(modified)
    }

    /// Apply every level up to and including `level`
    pub fn optimize(
        &self,
        graph: &mut Graph,
        level: TransformerLevel,
        logger: &Logger,
    ) -> GraphResult<bool> {
        let mut modified = false;
        for current in level.enabled_levels() {
            modified |= self.apply_transformers(graph, current, logger)?;
        }

        pass_log!(
            logger,
            Level::Debug,
            "optimized '{}' up to level {}: modified={}",
            graph.name(),
            level,
            modified
        );
        Ok(modified)
    }
}

/// Optimize `graph` with the built-in transformers
pub fn optimize_graph(graph: &mut Graph, options: &OptimizeOptions) -> GraphResult<bool> {
    let logger = options.logger(DEFAULT_LOGGER_ID);
    GraphTransformerManager::from_options(options)?.optimize(graph, options.level, &logger)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::builder::fixtures::{init_logger, BiasGeluFixture};
    use crate::pattern::ops::BIAS_GELU;

    /// Reports a change on its first `budget` applications
    struct Countdown {
        name: &'static str,
        budget: Cell<usize>,
        calls: std::rc::Rc<Cell<usize>>,
        backends: FxHashSet<String>,
    }

    impl Countdown {
        fn new(name: &'static str, budget: usize, calls: std::rc::Rc<Cell<usize>>) -> Self {
            Self {
                name,
                budget: Cell::new(budget),
                calls,
                backends: FxHashSet::default(),
            }
        }
    }

    impl GraphTransformer for Countdown {
        fn name(&self) -> &str {
            self.name
        }

        fn compatible_backends(&self) -> &FxHashSet<String> {
            &self.backends
        }

        fn apply_impl(&self, _graph: &mut Graph, _level: usize, _logger: &Logger) -> GraphResult<bool> {
            self.calls.set(self.calls.get() + 1);
            let left = self.budget.get();
            if left == 0 {
                return Ok(false);
            }
            self.budget.set(left - 1);
            Ok(true)
        }
    }

    #[test]
    fn test_runs_until_fixed_point() {
        init_logger();
        let calls = std::rc::Rc::new(Cell::new(0));
        let mut manager = GraphTransformerManager::new(10).unwrap();
        manager
            .register(Box::new(Countdown::new("c", 2, calls.clone())), TransformerLevel::Level1)
            .unwrap();

        let mut graph = Graph::new("main");
        let modified = manager
            .apply_transformers(&mut graph, TransformerLevel::Level1, &Logger::default())
            .unwrap();

        assert!(modified);
        // two changing rounds plus the one that confirms the fixed point
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_max_steps_caps_rounds() {
        let calls = std::rc::Rc::new(Cell::new(0));
        let mut manager = GraphTransformerManager::new(3).unwrap();
        manager
            .register(Box::new(Countdown::new("c", 100, calls.clone())), TransformerLevel::Level1)
            .unwrap();

        let mut graph = Graph::new("main");
        manager
            .apply_transformers(&mut graph, TransformerLevel::Level1, &Logger::default())
            .unwrap();

        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_disabled_transformer_is_skipped() {
        let calls = std::rc::Rc::new(Cell::new(0));
        let mut manager = GraphTransformerManager::new(10).unwrap();
        manager
            .register(Box::new(Countdown::new("c", 5, calls.clone())), TransformerLevel::Default)
            .unwrap();
        manager.disable(["c".to_string()]);

        let mut graph = Graph::new("main");
        let modified = manager
            .apply_transformers(&mut graph, TransformerLevel::Default, &Logger::default())
            .unwrap();

        assert!(!modified);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let calls = std::rc::Rc::new(Cell::new(0));
        let mut manager = GraphTransformerManager::new(10).unwrap();
        manager
            .register(Box::new(Countdown::new("c", 0, calls.clone())), TransformerLevel::Level1)
            .unwrap();

        let err = manager
            .register(Box::new(Countdown::new("c", 0, calls)), TransformerLevel::Level2)
            .unwrap_err();
        assert!(matches!(err, TransformError::InvalidConfig(_)));
    }

    #[test]
    fn test_default_manager_registers_fusion() {
        let manager = GraphTransformerManager::from_options(&OptimizeOptions::default()).unwrap();

        assert_eq!(
            manager.transformer_names(TransformerLevel::Level2),
            vec![FuseBiasGelu::NAME]
        );
        assert!(manager.transformer_names(TransformerLevel::Level1).is_empty());
        assert_eq!(manager.max_steps(), 10);
    }

    #[test]
    fn test_optimize_graph_fuses_at_extended_level() {
        init_logger();
        let mut graph = BiasGeluFixture::default().build();

        assert!(optimize_graph(&mut graph, &OptimizeOptions::default()).unwrap());
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.nodes().next().unwrap().op_type, BIAS_GELU);
    }

    #[test]
    fn test_optimize_graph_respects_level_and_disable() {
        let mut graph = BiasGeluFixture::default().build();
        let basic = OptimizeOptions::default().with_level(TransformerLevel::Level1);
        assert!(!optimize_graph(&mut graph, &basic).unwrap());

        let disabled = OptimizeOptions::default().disable(FuseBiasGelu::NAME);
        assert!(!optimize_graph(&mut graph, &disabled).unwrap());
        assert_eq!(graph.node_count(), 2);
    }

    #[test]
    fn test_zero_max_steps_rejected() {
        assert!(matches!(
            GraphTransformerManager::new(0),
            Err(TransformError::InvalidConfig(_))
        ));

        let options = OptimizeOptions::default().with_max_steps(0);
        assert!(GraphTransformerManager::from_options(&options).is_err());

        let mut graph = BiasGeluFixture::default().build();
        assert!(optimize_graph(&mut graph, &options).is_err());
        assert_eq!(graph.node_count(), 2);
    }
}
