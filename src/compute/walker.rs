//! Bounded depth-first walks of the technosphere.
//!
//! Both walkers use an explicit stack of `(node, amount, level)` frames and
//! yield lazily in pre-order, children in stored exchange order. No visited
//! set is kept: a node reached along two paths (or around a loop) is walked
//! once per path until the depth bound or cutoff stops it.

use crate::error::AnalysisError;
use crate::solver::{FunctionalUnit, LcaSolver};
use crate::store::{ExchangeKind, NodeId, Registry};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

/// Depth bound and relative cutoff shared by both walks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraversalOptions {
    pub max_level: usize,
    pub cutoff: f64,
}

/// One step of a score traversal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisitRecord {
    pub node: NodeId,
    pub level: usize,
    /// Absolute throughput of `node` along this path.
    pub amount: f64,
    /// Absolute score of `amount` units of `node`.
    pub score: f64,
    /// `score / reference_score`, or 0 when the reference is zero.
    pub fraction: f64,
}

/// One step of an amount-only supply chain walk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SupplyRecord {
    pub node: NodeId,
    pub level: usize,
    pub amount: f64,
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    node: NodeId,
    amount: f64,
    level: usize,
}

/// Pushes the technosphere inputs of `frame` so they pop in stored order.
fn push_inputs(registry: &Registry, frame: Frame, stack: &mut Vec<Frame>) {
    let production = registry.exchanges(frame.node, ExchangeKind::Production);
    let produced = match production.as_slice() {
        [] => 1.0,
        [single] => single.amount,
        _ => {
            warn!(node = %registry.node(frame.node).key, "Hit multiple production exchanges; not expanding this branch");
            return;
        }
    };

    let inputs = registry.exchanges(frame.node, ExchangeKind::Technosphere);
    stack.extend(
        inputs.iter()
            .rev()
            .filter(|exc| !exc.is_loop())
            .map(|exc| Frame {
                node: exc.input,
                amount: frame.amount * exc.amount / produced,
                level: frame.level + 1,
            }),
    );
}

fn check_cancelled(cancel: Option<&AtomicBool>) -> Result<(), AnalysisError> {
    match cancel {
        Some(flag) if flag.load(Ordering::Relaxed) => Err(AnalysisError::Cancelled),
        _ => Ok(()),
    }
}

/// Walks the supply chain of a root, re-solving the score of every visited node.
///
/// Holds the solver exclusively for as long as the walker lives, so no other
/// traversal can interleave rescales on the same factorization.
pub struct GraphWalker<'a, S: LcaSolver> {
    registry: &'a Registry,
    solver: &'a mut S,
    options: TraversalOptions,
    cancel: Option<&'a AtomicBool>,
}

impl<'a, S: LcaSolver> GraphWalker<'a, S> {
    pub fn new(registry: &'a Registry, solver: &'a mut S, options: TraversalOptions) -> Self {
        Self { registry, solver, options, cancel: None }
    }

    /// Stops the traversal with [`AnalysisError::Cancelled`] once `flag` is set.
    pub fn with_cancellation(mut self, flag: &'a AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Starts a fresh traversal. `root_score` is the solved score of
    /// `root_amount` units of `root` and is the reference for every fraction.
    pub fn traverse(&mut self, root: NodeId, root_amount: f64, root_score: f64) -> Traversal<'_, S> {
        debug!(
            root = %self.registry.node(root).key,
            max_level = self.options.max_level,
            cutoff = self.options.cutoff,
            "Starting recursive score traversal"
        );
        Traversal {
            registry: self.registry,
            solver: &mut *self.solver,
            options: self.options,
            cancel: self.cancel,
            reference_score: root_score,
            stack: vec![Frame { node: root, amount: root_amount, level: 0 }],
        }
    }
}

/// Lazy iterator over the records of one traversal.
pub struct Traversal<'w, S: LcaSolver> {
    registry: &'w Registry,
    solver: &'w mut S,
    options: TraversalOptions,
    cancel: Option<&'w AtomicBool>,
    reference_score: f64,
    stack: Vec<Frame>,
}

impl<S: LcaSolver> Traversal<'_, S> {
    pub fn reference_score(&self) -> f64 { self.reference_score }

    fn fraction(&self, score: f64) -> f64 {
        if self.reference_score == 0.0 { 0.0 } else { score / self.reference_score }
    }

    /// Sign-insensitive; a zero reference disables pruning.
    fn below_cutoff(&self, score: f64) -> bool {
        self.reference_score != 0.0
            && score.abs() < self.reference_score.abs() * self.options.cutoff
    }

    fn step(&mut self, frame: Frame) -> Result<Option<VisitRecord>, AnalysisError> {
        check_cancelled(self.cancel)?;

        let score = if frame.level == 0 {
            self.reference_score
        } else {
            let score = self.solver.rescale(&FunctionalUnit::single(frame.node, frame.amount))?;
            if self.below_cutoff(score) {
                debug!(node = %self.registry.node(frame.node).key, level = frame.level, score, "Pruned below cutoff");
                return Ok(None);
            }
            score
        };

        if frame.level < self.options.max_level {
            push_inputs(self.registry, frame, &mut self.stack);
        }

        Ok(Some(VisitRecord {
            node: frame.node,
            level: frame.level,
            amount: frame.amount,
            score,
            fraction: self.fraction(score),
        }))
    }
}

impl<S: LcaSolver> Iterator for Traversal<'_, S> {
    type Item = Result<VisitRecord, AnalysisError>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(frame) = self.stack.pop() {
            match self.step(frame) {
                Ok(Some(record)) => return Some(Ok(record)),
                Ok(None) => continue,
                Err(e) => {
                    // A failed rescale leaves the factorization suspect; stop here.
                    self.stack.clear();
                    return Some(Err(e));
                }
            }
        }
        None
    }
}

/// Amount-only walk: no scores, nodes below an absolute `cutoff` amount are omitted.
pub struct SupplyChain<'a> {
    registry: &'a Registry,
    options: TraversalOptions,
    stack: Vec<Frame>,
}

impl<'a> SupplyChain<'a> {
    pub fn new(registry: &'a Registry, root: NodeId, amount: f64, options: TraversalOptions) -> Self {
        Self {
            registry,
            options,
            stack: vec![Frame { node: root, amount, level: 0 }],
        }
    }
}

impl Iterator for SupplyChain<'_> {
    type Item = SupplyRecord;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(frame) = self.stack.pop() {
            if self.options.cutoff > 0.0 && frame.amount < self.options.cutoff {
                continue;
            }
            if frame.level < self.options.max_level {
                push_inputs(self.registry, frame, &mut self.stack);
            }
            return Some(SupplyRecord { node: frame.node, level: frame.level, amount: frame.amount });
        }
        None
    }
}
