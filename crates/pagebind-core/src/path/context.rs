use crate::{
    path::ast::Expr,
    value::{Slot, Value},
};
use std::{
    collections::{BTreeMap, VecDeque},
    fmt,
};

/// Named values readable through `#name` references.
pub type Variables = BTreeMap<String, Value>;

static NO_VARIABLES: Variables = BTreeMap::new();

///
/// HistoryEntry
///
/// One rendered (node, produced value) pair from an evaluation.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HistoryEntry {
    pub node: String,
    pub value: String,
}

impl fmt::Display for HistoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} => {}", self.node, self.value)
    }
}

///
/// EvalContext
///
/// Per-call evaluation state: the start value, the value the chain walk
/// is currently positioned on, visible variables, and a bounded history
/// of produced values kept for diagnostics. History entries are rendered
/// lazily, only when somebody asks for them.
///

#[derive(Debug)]
pub struct EvalContext<'a> {
    start: Slot<'a>,
    current: Slot<'a>,
    variables: &'a Variables,
    history: VecDeque<(&'a Expr, Slot<'a>)>,
    history_limit: usize,
}

impl<'a> EvalContext<'a> {
    #[must_use]
    pub fn new(start: Slot<'a>, variables: &'a Variables, history_limit: usize) -> Self {
        Self {
            current: start.clone(),
            start,
            variables,
            history: VecDeque::new(),
            history_limit,
        }
    }

    /// Context without variables.
    #[must_use]
    pub fn for_start(start: Slot<'a>, history_limit: usize) -> Self {
        Self::new(start, &NO_VARIABLES, history_limit)
    }

    #[must_use]
    pub const fn start(&self) -> &Slot<'a> {
        &self.start
    }

    #[must_use]
    pub const fn current(&self) -> &Slot<'a> {
        &self.current
    }

    #[must_use]
    pub const fn variables(&self) -> &'a Variables {
        self.variables
    }

    /// Render the retained history, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.history
            .iter()
            .map(|(node, slot)| HistoryEntry {
                node: node.to_string(),
                value: slot.describe(),
            })
            .collect()
    }

    pub(crate) fn set_current(&mut self, slot: Slot<'a>) {
        self.current = slot;
    }

    /// Fresh context sharing the start value and variables; its current
    /// value is independent of this one.
    pub(crate) fn sub_context(&self) -> Self {
        Self::new(self.start.clone(), self.variables, self.history_limit)
    }

    /// Fold a finished sub-context's history into this one.
    pub(crate) fn absorb(&mut self, sub: Self) {
        for (node, slot) in sub.history {
            self.push_history(node, slot);
        }
    }

    pub(crate) fn record(&mut self, node: &'a Expr, slot: &Slot<'a>) {
        if self.history_limit > 0 {
            self.push_history(node, slot.clone());
        }
    }

    fn push_history(&mut self, node: &'a Expr, slot: Slot<'a>) {
        if self.history.len() == self.history_limit {
            self.history.pop_front();
        }
        if self.history_limit > 0 {
            self.history.push_back((node, slot));
        }
    }
}
