//! Per-namespace history state.
//!
//! A [`PathConfig`] is an immutable value: every change produces a new
//! config that replaces the old one in the registry. The stacks are
//! persistent vectors, so copies share structure.
//!
//! ```text
//! record(A) record(B{g1}) record(C{g1})
//! ┌────────────────────────────────────┐
//! │ done:   [A, B, C]                  │
//! │ undone: []                         │
//! └────────────────────────────────────┘
//!
//! undo()  <-- C triggers, B joins through g1
//! ┌────────────────────────────────────┐
//! │ done:   [A]                        │
//! │ undone: [B, C]                     │
//! └────────────────────────────────────┘
//! ```

use std::collections::BTreeSet;
use std::fmt;

use im::Vector;
use serde::Serialize;

use crate::types::{Commit, Namespace, ReservedMutation};

/// Whether the recorder may append to a namespace's history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplayState {
    /// Recording committed mutations.
    #[default]
    Idle,
    /// Re-issuing history; the store's own commits must not be recorded.
    Replaying,
}

impl ReplayState {
    /// Check if new mutations are being recorded.
    pub fn is_recording(self) -> bool {
        matches!(self, Self::Idle)
    }
}

impl fmt::Display for ReplayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Replaying => "replaying",
        };
        write!(f, "{s}")
    }
}

/// History state for one namespace.
#[derive(Debug, Clone, PartialEq)]
pub struct PathConfig {
    namespace: Namespace,
    ignore_mutations: BTreeSet<String>,
    done: Vector<Commit>,
    undone: Vector<Commit>,
    state: ReplayState,
}

impl PathConfig {
    /// Create an empty history for a namespace.
    ///
    /// `ignore_mutations` must already be fully qualified. The namespace's
    /// status mutation is always added.
    pub fn new(namespace: Namespace, ignore_mutations: impl IntoIterator<Item = String>) -> Self {
        let mut ignore_mutations: BTreeSet<String> = ignore_mutations.into_iter().collect();
        ignore_mutations.insert(ReservedMutation::StatusUpdate.qualified(&namespace));
        Self {
            namespace,
            ignore_mutations,
            done: Vector::new(),
            undone: Vector::new(),
            state: ReplayState::Idle,
        }
    }

    /// The namespace this history belongs to.
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Fully-qualified mutation names that are never recorded.
    pub fn ignore_mutations(&self) -> &BTreeSet<String> {
        &self.ignore_mutations
    }

    /// Recorded commits, oldest first.
    pub fn done(&self) -> &Vector<Commit> {
        &self.done
    }

    /// Undone commits, most recently undone last.
    pub fn undone(&self) -> &Vector<Commit> {
        &self.undone
    }

    /// Current replay state.
    pub fn state(&self) -> ReplayState {
        self.state
    }

    /// Check if there is anything to undo.
    pub fn can_undo(&self) -> bool {
        !self.done.is_empty()
    }

    /// Check if there is anything to redo.
    pub fn can_redo(&self) -> bool {
        !self.undone.is_empty()
    }

    /// Decide whether a committed mutation belongs in this history.
    pub fn should_record(&self, mutation_type: &str) -> bool {
        ReservedMutation::all()
            .iter()
            .all(|reserved| reserved.qualified(&self.namespace) != mutation_type)
            && !self.ignore_mutations.contains(mutation_type)
            && self.namespace.owns(mutation_type)
            && self.state.is_recording()
    }

    /// A copy with the commit pushed onto `done`.
    #[must_use]
    pub fn with_recorded(&self, commit: Commit) -> Self {
        let mut next = self.clone();
        next.done.push_back(commit);
        next
    }

    /// A copy in the given replay state.
    #[must_use]
    pub fn with_state(&self, state: ReplayState) -> Self {
        Self {
            state,
            ..self.clone()
        }
    }

    /// Split the top of `done` (and its group) off for undo.
    pub fn take_undo(&self) -> Option<GroupSplit> {
        GroupSplit::take(&self.done)
    }

    /// Split the top of `undone` (and its group) off for redo.
    pub fn take_redo(&self) -> Option<GroupSplit> {
        GroupSplit::take(&self.undone)
    }

    /// A copy with the split group moved from `done` onto `undone`.
    #[must_use]
    pub fn after_undo(&self, split: &GroupSplit) -> Self {
        let mut undone = self.undone.clone();
        undone.extend(split.stacked.iter().cloned());
        Self {
            done: split.remaining.clone(),
            undone,
            ..self.clone()
        }
    }

    /// A copy with the split group moved from `undone` onto `done`.
    #[must_use]
    pub fn after_redo(&self, split: &GroupSplit) -> Self {
        let mut done = self.done.clone();
        done.extend(split.stacked.iter().cloned());
        Self {
            done,
            undone: split.remaining.clone(),
            ..self.clone()
        }
    }
}

/// The commits one undo or redo step moves between stacks.
///
/// The top commit of the source stack triggers the step. When it carries an
/// action group, every other commit of the stack with the same group joins.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSplit {
    /// Trigger first, then the other members in stack order.
    ordered: Vec<Commit>,
    /// Members in stack order, trigger last.
    stacked: Vec<Commit>,
    /// The source stack without the group.
    remaining: Vector<Commit>,
}

impl GroupSplit {
    fn take(stack: &Vector<Commit>) -> Option<Self> {
        let mut remaining = stack.clone();
        let trigger = remaining.pop_back()?;

        let Some(group) = trigger.action_group().cloned() else {
            return Some(Self {
                ordered: vec![trigger.clone()],
                stacked: vec![trigger],
                remaining,
            });
        };

        let (members, rest): (Vec<Commit>, Vec<Commit>) = remaining
            .into_iter()
            .partition(|commit| commit.in_group(&group));

        let ordered = std::iter::once(trigger.clone())
            .chain(members.iter().cloned())
            .collect();
        let stacked = members
            .into_iter()
            .chain(std::iter::once(trigger))
            .collect();

        Some(Self {
            ordered,
            stacked,
            remaining: rest.into_iter().collect(),
        })
    }

    /// The commit that triggered the step.
    pub fn trigger(&self) -> Option<&Commit> {
        self.ordered.first()
    }

    /// Undo callback order: trigger first.
    pub fn ordered(&self) -> &[Commit] {
        &self.ordered
    }

    /// Chronological order. Redo replays in this order, and the group lands
    /// on the destination stack in it.
    pub fn stacked(&self) -> &[Commit] {
        &self.stacked
    }

    /// The source stack after removing the group.
    pub fn remaining(&self) -> &Vector<Commit> {
        &self.remaining
    }

    /// Number of commits in the group.
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    /// Always false; a split holds at least its trigger.
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}
