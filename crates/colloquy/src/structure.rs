//! Graph structures built while saving.
//!
//! The only structure so far is the [`ChoiceGraph`]: materialized dialogues
//! as nodes, resolved choices as edges. It answers which dialogues no choice
//! leads to (the starting dialogues) and which dialogues no starting dialogue
//! can ever reach.

mod choice_graph;

pub(crate) use choice_graph::ChoiceGraph;
