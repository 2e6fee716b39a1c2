//! Graph-pattern AST and the path-merge algorithm.
//!
//! All paths share the source model and each is a shortest path, so a model
//! name found at the same depth in two paths denotes the same pattern node.
//! Merging therefore only has to find, per path, the first depth no earlier
//! path covers and emit the rest of that path as a new fragment hanging off
//! the last shared node.

use std::collections::{BTreeMap, HashSet};

use crate::error::{MetagraphError, MetagraphResult};
use crate::query::path::{Path, Waypoint};

/// Label of schema model nodes.
pub const MODEL_LABEL: &str = "Model";

/// Label of record nodes.
pub const RECORD_LABEL: &str = "Record";

/// Edge type tying a record to its model.
pub const INSTANCE_OF: &str = "@INSTANCE_OF";

/// A node position in a pattern fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodePattern {
    /// A model node matched by id, e.g. `(m0:Model {id: $model_0})`.
    Model { var: String, id_param: String },
    /// First occurrence of a record variable, e.g. `(r1:Record)`.
    Record { var: String },
    /// A record variable declared earlier in the pattern, e.g. `(r1)`.
    Bound { var: String },
}

impl NodePattern {
    pub fn var(&self) -> &str {
        match self {
            Self::Model { var, .. } | Self::Record { var } | Self::Bound { var } => var,
        }
    }
}

/// Which way an edge points, read left to right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Either,
}

/// An edge position in a pattern fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgePattern {
    pub relationship_type: String,
    pub direction: Direction,
}

impl EdgePattern {
    /// `(model)<-[:@INSTANCE_OF]-(record)`
    pub fn instance_of_from_model() -> Self {
        Self {
            relationship_type: INSTANCE_OF.to_string(),
            direction: Direction::Left,
        }
    }

    /// `(record)-[:@INSTANCE_OF]->(model)`
    pub fn instance_of_to_model() -> Self {
        Self {
            relationship_type: INSTANCE_OF.to_string(),
            direction: Direction::Right,
        }
    }

    /// Record-to-record edge of a schema relationship; shortest paths are
    /// searched without direction, so the edge is matched either way.
    pub fn schema(relationship_type: &str) -> Self {
        Self {
            relationship_type: relationship_type.to_string(),
            direction: Direction::Either,
        }
    }
}

/// One comma-separated chain of the pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub start: NodePattern,
    pub steps: Vec<(EdgePattern, NodePattern)>,
}

impl Fragment {
    pub fn new(start: NodePattern) -> Self {
        Self {
            start,
            steps: Vec::new(),
        }
    }

    pub fn push(&mut self, edge: EdgePattern, node: NodePattern) {
        self.steps.push((edge, node));
    }

    /// Every node of the fragment, in order.
    pub fn nodes(&self) -> impl Iterator<Item = &NodePattern> {
        std::iter::once(&self.start).chain(self.steps.iter().map(|(_, node)| node))
    }
}

/// The merged pattern: fragments plus the variable table built while merging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphPattern {
    fragments: Vec<Fragment>,
    record_vars: BTreeMap<String, String>,
    model_ids: BTreeMap<String, String>,
    source_model: String,
}

impl GraphPattern {
    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// Variable bound to records of `model`, if the pattern reaches it.
    pub fn record_var(&self, model: &str) -> Option<&str> {
        self.record_vars.get(model).map(String::as_str)
    }

    /// Variable bound to records of the source model.
    pub fn source_var(&self) -> &str {
        self.record_vars
            .get(&self.source_model)
            .map(String::as_str)
            .unwrap_or(SOURCE_RECORD_VAR)
    }

    pub fn source_model(&self) -> &str {
        &self.source_model
    }

    /// `id_param -> model id` for every anchored model node.
    pub fn model_id_params(&self) -> &BTreeMap<String, String> {
        &self.model_ids
    }

    /// How many times a record of `model` is declared (not merely referenced).
    pub fn declarations_of(&self, model: &str) -> usize {
        let Some(var) = self.record_var(model) else {
            return 0;
        };
        self.fragments
            .iter()
            .flat_map(Fragment::nodes)
            .filter(|node| matches!(node, NodePattern::Record { var: v } if v == var))
            .count()
    }
}

const SOURCE_RECORD_VAR: &str = "r0";

#[derive(Default)]
struct PatternBuilder {
    fragments: Vec<Fragment>,
    record_vars: BTreeMap<String, String>,
    model_ids: BTreeMap<String, String>,
    anchored: HashSet<String>,
    next_record: usize,
    next_model: usize,
}

impl PatternBuilder {
    fn declare_record(&mut self, model: &str) -> NodePattern {
        if let Some(var) = self.record_vars.get(model) {
            return NodePattern::Bound { var: var.clone() };
        }
        let var = format!("r{}", self.next_record);
        self.next_record += 1;
        self.record_vars.insert(model.to_string(), var.clone());
        NodePattern::Record { var }
    }

    fn declare_model(&mut self, waypoint: &Waypoint) -> NodePattern {
        let n = self.next_model;
        self.next_model += 1;
        let id_param = format!("model_{n}");
        self.model_ids.insert(id_param.clone(), waypoint.model_id.clone());
        self.anchored.insert(waypoint.model_name.clone());
        NodePattern::Model {
            var: format!("m{n}"),
            id_param,
        }
    }

    fn bound(&self, model: &str) -> MetagraphResult<NodePattern> {
        self.record_vars
            .get(model)
            .map(|var| NodePattern::Bound { var: var.clone() })
            .ok_or_else(|| MetagraphError::decode(format!("model '{model}' used before it was bound")))
    }

    /// Tie the last node of `fragment` to its model unless that model is
    /// already anchored somewhere in the pattern.
    fn anchor_leaf(&mut self, fragment: &mut Fragment, leaf: &Waypoint) {
        if self.anchored.contains(&leaf.model_name) {
            return;
        }
        let model = self.declare_model(leaf);
        fragment.push(EdgePattern::instance_of_to_model(), model);
    }
}

/// Merge `paths` (all rooted at `source`) into one pattern.
///
/// With no paths the result is the base clause only: the source model node
/// joined to one source record binding.
pub fn merge_paths(source: &Waypoint, paths: &[Path]) -> MetagraphResult<GraphPattern> {
    let mut builder = PatternBuilder::default();

    let model = builder.declare_model(source);
    let record = builder.declare_record(&source.model_name);
    let mut base = Fragment::new(model);
    base.push(EdgePattern::instance_of_from_model(), record);
    builder.fragments.push(base);

    for (i, path) in paths.iter().enumerate() {
        if path.source().model_name != source.model_name {
            return Err(MetagraphError::decode(format!(
                "path rooted at '{}' while querying '{}'",
                path.source().model_name,
                source.model_name
            )));
        }

        let earlier = &paths[..i];
        let waypoints = path.waypoints();

        // First depth no earlier path covers with the same model.
        let mut depth = 1;
        while depth < waypoints.len()
            && earlier
                .iter()
                .any(|p| p.model_at(depth) == Some(waypoints[depth].model_name.as_str()))
        {
            depth += 1;
        }

        let mut fragment = Fragment::new(builder.bound(&waypoints[depth - 1].model_name)?);
        for d in depth..waypoints.len() {
            let node = builder.declare_record(&waypoints[d].model_name);
            fragment.push(EdgePattern::schema(&path.hops()[d - 1]), node);
        }
        // A fully covered path may still leave its leaf without a model anchor.
        builder.anchor_leaf(&mut fragment, path.target());

        if fragment.steps.is_empty() {
            continue;
        }
        if i == 0 {
            // The first path continues the base clause.
            builder.fragments[0].steps.extend(fragment.steps);
        } else {
            builder.fragments.push(fragment);
        }
    }

    Ok(GraphPattern {
        fragments: builder.fragments,
        record_vars: builder.record_vars,
        model_ids: builder.model_ids,
        source_model: source.model_name.clone(),
    })
}
