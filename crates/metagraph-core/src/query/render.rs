//! Rendering of pattern ASTs to Cypher text.

use std::fmt::Write;

use crate::query::pattern::{Direction, EdgePattern, Fragment, GraphPattern, NodePattern, MODEL_LABEL, RECORD_LABEL};
use crate::statement::escape_identifier;

fn render_node(out: &mut String, node: &NodePattern) {
    match node {
        NodePattern::Model { var, id_param } => {
            let _ = write!(out, "({var}:{MODEL_LABEL} {{id: ${id_param}}})");
        }
        NodePattern::Record { var } => {
            let _ = write!(out, "({var}:{RECORD_LABEL})");
        }
        NodePattern::Bound { var } => {
            let _ = write!(out, "({var})");
        }
    }
}

fn render_edge(out: &mut String, edge: &EdgePattern) {
    let rel = escape_identifier(&edge.relationship_type);
    let _ = match edge.direction {
        Direction::Left => write!(out, "<-[:{rel}]-"),
        Direction::Right => write!(out, "-[:{rel}]->"),
        Direction::Either => write!(out, "-[:{rel}]-"),
    };
}

fn render_fragment(out: &mut String, fragment: &Fragment) {
    render_node(out, &fragment.start);
    for (edge, node) in &fragment.steps {
        render_edge(out, edge);
        render_node(out, node);
    }
}

/// `MATCH <fragment>, <fragment>, ...`
pub fn render_match(pattern: &GraphPattern) -> String {
    let mut out = String::from("MATCH ");
    for (i, fragment) in pattern.fragments().iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        render_fragment(&mut out, fragment);
    }
    out
}

/// `var.`property``
pub fn property_ref(var: &str, property: &str) -> String {
    format!("{var}.{}", escape_identifier(property))
}

/// Escape regex metacharacters so user text matches literally.
pub fn regex_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(
            c,
            '\\' | '.' | '+' | '*' | '?' | '(' | ')' | '|' | '[' | ']' | '{' | '}' | '^' | '$'
        ) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::path::{Path, Waypoint};
    use crate::query::pattern::merge_paths;

    #[test]
    fn test_render_base_clause() {
        let pattern = merge_paths(&Waypoint::new("id-s", "samples"), &[]).unwrap();
        assert_eq!(
            render_match(&pattern),
            "MATCH (m0:Model {id: $model_0})<-[:`@INSTANCE_OF`]-(r0:Record)"
        );
    }

    #[test]
    fn test_render_merged_paths() {
        let wp = |n: &str| Waypoint::new(format!("id-{n}"), n);
        let p1 = Path::new(
            vec![wp("samples"), wp("visits"), wp("patient")],
            vec!["SAMPLE_BELONGS_TO_VISIT".into(), "VISIT_BELONGS_TO_SUBJECT".into()],
        )
        .unwrap();
        let p2 = Path::new(
            vec![wp("samples"), wp("visits"), wp("study")],
            vec!["SAMPLE_BELONGS_TO_VISIT".into(), "VISIT_BELONGS_TO_STUDY".into()],
        )
        .unwrap();
        let pattern = merge_paths(&wp("samples"), &[p1, p2]).unwrap();
        assert_eq!(
            render_match(&pattern),
            "MATCH (m0:Model {id: $model_0})<-[:`@INSTANCE_OF`]-(r0:Record)\
             -[:`SAMPLE_BELONGS_TO_VISIT`]-(r1:Record)-[:`VISIT_BELONGS_TO_SUBJECT`]-(r2:Record)\
             -[:`@INSTANCE_OF`]->(m1:Model {id: $model_1}), \
             (r1)-[:`VISIT_BELONGS_TO_STUDY`]-(r3:Record)-[:`@INSTANCE_OF`]->(m2:Model {id: $model_2})"
        );
    }

    #[test]
    fn test_regex_escape() {
        assert_eq!(regex_escape("a.b*c"), "a\\.b\\*c");
        assert_eq!(regex_escape("(x)|y"), "\\(x\\)\\|y");
        assert_eq!(regex_escape("plain"), "plain");
    }
}
