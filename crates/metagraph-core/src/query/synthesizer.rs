//! Compiles a merged pattern, filters and a projection mode into one statement.

use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::error::{MetagraphError, MetagraphResult};
use crate::query::filter::{Filter, Operator};
use crate::query::path::{Path, Waypoint};
use crate::query::pattern::{merge_paths, GraphPattern};
use crate::query::render::{property_ref, regex_escape, render_match};
use crate::statement::Statement;
use crate::value::Value;

/// Autocomplete never returns more values than this.
pub const AUTOCOMPLETE_LIMIT: u32 = 20;

/// Page size used when a caller does not ask for one.
pub const DEFAULT_LIMIT: u32 = 100;

/// Offset/limit window over an enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paging {
    pub limit: u32,
    pub offset: u32,
}

impl Default for Paging {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

/// What the synthesized statement returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryMode {
    /// Distinct source records, sorted and paged. Column: `props`.
    Enumerate,
    /// Number of distinct source records. Column: `total`.
    Count,
    /// Distinct values of a source property containing `text`, case-insensitive.
    /// Column: `value`.
    Autocomplete { property: String, text: String },
}

/// A compiled `var.property OP $param` predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub var: String,
    pub property: String,
    pub operator: Operator,
    pub param: String,
    pub value: Value,
}

impl Predicate {
    fn render(&self) -> String {
        format!(
            "{} {} ${}",
            property_ref(&self.var, &self.property),
            self.operator.as_cypher(),
            self.param
        )
    }
}

/// Pattern plus compiled filters, ready to be projected in any mode.
#[derive(Debug, Clone)]
pub struct SynthesizedQuery {
    pattern: GraphPattern,
    predicates: Vec<Predicate>,
    sort_property: String,
    paging: Paging,
}

impl SynthesizedQuery {
    /// Merge `paths` and compile `filters` against the merged pattern.
    ///
    /// Fails with `MissingSortProperty` on a blank sort property and with
    /// `PathNotFound` when a filter names a model no path reaches.
    pub fn new(
        source: &Waypoint,
        paths: &[Path],
        filters: &[Filter],
        sort_property: &str,
        paging: Paging,
    ) -> MetagraphResult<Self> {
        if sort_property.trim().is_empty() {
            return Err(MetagraphError::MissingSortProperty);
        }

        let pattern = merge_paths(source, paths)?;

        let predicates = filters
            .iter()
            .enumerate()
            .map(|(i, filter)| {
                let var = pattern.record_var(&filter.model).ok_or_else(|| {
                    MetagraphError::PathNotFound {
                        source_model: source.model_name.clone(),
                        target: filter.model.clone(),
                        max_hops: crate::query::path::MAX_HOPS,
                    }
                })?;
                Ok(Predicate {
                    var: var.to_string(),
                    property: filter.property.clone(),
                    operator: filter.operator,
                    param: format!("filter_{i}"),
                    value: filter.value.clone(),
                })
            })
            .collect::<MetagraphResult<Vec<_>>>()?;

        Ok(Self {
            pattern,
            predicates,
            sort_property: sort_property.to_string(),
            paging,
        })
    }

    pub fn pattern(&self) -> &GraphPattern {
        &self.pattern
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Render the statement for `mode`.
    pub fn statement(&self, mode: &QueryMode) -> Statement {
        let source = self.pattern.source_var();
        let mut predicates = self.predicates.clone();

        if let QueryMode::Autocomplete { property, text } = mode {
            predicates.push(Predicate {
                var: source.to_string(),
                property: property.clone(),
                operator: Operator::Matches,
                param: "autocomplete_pattern".to_string(),
                value: Value::String(format!("(?i).*{}.*", regex_escape(text))),
            });
        }

        let mut text = render_match(&self.pattern);
        for (i, predicate) in predicates.iter().enumerate() {
            text.push_str(if i == 0 { " WHERE " } else { " AND " });
            text.push_str(&predicate.render());
        }
        text.push(' ');

        let mut statement_params: Vec<(String, Value)> = self
            .pattern
            .model_id_params()
            .iter()
            .map(|(param, id)| (param.clone(), Value::from(id)))
            .collect();
        statement_params.extend(predicates.iter().map(|p| (p.param.clone(), p.value.clone())));

        match mode {
            QueryMode::Enumerate => {
                let _ = write!(
                    text,
                    "WITH DISTINCT {source} ORDER BY {} SKIP $skip LIMIT $limit RETURN properties({source}) AS props",
                    property_ref(source, &self.sort_property)
                );
                statement_params.push(("skip".into(), Value::from(self.paging.offset)));
                statement_params.push(("limit".into(), Value::from(self.paging.limit)));
            }
            QueryMode::Count => {
                let _ = write!(text, "RETURN count(DISTINCT {source}) AS total");
            }
            QueryMode::Autocomplete { property, .. } => {
                let _ = write!(
                    text,
                    "RETURN DISTINCT {} AS value LIMIT $limit",
                    property_ref(source, property)
                );
                statement_params.push(("limit".into(), Value::from(AUTOCOMPLETE_LIMIT)));
            }
        }

        statement_params
            .into_iter()
            .fold(Statement::new(text), |stmt, (k, v)| stmt.param(k, v))
    }
}
