use std::collections::HashMap;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use indexmap::IndexMap;
use serde_json::Value;

use super::{NodeResults, QueryBatch, Responder, SearchClient};
use crate::error::QueryError;
use crate::parameters::{NumericOperator, SearchParameters};
use crate::results::{FacetStats, SearchResults};
use crate::state::LatLng;

const DEFAULT_HITS_PER_PAGE: u32 = 20;

type Records = Arc<HashMap<String, Vec<Value>>>;

enum ClientCommand {
    Search {
        batch: QueryBatch,
        responder: Responder,
    },
    Shutdown,
}

/// In-process client answering batches from JSON records on a worker thread.
pub struct MemoryClient {
    tx: Sender<ClientCommand>,
    worker: Option<JoinHandle<()>>,
}

impl MemoryClient {
    /// Spawn the worker over records keyed by index name.
    #[must_use]
    pub fn spawn(indices: HashMap<String, Vec<Value>>) -> Self {
        let (tx, rx) = mpsc::channel();
        let records: Records = Arc::new(indices);
        let worker = thread::spawn(move || worker_loop(&records, &rx));
        Self {
            tx,
            worker: Some(worker),
        }
    }
}

impl SearchClient for MemoryClient {
    fn search(&mut self, batch: QueryBatch, responder: Responder) {
        if let Err(mpsc::SendError(command)) = self.tx.send(ClientCommand::Search { batch, responder }) {
            if let ClientCommand::Search { responder, .. } = command {
                responder.reject(QueryError::Client("search worker has stopped".into()));
            }
        }
    }
}

impl Drop for MemoryClient {
    fn drop(&mut self) {
        let _ = self.tx.send(ClientCommand::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn worker_loop(records: &Records, rx: &Receiver<ClientCommand>) {
    while let Ok(command) = rx.recv() {
        match command {
            ClientCommand::Search { batch, responder } => {
                tracing::debug!(batch = batch.id, queries = batch.queries.len(), "executing batch");
                let results = batch
                    .queries
                    .iter()
                    .map(|query| NodeResults {
                        node: query.node,
                        results: execute(
                            records
                                .get(query.parameters.index())
                                .map(Vec::as_slice)
                                .unwrap_or_default(),
                            &query.parameters,
                        ),
                    })
                    .collect();
                responder.resolve(results);
            }
            ClientCommand::Shutdown => break,
        }
    }
}

/// Run `params` against `records`.
#[must_use]
pub fn execute(records: &[Value], params: &SearchParameters) -> SearchResults {
    let started = Instant::now();
    let optional = parse_optional_filters(params.optional_filters());

    let mut matched: Vec<(i64, &Value)> = records
        .iter()
        .filter(|record| matches(record, params, None))
        .map(|record| (optional_score(record, &optional), record))
        .collect();
    matched.sort_by(|a, b| b.0.cmp(&a.0));

    let hits_per_page = params.hits_per_page().unwrap_or(DEFAULT_HITS_PER_PAGE).max(1);
    let page = params.page().unwrap_or(0);
    let nb_hits = matched.len();
    let nb_pages = u32::try_from(nb_hits.div_ceil(hits_per_page as usize)).unwrap_or(u32::MAX);
    let hits = matched
        .iter()
        .skip(page as usize * hits_per_page as usize)
        .take(hits_per_page as usize)
        .map(|(_, record)| (*record).clone())
        .collect();

    let mut facets = IndexMap::new();
    let mut facets_stats = IndexMap::new();
    for attribute in params.facets() {
        let pool = records.iter().filter(|record| matches(record, params, None));
        facets.insert(attribute.clone(), count_values(pool, attribute));
    }
    for attribute in params.disjunctive_facets() {
        let pool = records
            .iter()
            .filter(|record| matches(record, params, Some(attribute)));
        facets.insert(attribute.clone(), count_values(pool.clone(), attribute));
        if let Some(stats) = numeric_stats(pool, attribute) {
            facets_stats.insert(attribute.clone(), stats);
        }
    }
    for facet in params.hierarchical_facets() {
        for attribute in &facet.attributes {
            let pool = records.iter().filter(|record| matches(record, params, None));
            facets.insert(attribute.clone(), count_values(pool, attribute));
        }
    }

    SearchResults {
        index: params.index().to_string(),
        query: params.query().to_string(),
        hits,
        nb_hits,
        page,
        nb_pages,
        hits_per_page,
        facets,
        facets_stats,
        processing_time_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
    }
}

/// Whether `record` passes every refinement of `params`.
///
/// `skip_disjunctive` ignores the refinements of one disjunctive facet so its
/// own counts stay available while it is refined.
fn matches(record: &Value, params: &SearchParameters, skip_disjunctive: Option<&str>) -> bool {
    matches_query(record, params.query())
        && params
            .all_facet_refinements()
            .all(|(attribute, values)| values.iter().all(|value| has_value(record, attribute, value)))
        && params
            .all_disjunctive_refinements()
            .filter(|(attribute, _)| Some(*attribute) != skip_disjunctive)
            .all(|(attribute, values)| {
                values.is_empty() || values.iter().any(|value| has_value(record, attribute, value))
            })
        && params.all_hierarchical_refinements().all(|(name, path)| {
            params.hierarchical_facet(name).is_none_or(|facet| {
                let depth = path.split(facet.separator.as_str()).count();
                facet
                    .attributes
                    .get(depth - 1)
                    .is_some_and(|attribute| has_value(record, attribute, path))
            })
        })
        && params.all_numeric_refinements().all(|(attribute, operators)| {
            let Some(value) = lookup(record, attribute).and_then(Value::as_f64) else {
                return false;
            };
            operators
                .iter()
                .all(|(operator, bounds)| bounds.iter().all(|bound| operator.matches(value, *bound)))
        })
        && params.inside_bounding_box().is_none_or(|bounding_box| {
            geoloc(record).is_some_and(|point| bounding_box.contains(point))
        })
        && params.filters().is_none_or(|filters| matches_filters(record, filters))
}

fn matches_query(record: &Value, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    needle
        .split_whitespace()
        .all(|word| contains_text(record, word))
}

fn contains_text(value: &Value, word: &str) -> bool {
    match value {
        Value::String(text) => text.to_lowercase().contains(word),
        Value::Array(items) => items.iter().any(|item| contains_text(item, word)),
        Value::Object(fields) => fields
            .iter()
            .filter(|(key, _)| !key.starts_with('_'))
            .any(|(_, field)| contains_text(field, word)),
        _ => false,
    }
}

/// `attr:value` clauses joined by ` AND `, each optionally prefixed with `NOT `.
fn matches_filters(record: &Value, filters: &str) -> bool {
    filters.split(" AND ").all(|clause| {
        let clause = clause.trim();
        let (negated, clause) = match clause.strip_prefix("NOT ") {
            Some(rest) => (true, rest.trim()),
            None => (false, clause),
        };
        match clause.split_once(':') {
            Some((attribute, value)) => has_value(record, attribute, value) != negated,
            None => true,
        }
    })
}

fn parse_optional_filters(filters: &[String]) -> Vec<(String, String, i64)> {
    filters
        .iter()
        .filter_map(|filter| {
            let (filter, score) = match filter.split_once("<score=") {
                Some((filter, rest)) => (
                    filter,
                    rest.trim_end_matches('>').parse::<i64>().unwrap_or(1),
                ),
                None => (filter.as_str(), 1),
            };
            let (attribute, value) = filter.split_once(':')?;
            Some((attribute.to_string(), value.to_string(), score))
        })
        .collect()
}

fn optional_score(record: &Value, optional: &[(String, String, i64)]) -> i64 {
    optional
        .iter()
        .filter(|(attribute, value, _)| has_value(record, attribute, value))
        .map(|(_, _, score)| score)
        .sum()
}

fn lookup<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(record, |value, key| value.get(key))
}

fn has_value(record: &Value, attribute: &str, expected: &str) -> bool {
    match lookup(record, attribute) {
        Some(Value::Array(items)) => items.iter().any(|item| scalar_eq(item, expected)),
        Some(value) => scalar_eq(value, expected),
        None => false,
    }
}

fn scalar_eq(value: &Value, expected: &str) -> bool {
    match value {
        Value::String(text) => text == expected,
        Value::Number(number) => number.to_string() == expected,
        Value::Bool(flag) => flag.to_string() == expected,
        _ => false,
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn count_values<'a>(
    records: impl Iterator<Item = &'a Value>,
    attribute: &str,
) -> IndexMap<String, usize> {
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for record in records {
        let values = match lookup(record, attribute) {
            Some(Value::Array(items)) => items.iter().filter_map(scalar_string).collect(),
            Some(value) => scalar_string(value).into_iter().collect(),
            None => Vec::new(),
        };
        for value in values {
            *counts.entry(value).or_default() += 1;
        }
    }
    counts.sort_by(|a_key, a_count, b_key, b_count| {
        b_count.cmp(a_count).then_with(|| a_key.cmp(b_key))
    });
    counts
}

fn numeric_stats<'a>(records: impl Iterator<Item = &'a Value>, attribute: &str) -> Option<FacetStats> {
    records
        .filter_map(|record| lookup(record, attribute).and_then(Value::as_f64))
        .fold(None, |stats: Option<FacetStats>, value| {
            Some(match stats {
                None => FacetStats { min: value, max: value },
                Some(stats) => FacetStats {
                    min: stats.min.min(value),
                    max: stats.max.max(value),
                },
            })
        })
}

fn geoloc(record: &Value) -> Option<LatLng> {
    let geoloc = record.get("_geoloc")?;
    Some(LatLng::new(
        geoloc.get("lat")?.as_f64()?,
        geoloc.get("lng")?.as_f64()?,
    ))
}
