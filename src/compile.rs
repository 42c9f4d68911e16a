use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};

use tracing::{debug, warn};

use crate::types::{
    ConfigError, Couplet, CoupletId, CoupletKind, DecisionGraph, Edge, KeyConfig, PendingEdge,
    ROOT_ID, Row, Rule, RuleId, RuleSet, Value, compile_expression,
};

pub(crate) fn build_rules(rows: &[Row]) -> Result<RuleSet, ConfigError> {
    let mut rules = BTreeMap::new();
    for (i, row) in rows.iter().enumerate() {
        parse_rule_row(row)
            .and_then(|(id, rule)| insert_rule(&mut rules, id, rule))
            .map_err(|e| row_error("rule", i, row, e))?;
    }
    debug!(rules = rules.len(), "built rule set from rows");
    Ok(RuleSet::from_map(rules))
}

pub(crate) fn assemble_rules(entries: Vec<(RuleId, Rule)>) -> Result<RuleSet, ConfigError> {
    let mut rules = BTreeMap::new();
    for (id, rule) in entries {
        insert_rule(&mut rules, id, rule)?;
    }
    debug!(rules = rules.len(), "built rule set");
    Ok(RuleSet::from_map(rules))
}

fn insert_rule(
    rules: &mut BTreeMap<RuleId, Rule>,
    id: RuleId,
    rule: Rule,
) -> Result<(), ConfigError> {
    if id == 0 {
        return Err(ConfigError::InvalidRuleId {
            value: Value::Int(0),
        });
    }
    match rules.entry(id) {
        Entry::Occupied(_) => Err(ConfigError::DuplicateRule { id }),
        Entry::Vacant(slot) => {
            slot.insert(rule);
            Ok(())
        }
    }
}

fn parse_rule_row(row: &Row) -> Result<(RuleId, Rule), ConfigError> {
    let id = rule_id(required(row, "ID")?)?;
    let attribute = required_text(row, "ATTRIBUTE")?;
    let operator = required_text(row, "OPERATOR")?;
    let value = required_text(row, "VALUE")?;
    let name = required_text(row, "NAME")?;
    let comment = optional_text(row, "COMMENTS");
    let rule = Rule::new(&value, &attribute, &operator, &name, &comment)?;
    Ok((id, rule))
}

fn rule_id(value: &Value) -> Result<RuleId, ConfigError> {
    value
        .as_integer()
        .filter(|&i| i > 0)
        .and_then(|i| RuleId::try_from(i).ok())
        .ok_or_else(|| ConfigError::InvalidRuleId {
            value: value.clone(),
        })
}

pub(crate) fn build_graph(rows: &[Row], config: &KeyConfig) -> Result<DecisionGraph, ConfigError> {
    let edges = rows
        .iter()
        .enumerate()
        .map(|(i, row)| parse_key_row(row).map_err(|e| row_error("key", i, row, e)))
        .collect::<Result<Vec<_>, _>>()?;
    assemble_graph(config.description(), edges, config.check_cycles(), |i, e| {
        row_error("key", i, &rows[i], e)
    })
}

fn parse_key_row(row: &Row) -> Result<PendingEdge, ConfigError> {
    let input = couplet_id(required(row, "INPUT_COUPLET")?)?;
    let expression = expression_text(required(row, "RULES")?);
    let (target, kind) = match (row.field("OUTPUT_COUPLET"), row.field("OUTPUT_CLASS")) {
        (Some(target), None) => (target, CoupletKind::Couplet),
        (None, Some(target)) => (target, CoupletKind::Class),
        _ => return Err(ConfigError::InvalidOutputTarget),
    };
    let name = required_text(row, "OUTPUT_NAME")?;
    let output = Couplet::new(couplet_id(target)?, kind, name)
        .with_comment(optional_text(row, "COMMENTS"));
    Ok(PendingEdge {
        input,
        expression,
        output,
    })
}

fn couplet_id(value: &Value) -> Result<CoupletId, ConfigError> {
    CoupletId::from_value(value).ok_or_else(|| ConfigError::InvalidCoupletId {
        value: value.clone(),
    })
}

/// Table loaders often read a lone rule id such as `12` as the float `12.0`.
fn expression_text(value: &Value) -> String {
    match value {
        Value::Float(_) => value
            .as_integer()
            .map_or_else(|| value.as_text().into_owned(), |i| i.to_string()),
        _ => value.as_text().trim().to_owned(),
    }
}

/// Resolve declared edges into a graph.
///
/// Outputs are registered first so rows may appear in any order. `wrap`
/// attaches row context to a per-edge failure.
pub(crate) fn assemble_graph(
    description: &str,
    pending: Vec<PendingEdge>,
    check_cycles: bool,
    wrap: impl Fn(usize, ConfigError) -> ConfigError,
) -> Result<DecisionGraph, ConfigError> {
    let mut couplets = vec![Couplet::new(ROOT_ID, CoupletKind::Root, description)];
    let mut index = HashMap::from([(ROOT_ID, 0)]);
    let mut targets = Vec::with_capacity(pending.len());

    for (i, edge) in pending.iter().enumerate() {
        let id = edge.output.id();
        let target = match index.get(id) {
            Some(&n) => {
                let first = &couplets[n];
                if first.kind() != edge.output.kind() {
                    return Err(wrap(
                        i,
                        ConfigError::ConflictingCouplet {
                            id: id.clone(),
                            first: first.kind(),
                            second: edge.output.kind(),
                        },
                    ));
                }
                if first.name() != edge.output.name()
                    || first.comment() != edge.output.comment()
                {
                    warn!(couplet = %id, "couplet redeclared with another name, keeping the first");
                }
                n
            }
            None => {
                couplets.push(edge.output.clone());
                index.insert(id.clone(), couplets.len() - 1);
                couplets.len() - 1
            }
        };
        targets.push(target);
    }

    let mut outgoing = vec![Vec::new(); couplets.len()];
    let mut edges = Vec::with_capacity(pending.len());
    for (i, (edge, to)) in pending.into_iter().zip(targets).enumerate() {
        let Some(&from) = index.get(&edge.input) else {
            return Err(wrap(i, ConfigError::UndefinedInputCouplet { id: edge.input }));
        };
        if couplets[from].is_terminal() {
            return Err(wrap(i, ConfigError::ClassHasBranches { id: edge.input }));
        }
        let expression = edge.expression.trim().to_owned();
        let compiled = compile_expression(&expression);
        if let Err(err) = &compiled {
            debug!(input = %edge.input, error = %err, "edge expression does not parse");
        }
        outgoing[from].push(edges.len());
        edges.push(Edge {
            from,
            to,
            expression,
            compiled,
        });
    }

    let graph = DecisionGraph {
        couplets,
        index,
        edges,
        outgoing,
    };

    if check_cycles && let Some(cycle) = find_cycle(&graph) {
        return Err(ConfigError::CyclicKey {
            path: cycle
                .into_iter()
                .map(|n| graph.couplets[n].id().clone())
                .collect(),
        });
    }

    if let Some(node) = first_unreachable(&graph) {
        return Err(ConfigError::UnreachableCouplet {
            id: graph.couplets[node].id().clone(),
        });
    }

    debug!(
        description,
        couplets = graph.node_count(),
        edges = graph.edge_count(),
        "built decision graph"
    );
    Ok(graph)
}

fn required<'a>(row: &'a Row, field: &'static str) -> Result<&'a Value, ConfigError> {
    row.field(field).ok_or(ConfigError::MissingField { field })
}

fn required_text(row: &Row, field: &'static str) -> Result<String, ConfigError> {
    Ok(required(row, field)?.as_text().trim().to_owned())
}

fn optional_text(row: &Row, field: &str) -> String {
    row.field(field)
        .map(|v| v.as_text().trim().to_owned())
        .unwrap_or_default()
}

fn row_error(table: &'static str, row: usize, content: &Row, source: ConfigError) -> ConfigError {
    ConfigError::Row {
        table,
        row,
        content: content.to_string(),
        source: Box::new(source),
    }
}

/// Index of the first couplet with no path from the root.
fn first_unreachable(graph: &DecisionGraph) -> Option<usize> {
    let mut seen = vec![false; graph.couplets.len()];
    let mut pending = vec![0];
    seen[0] = true;
    while let Some(node) = pending.pop() {
        for &e in &graph.outgoing[node] {
            let next = graph.edges[e].to;
            if !seen[next] {
                seen[next] = true;
                pending.push(next);
            }
        }
    }
    seen.iter().position(|reached| !reached)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum DfsState {
    Unvisited,
    InStack,
    Done,
}

/// DFS over every couplet, so cycles unreachable from the root are found too.
/// Returns the cycle as couplet indices with the first repeated at the end.
fn find_cycle(graph: &DecisionGraph) -> Option<Vec<usize>> {
    let mut state = vec![DfsState::Unvisited; graph.couplets.len()];
    let mut stack = Vec::new();
    (0..graph.couplets.len()).find_map(|node| {
        if state[node] == DfsState::Unvisited {
            dfs(node, graph, &mut state, &mut stack)
        } else {
            None
        }
    })
}

fn dfs(
    node: usize,
    graph: &DecisionGraph,
    state: &mut [DfsState],
    stack: &mut Vec<usize>,
) -> Option<Vec<usize>> {
    state[node] = DfsState::InStack;
    stack.push(node);

    for &e in &graph.outgoing[node] {
        let next = graph.edges[e].to;
        match state[next] {
            DfsState::InStack => {
                let pos = stack.iter().position(|&n| n == next).unwrap_or(0);
                let mut cycle = stack[pos..].to_vec();
                cycle.push(next);
                return Some(cycle);
            }
            DfsState::Unvisited => {
                if let Some(cycle) = dfs(next, graph, state, stack) {
                    return Some(cycle);
                }
            }
            DfsState::Done => {}
        }
    }

    stack.pop();
    state[node] = DfsState::Done;
    None
}
