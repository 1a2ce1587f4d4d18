//! Kahn layering with soft-weight tie-break and cycle detection (§4.8 step 4).

use std::collections::{HashMap, HashSet};

use gotn_schema::{EdgeType, Graph, GotnError, Result};

/// Build hard-dependency layers over `selected_ids`. A `hard_requires`
/// edge `A -> B` means `A` depends on `B`, so `B` must appear in an
/// earlier-or-equal layer than `A`.
///
/// Each layer holds every node whose dependencies have all been emitted in
/// a prior layer, ordered by `soft_weights` descending, ties broken by id
/// ascending. Returns [`GotnError::Cycle`] naming the residual set if the
/// hard-edge subgraph among selected nodes is not acyclic.
pub fn layer(
    graph: &Graph,
    selected_ids: &[String],
    soft_weights: &HashMap<String, f64>,
) -> Result<Vec<Vec<String>>> {
    let selected: HashSet<&str> = selected_ids.iter().map(String::as_str).collect();

    let mut in_degree: HashMap<String, usize> =
        selected_ids.iter().map(|id| (id.clone(), 0)).collect();
    let mut dependents: HashMap<String, Vec<String>> = HashMap::new();

    for edge in &graph.edges {
        if edge.edge_type != EdgeType::HardRequires {
            continue;
        }
        if !selected.contains(edge.src.as_str()) || !selected.contains(edge.dst.as_str()) {
            continue;
        }
        *in_degree.entry(edge.src.clone()).or_insert(0) += 1;
        dependents
            .entry(edge.dst.clone())
            .or_default()
            .push(edge.src.clone());
    }

    let mut unprocessed: HashSet<String> = selected_ids.iter().cloned().collect();
    let mut layers = Vec::new();

    while !unprocessed.is_empty() {
        let mut ready: Vec<String> = unprocessed
            .iter()
            .filter(|id| in_degree.get(id.as_str()).copied().unwrap_or(0) == 0)
            .cloned()
            .collect();

        if ready.is_empty() {
            let mut residual: Vec<String> = unprocessed.into_iter().collect();
            residual.sort();
            return Err(GotnError::Cycle(residual));
        }

        ready.sort_by(|a, b| {
            let weight_a = soft_weights.get(a).copied().unwrap_or(0.0);
            let weight_b = soft_weights.get(b).copied().unwrap_or(0.0);
            weight_b
                .partial_cmp(&weight_a)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.cmp(b))
        });

        for id in &ready {
            unprocessed.remove(id);
            if let Some(successors) = dependents.get(id) {
                for successor in successors {
                    if let Some(degree) = in_degree.get_mut(successor) {
                        *degree = degree.saturating_sub(1);
                    }
                }
            }
        }
        layers.push(ready);
    }

    Ok(layers)
}
