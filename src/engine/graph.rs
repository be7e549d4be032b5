//! Job graph construction
//!
//! Expands job specs (including matrix fan-out) into planned instances
//! and validates the dependency relation before anything executes:
//! duplicate names, unknown dependencies and cycles are all fatal
//! [`GraphError`]s raised here, never mid-run.

use crate::pipeline::{EngineError, GraphError, JobSpec, Validate, leg_suffix};
use ahash::{AHashMap, AHashSet};

/// One planned job instance: a spec, or one matrix leg of it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedInstance {
    /// Stable instance identifier: spec name, plus axis values for legs
    pub id: String,

    /// Index of the owning spec
    pub spec_index: usize,

    /// Axis values of this leg, empty for plain jobs
    pub axes: Vec<(String, String)>,

    /// Indices of upstream instances
    pub deps: Vec<usize>,
}

/// A validated, expanded job graph
#[derive(Debug, Clone)]
pub struct JobGraph {
    specs: Vec<JobSpec>,
    instances: Vec<PlannedInstance>,
    topo: Vec<usize>,
}

impl JobGraph {
    /// Builds a graph from job specs.
    ///
    /// Validates every spec, expands matrix jobs into one instance per
    /// combination, wires dependency edges (a dependency on a matrix
    /// job fans out to all of its legs) and topologically sorts the
    /// result.
    ///
    /// # Errors
    ///
    /// Returns a [`GraphError`] for an empty set, duplicate names,
    /// unknown dependencies or a dependency cycle, and a validation
    /// error for malformed specs. Nothing executes on error.
    pub fn build(specs: Vec<JobSpec>) -> Result<Self, EngineError> {
        if specs.is_empty() {
            return Err(GraphError::Empty.into());
        }

        let mut by_name: AHashMap<&str, usize> = AHashMap::new();
        for (index, spec) in specs.iter().enumerate() {
            spec.validate()?;
            if by_name.insert(spec.name.as_str(), index).is_some() {
                return Err(GraphError::DuplicateJob {
                    name: spec.name.clone(),
                }
                .into());
            }
        }

        for spec in &specs {
            for dep in &spec.needs {
                if !by_name.contains_key(dep.as_str()) {
                    return Err(GraphError::UnknownDependency {
                        job: spec.name.clone(),
                        dependency: dep.clone(),
                    }
                    .into());
                }
            }
        }

        // Expand matrix legs; remember which instances belong to each spec.
        let mut instances = Vec::new();
        let mut legs_of: Vec<Vec<usize>> = vec![Vec::new(); specs.len()];
        for (spec_index, spec) in specs.iter().enumerate() {
            let combos = match &spec.matrix {
                Some(matrix) if !matrix.is_empty() => matrix.combinations(),
                _ => vec![vec![]],
            };
            for combo in combos {
                let id = if combo.is_empty() {
                    spec.name.clone()
                } else {
                    format!("{} ({})", spec.name, leg_suffix(&combo))
                };
                legs_of[spec_index].push(instances.len());
                instances.push(PlannedInstance {
                    id,
                    spec_index,
                    axes: combo,
                    deps: Vec::new(),
                });
            }
        }

        for index in 0..instances.len() {
            let spec = &specs[instances[index].spec_index];
            let mut deps = Vec::new();
            for dep_name in &spec.needs {
                let dep_spec = by_name[dep_name.as_str()];
                deps.extend(legs_of[dep_spec].iter().copied());
            }
            instances[index].deps = deps;
        }

        let topo = topological_sort(&specs, &instances)?;

        Ok(Self {
            specs,
            instances,
            topo,
        })
    }

    /// The job specs backing this graph, in declaration order
    #[must_use]
    pub fn specs(&self) -> &[JobSpec] {
        &self.specs
    }

    /// All planned instances, in declaration/expansion order
    #[must_use]
    pub fn instances(&self) -> &[PlannedInstance] {
        &self.instances
    }

    /// The spec owning the given instance
    #[must_use]
    pub fn spec_of(&self, instance: usize) -> &JobSpec {
        &self.specs[self.instances[instance].spec_index]
    }

    /// Instance indices in a dependency-respecting order
    #[must_use]
    pub fn topo_order(&self) -> &[usize] {
        &self.topo
    }
}

fn topological_sort(
    specs: &[JobSpec],
    instances: &[PlannedInstance],
) -> Result<Vec<usize>, GraphError> {
    let mut indegree = vec![0usize; instances.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); instances.len()];

    for (index, instance) in instances.iter().enumerate() {
        indegree[index] = instance.deps.len();
        for &dep in &instance.deps {
            dependents[dep].push(index);
        }
    }

    let mut queue: Vec<usize> = (0..instances.len()).filter(|&i| indegree[i] == 0).collect();
    let mut order = Vec::with_capacity(instances.len());

    while let Some(index) = queue.pop() {
        order.push(index);
        for &dependent in &dependents[index] {
            indegree[dependent] -= 1;
            if indegree[dependent] == 0 {
                queue.push(dependent);
            }
        }
    }

    if order.len() == instances.len() {
        return Ok(order);
    }

    // Remaining nodes form the cycle; report their spec names once each.
    let mut members: Vec<String> = Vec::new();
    let mut seen: AHashSet<&str> = AHashSet::new();
    for (index, instance) in instances.iter().enumerate() {
        if indegree[index] > 0 {
            let name = specs[instance.spec_index].name.as_str();
            if seen.insert(name) {
                members.push(name.to_string());
            }
        }
    }
    members.sort();
    Err(GraphError::Cycle { members })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{MatrixConfig, Step};

    fn job(name: &str) -> JobSpec {
        JobSpec::new(name, vec![Step::run("true")])
    }

    fn python_matrix() -> MatrixConfig {
        MatrixConfig::new().add_axis(
            "python",
            vec!["3.10".to_string(), "3.11".to_string(), "3.12".to_string()],
        )
    }

    #[test]
    fn test_build_empty_fails() {
        let err = JobGraph::build(vec![]).unwrap_err();
        assert!(matches!(err, EngineError::Graph(GraphError::Empty)));
    }

    #[test]
    fn test_build_duplicate_name_fails() {
        let err = JobGraph::build(vec![job("lint"), job("lint")]).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Graph(GraphError::DuplicateJob { .. })
        ));
    }

    #[test]
    fn test_build_unknown_dependency_fails() {
        let err = JobGraph::build(vec![job("build").needs("missing")]).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Graph(GraphError::UnknownDependency { .. })
        ));
    }

    #[test]
    fn test_build_detects_cycle() {
        let specs = vec![
            job("a").needs("c"),
            job("b").needs("a"),
            job("c").needs("b"),
        ];
        let err = JobGraph::build(specs).unwrap_err();
        match err {
            EngineError::Graph(GraphError::Cycle { members }) => {
                assert_eq!(members, vec!["a", "b", "c"]);
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_build_detects_self_cycle() {
        let err = JobGraph::build(vec![job("a").needs("a")]).unwrap_err();
        assert!(matches!(err, EngineError::Graph(GraphError::Cycle { .. })));
    }

    #[test]
    fn test_matrix_expands_to_three_instances() {
        let graph =
            JobGraph::build(vec![job("lint_test").with_matrix(python_matrix())]).unwrap();

        let ids: Vec<&str> = graph.instances().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "lint_test (python=3.10)",
                "lint_test (python=3.11)",
                "lint_test (python=3.12)"
            ]
        );
    }

    #[test]
    fn test_dependency_on_matrix_job_fans_to_all_legs() {
        let graph = JobGraph::build(vec![
            job("lint_test").with_matrix(python_matrix()),
            job("build").needs("lint_test"),
        ])
        .unwrap();

        let build = graph
            .instances()
            .iter()
            .find(|i| i.id == "build")
            .unwrap();
        assert_eq!(build.deps.len(), 3);
    }

    #[test]
    fn test_topo_order_respects_dependencies() {
        let graph = JobGraph::build(vec![
            job("lint"),
            job("build").needs("lint"),
            job("publish").needs("build"),
        ])
        .unwrap();

        let order = graph.topo_order();
        let pos = |id: &str| {
            order
                .iter()
                .position(|&i| graph.instances()[i].id == id)
                .unwrap()
        };
        assert!(pos("lint") < pos("build"));
        assert!(pos("build") < pos("publish"));
    }

    #[test]
    fn test_invalid_spec_rejected_at_build() {
        let err = JobGraph::build(vec![JobSpec::new("lint", vec![])]).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }
}
