//! The bind graph: which component depends on which, and in what order to resolve them.

use std::collections::{BTreeMap, BTreeSet};

use kiln_core::{BindingDirective, ComponentSpec, CoreError};

use crate::error::{EngineError, EngineResult};

/// One resolved bind directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindEdge {
    /// Index of the directive within the source spec's `binds`.
    pub directive: usize,
    /// Manifest index of the target component.
    pub target: usize,
}

/// Dependencies between components, indexed by manifest position.
#[derive(Debug, Clone)]
pub struct BindGraph {
    names: Vec<String>,
    edges: Vec<Vec<BindEdge>>,
}

impl BindGraph {
    /// Resolve every directive's target and check names are unique.
    pub fn build(specs: &[ComponentSpec]) -> EngineResult<Self> {
        let mut index: BTreeMap<&str, usize> = BTreeMap::new();
        for (i, spec) in specs.iter().enumerate() {
            if index.insert(spec.name.as_str(), i).is_some() {
                return Err(EngineError::DuplicateComponent(spec.name.clone()));
            }
        }

        let mut edges = Vec::with_capacity(specs.len());
        for (source, spec) in specs.iter().enumerate() {
            let mut outgoing = Vec::with_capacity(spec.binds.len());
            for (directive, bind) in spec.binds.iter().enumerate() {
                let target = Self::resolve_target(specs, &index, source, bind)?;
                outgoing.push(BindEdge { directive, target });
            }
            edges.push(outgoing);
        }

        Ok(Self {
            names: specs.iter().map(|s| s.name.clone()).collect(),
            edges,
        })
    }

    fn resolve_target(
        specs: &[ComponentSpec],
        index: &BTreeMap<&str, usize>,
        source: usize,
        bind: &BindingDirective,
    ) -> EngineResult<usize> {
        let missing = || CoreError::CapabilityMissing {
            target: bind.target_label(),
            capability: bind.capability.clone(),
        };

        if let Some(name) = &bind.to {
            return index.get(name.as_str()).copied().ok_or_else(|| missing().into());
        }

        let Some(selector) = &bind.select else {
            return Err(missing().into());
        };
        let matches: Vec<usize> = specs
            .iter()
            .enumerate()
            .filter(|(i, spec)| *i != source && selector.matches(spec))
            .map(|(i, _)| i)
            .collect();

        match matches.as_slice() {
            [] => Err(missing().into()),
            [only] => Ok(*only),
            _ => Err(EngineError::AmbiguousTarget {
                component: specs[source].name.clone(),
                selector: selector.to_string(),
                matches: matches.iter().map(|&i| specs[i].name.clone()).collect(),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn name(&self, index: usize) -> &str {
        &self.names[index]
    }

    /// Outgoing edges of a component, in directive order.
    pub fn edges(&self, source: usize) -> &[BindEdge] {
        &self.edges[source]
    }

    fn targets(&self, source: usize) -> BTreeSet<usize> {
        self.edges[source].iter().map(|e| e.target).collect()
    }

    /// Targets before sources; ties go to the component declared first.
    pub fn topological_order(&self) -> EngineResult<Vec<usize>> {
        let n = self.names.len();
        let mut pending: Vec<usize> = (0..n).map(|i| self.targets(i).len()).collect();
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
        for source in 0..n {
            for target in self.targets(source) {
                dependents[target].push(source);
            }
        }

        let mut ready: BTreeSet<usize> = (0..n).filter(|&i| pending[i] == 0).collect();
        let mut order = Vec::with_capacity(n);
        while let Some(next) = ready.pop_first() {
            order.push(next);
            for &dependent in &dependents[next] {
                pending[dependent] -= 1;
                if pending[dependent] == 0 {
                    ready.insert(dependent);
                }
            }
        }

        if order.len() < n {
            let resolved: BTreeSet<usize> = order.iter().copied().collect();
            return Err(EngineError::CyclicDependency {
                members: self.find_cycle(&resolved),
            });
        }
        Ok(order)
    }

    /// Walk unresolved components until one repeats. Every unresolved
    /// component still has an unresolved target, so the walk always closes.
    fn find_cycle(&self, resolved: &BTreeSet<usize>) -> Vec<String> {
        let Some(start) = (0..self.names.len()).find(|i| !resolved.contains(i)) else {
            return Vec::new();
        };

        let mut path: Vec<usize> = Vec::new();
        let mut current = start;
        loop {
            if let Some(position) = path.iter().position(|&i| i == current) {
                return path[position..]
                    .iter()
                    .map(|&i| self.names[i].clone())
                    .collect();
            }
            path.push(current);
            match self
                .targets(current)
                .into_iter()
                .find(|t| !resolved.contains(t))
            {
                Some(next) => current = next,
                None => {
                    return path.iter().map(|&i| self.names[i].clone()).collect();
                }
            }
        }
    }
}
