//! Plugin dependency resolution for the enabled-plugins setting

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{BTreeSet, HashMap, VecDeque};

use crate::prelude::*;

pub trait PluginResolver: Send + Sync {
	/// Expand `names` with their transitive dependencies, dependencies first
	fn toposorted_plugins(&self, names: &[String]) -> ClResult<Vec<String>>;
}

/// Static catalog of installed plugins and the plugins each depends on
#[derive(Debug, Default, Clone)]
pub struct PluginCatalog {
	plugins: HashMap<String, Vec<String>>,
}

impl PluginCatalog {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add(&mut self, name: impl Into<String>, dependencies: &[&str]) -> &mut Self {
		self.plugins.insert(name.into(), dependencies.iter().map(|d| (*d).to_string()).collect());
		self
	}

	pub fn contains(&self, name: &str) -> bool {
		self.plugins.contains_key(name)
	}

	pub fn len(&self) -> usize {
		self.plugins.len()
	}

	pub fn is_empty(&self) -> bool {
		self.plugins.is_empty()
	}

	/// Every known plugin reachable from `names`
	fn closure(&self, names: &[String]) -> BTreeSet<String> {
		let mut found = BTreeSet::new();
		let mut queue: VecDeque<&str> = names.iter().map(String::as_str).collect();

		while let Some(name) = queue.pop_front() {
			if found.contains(name) {
				continue;
			}
			let Some(deps) = self.plugins.get(name) else {
				warn!("Ignoring unknown plugin {}", name);
				continue;
			};
			found.insert(name.to_string());
			queue.extend(deps.iter().map(String::as_str));
		}
		found
	}
}

impl PluginResolver for PluginCatalog {
	fn toposorted_plugins(&self, names: &[String]) -> ClResult<Vec<String>> {
		let enabled = self.closure(names);

		let mut graph = DiGraph::<&str, ()>::new();
		let nodes: HashMap<&str, NodeIndex> =
			enabled.iter().map(|name| (name.as_str(), graph.add_node(name.as_str()))).collect();

		for name in &enabled {
			let deps = self.plugins.get(name).map(Vec::as_slice).unwrap_or_default();
			for dep in deps {
				if let (Some(&from), Some(&to)) = (nodes.get(dep.as_str()), nodes.get(name.as_str())) {
					graph.add_edge(from, to, ());
				}
			}
		}

		let sorted = toposort(&graph, None).map_err(|cycle| {
			Error::invalid_value(format!(
				"Plugin dependency cycle involving {}.",
				graph[cycle.node_id()]
			))
		})?;

		Ok(sorted.into_iter().map(|idx| graph[idx].to_string()).collect())
	}
}


// vim: ts=4
