use comfygit_manifest::CustomNodeMapping;
use indexmap::IndexMap;

use crate::outcome::{NodeUserDecision, Resolution};

/// A workspace-cached table keyed by node class name → candidate package
/// ids (§4.4 step 2). The concrete cache (populated from a registry search
/// API) lives outside this crate; resolution only consumes the lookup.
pub trait NodeRegistryLookup {
    fn candidates_for(&self, node_type: &str) -> Vec<String>;
}

/// Optional fuzzy/embedding scorer (§4.4 step 3, §9 Open Question: not a
/// required dependency). Default build relies on string similarity over the
/// registry table's candidate names.
pub trait NodeMatcher {
    fn score(&self, node_type: &str, candidate_package_id: &str) -> f64;
}

/// `strsim`-based default [`NodeMatcher`]: Jaro-Winkler similarity between
/// the node type name and the candidate package id.
pub struct StrsimNodeMatcher;

impl NodeMatcher for StrsimNodeMatcher {
    fn score(&self, node_type: &str, candidate_package_id: &str) -> f64 {
        strsim::jaro_winkler(&node_type.to_ascii_lowercase(), &candidate_package_id.replace('-', "").to_ascii_lowercase())
    }
}

/// Asks the user strategy to decide among registry candidates, or supply a
/// manual identifier.
pub trait NodeUserStrategy {
    fn decide(&mut self, node_type: &str, candidates: &[String]) -> NodeUserDecision;
}

/// Non-interactive strategy (§9 "auto"): takes the resolver's own best
/// candidate (the first after any matcher reordering) and skips otherwise.
pub struct AutoNodeStrategy;

impl NodeUserStrategy for AutoNodeStrategy {
    fn decide(&mut self, _node_type: &str, candidates: &[String]) -> NodeUserDecision {
        match candidates.first() {
            Some(id) => NodeUserDecision::SelectPackage(id.clone()),
            None => NodeUserDecision::Skip,
        }
    }
}

/// Runs the four-step node resolution strategy chain (§4.4) for a single
/// custom node type found in a workflow.
pub fn resolve_node_type(
    node_type: &str,
    custom_node_map: &IndexMap<String, CustomNodeMapping>,
    registry: &dyn NodeRegistryLookup,
    matcher: Option<&dyn NodeMatcher>,
    user: &mut dyn NodeUserStrategy,
) -> Resolution<String> {
    // 1. Declared map.
    if let Some(mapping) = custom_node_map.get(node_type) {
        if mapping.is_marked_optional() {
            return Resolution::Optional;
        }
        if let Some(package_id) = mapping.package_id() {
            return Resolution::Resolved {
                value: package_id.to_string(),
                auto_resolved: false,
            };
        }
    }

    // 2. Registry mapping table.
    let mut candidates = registry.candidates_for(node_type);
    match candidates.len() {
        1 => {
            return Resolution::Resolved {
                value: candidates.remove(0),
                auto_resolved: true,
            };
        }
        n if n > 1 => {
            // 3. Optional fuzzy/embedding collaborator narrows the
            // candidate list but never auto-resolves on its own; it only
            // proposes an ambiguous set for the user strategy.
            if let Some(matcher) = matcher {
                candidates.sort_by(|a, b| {
                    matcher
                        .score(node_type, b)
                        .partial_cmp(&matcher.score(node_type, a))
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
            }
            // fall through to user strategy with the (possibly reordered)
            // ambiguous candidate set.
        }
        _ => {}
    }

    // 4. User strategy.
    match user.decide(node_type, &candidates) {
        NodeUserDecision::SelectPackage(id) => Resolution::Resolved {
            value: id,
            auto_resolved: false,
        },
        NodeUserDecision::ManualIdentifier(id) => Resolution::Resolved {
            value: id,
            auto_resolved: false,
        },
        NodeUserDecision::Optional => Resolution::Optional,
        NodeUserDecision::Skip => {
            if candidates.is_empty() {
                Resolution::Unresolved {
                    reason: format!("no registry candidates for node type `{node_type}`"),
                }
            } else {
                Resolution::Ambiguous { candidates }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedRegistry(Vec<String>);
    impl NodeRegistryLookup for FixedRegistry {
        fn candidates_for(&self, _node_type: &str) -> Vec<String> {
            self.0.clone()
        }
    }

    struct ScriptedUser(NodeUserDecision);
    impl NodeUserStrategy for ScriptedUser {
        fn decide(&mut self, _node_type: &str, _candidates: &[String]) -> NodeUserDecision {
            self.0.clone()
        }
    }

    #[test]
    fn declared_map_wins_over_registry() {
        let mut map = IndexMap::new();
        map.insert("Foo".to_string(), CustomNodeMapping::Package("bar-pack".into()));
        let registry = FixedRegistry(vec!["other-pack".into()]);
        let mut user = ScriptedUser(NodeUserDecision::Skip);
        let outcome = resolve_node_type("Foo", &map, &registry, None, &mut user);
        assert_eq!(
            outcome,
            Resolution::Resolved { value: "bar-pack".into(), auto_resolved: false }
        );
    }

    #[test]
    fn single_registry_candidate_auto_resolves() {
        let map = IndexMap::new();
        let registry = FixedRegistry(vec!["only-pack".into()]);
        let mut user = ScriptedUser(NodeUserDecision::Skip);
        let outcome = resolve_node_type("Foo", &map, &registry, None, &mut user);
        assert_eq!(
            outcome,
            Resolution::Resolved { value: "only-pack".into(), auto_resolved: true }
        );
    }

    #[test]
    fn zero_candidates_and_skip_is_unresolved() {
        let map = IndexMap::new();
        let registry = FixedRegistry(vec![]);
        let mut user = ScriptedUser(NodeUserDecision::Skip);
        let outcome = resolve_node_type("Foo", &map, &registry, None, &mut user);
        assert!(matches!(outcome, Resolution::Unresolved { .. }));
    }

    #[test]
    fn false_mapping_marks_optional() {
        let mut map = IndexMap::new();
        map.insert("Foo".to_string(), CustomNodeMapping::Optional(false));
        let registry = FixedRegistry(vec!["whatever".into()]);
        let mut user = ScriptedUser(NodeUserDecision::Skip);
        let outcome = resolve_node_type("Foo", &map, &registry, None, &mut user);
        assert_eq!(outcome, Resolution::Optional);
    }
}
