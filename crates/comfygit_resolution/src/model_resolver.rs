use comfygit_manifest::WorkflowModelEntry;
use comfygit_model_index::ModelIndex;
use comfygit_workflow::ModelReference;
use serde::{Deserialize, Serialize};

use crate::error::ResolutionResult;
use crate::outcome::{MatchTier, ModelCandidate, ModelUserDecision, Resolution};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedModel {
    pub hash: String,
    pub relative_path: String,
}

pub trait ModelUserStrategy {
    fn decide(&mut self, reference: &ModelReference, candidates: &[ModelCandidate]) -> ModelUserDecision;
}

/// Non-interactive strategy (§9 "auto"): takes the highest-scoring candidate
/// and skips otherwise.
pub struct AutoModelStrategy;

impl ModelUserStrategy for AutoModelStrategy {
    fn decide(&mut self, _reference: &ModelReference, candidates: &[ModelCandidate]) -> ModelUserDecision {
        match candidates.first() {
            Some(candidate) => ModelUserDecision::Select(candidate.relative_path.clone()),
            None => ModelUserDecision::Skip,
        }
    }
}

/// Runs the five-step model resolution strategy chain (§4.4) for a single
/// workflow model reference.
pub fn resolve_model_reference(
    reference: &ModelReference,
    category: Option<&str>,
    existing_entries: &[WorkflowModelEntry],
    index: &ModelIndex,
    user: &mut dyn ModelUserStrategy,
) -> ResolutionResult<Resolution<ResolvedModel>> {
    // 1. Saved mapping.
    if let Some(saved) = find_saved_mapping(reference, existing_entries) {
        if let Some(hash) = &saved.hash {
            if !index.find_by_hash(hash)?.is_empty() {
                return Ok(Resolution::Resolved {
                    value: ResolvedModel {
                        hash: hash.clone(),
                        relative_path: saved
                            .nodes
                            .iter()
                            .find(|n| n.node_id == reference.node_id && n.widget_index == reference.widget_index)
                            .map(|n| n.widget_value.clone())
                            .unwrap_or_else(|| saved.filename.clone()),
                    },
                    auto_resolved: saved.auto_resolved,
                });
            }
            // Hash has no surviving location: demote to unresolved, per §4.4 step 1.
            return Ok(Resolution::Unresolved {
                reason: format!("previously resolved file for hash `{hash}` no longer exists"),
            });
        }
    }

    let basename = basename_of(&reference.widget_value);

    // 2. Exact path lookup.
    let mut exact_candidates: Vec<String> = Vec::new();
    if let Some(category) = category {
        exact_candidates.push(format!("{category}/{}", reference.widget_value));
    }
    exact_candidates.push(reference.widget_value.clone());
    for candidate_path in &exact_candidates {
        if let Some(found) = index.find_by_exact_path(candidate_path)? {
            return Ok(Resolution::Resolved {
                value: ResolvedModel { hash: found.hash, relative_path: candidate_path.clone() },
                auto_resolved: true,
            });
        }
    }

    // 3. Filename lookup.
    let by_filename = index.find_by_filename(basename)?;
    if by_filename.len() == 1 {
        let found = &by_filename[0];
        let relative_path = found
            .locations
            .first()
            .map(|l| l.relative_path.clone())
            .unwrap_or_default();
        return Ok(Resolution::Resolved {
            value: ResolvedModel { hash: found.hash.clone(), relative_path },
            auto_resolved: true,
        });
    }

    // 4. Fuzzy lookup within category.
    let mut candidates: Vec<ModelCandidate> = Vec::new();
    if let Some(category) = category {
        for model in index.get_by_category(category)? {
            for location in &model.locations {
                let score = longest_common_substring_ratio(basename, &location.filename);
                if let Some(tier) = MatchTier::from_score(score) {
                    candidates.push(ModelCandidate {
                        relative_path: location.relative_path.clone(),
                        hash: model.hash.clone(),
                        score,
                        tier,
                    });
                }
            }
        }
    }
    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    if candidates.is_empty() && by_filename.is_empty() {
        // Nothing to offer; still give the user strategy a chance to
        // provide a manual URL or mark it optional/skip.
    }

    // 5. User strategy.
    match user.decide(reference, &candidates) {
        ModelUserDecision::Select(relative_path) => {
            let hash = candidates
                .iter()
                .find(|c| c.relative_path == relative_path)
                .map(|c| c.hash.clone())
                .or_else(|| index.find_by_exact_path(&relative_path).ok().flatten().map(|m| m.hash));
            match hash {
                Some(hash) => Ok(Resolution::Resolved {
                    value: ResolvedModel { hash, relative_path },
                    auto_resolved: false,
                }),
                None => Ok(Resolution::Unresolved {
                    reason: format!("selected path `{relative_path}` is not in the model index"),
                }),
            }
        }
        ModelUserDecision::ProvideUrl { url, source_type } => {
            tracing::debug!(url, source_type, "model download intent recorded pending acquisition");
            Ok(Resolution::Unresolved {
                reason: format!("download intent recorded from {source_type} ({url})"),
            })
        }
        ModelUserDecision::Optional => Ok(Resolution::Optional),
        ModelUserDecision::Skip => {
            if candidates.is_empty() {
                Ok(Resolution::Unresolved {
                    reason: format!("no candidates found for `{}`", reference.widget_value),
                })
            } else {
                Ok(Resolution::Ambiguous {
                    candidates: candidates.into_iter().map(|c| ResolvedModel { hash: c.hash, relative_path: c.relative_path }).collect(),
                })
            }
        }
    }
}

fn find_saved_mapping<'a>(
    reference: &ModelReference,
    existing_entries: &'a [WorkflowModelEntry],
) -> Option<&'a WorkflowModelEntry> {
    existing_entries.iter().find(|entry| {
        entry
            .nodes
            .iter()
            .any(|n| n.node_id == reference.node_id && n.widget_index == reference.widget_index)
    })
}

fn basename_of(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Ratio of the longest common substring's length to the longer input's
/// length, per §4.4 step 4.
pub fn longest_common_substring_ratio(a: &str, b: &str) -> f64 {
    let a = a.to_ascii_lowercase();
    let b = b.to_ascii_lowercase();
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();
    let mut dp = vec![0usize; b_bytes.len() + 1];
    let mut best = 0usize;
    for i in 1..=a_bytes.len() {
        let mut prev_diag = 0usize;
        for j in 1..=b_bytes.len() {
            let temp = dp[j];
            if a_bytes[i - 1] == b_bytes[j - 1] {
                dp[j] = prev_diag + 1;
                best = best.max(dp[j]);
            } else {
                dp[j] = 0;
            }
            prev_diag = temp;
        }
    }
    best as f64 / a.len().max(b.len()) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lcs_ratio_identical_strings_is_one() {
        assert_eq!(longest_common_substring_ratio("sd15.safetensors", "sd15.safetensors"), 1.0);
    }

    #[test]
    fn lcs_ratio_unrelated_strings_is_low() {
        assert!(longest_common_substring_ratio("sd15.safetensors", "zzz.bin") < 0.4);
    }

    #[test]
    fn lcs_ratio_partial_overlap_lands_in_tier() {
        let score = longest_common_substring_ratio("sd15-v1.5.safetensors", "sd15-v1.0.safetensors");
        assert!(score > 0.6, "expected a good-tier match, got {score}");
    }
}
