//! Parses the three forms an install target can take (§4.5 step 1).

use crate::error::{NodeError, NodeResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeIdentifier {
    /// A bare lowercase registry id, e.g. `comfyui-impact-pack`.
    Registry(String),
    /// A VCS URL with an optional `@ref` suffix.
    Git { url: String, reference: Option<String> },
    /// A local directory name, only valid with `--dev`.
    Development(String),
}

impl NodeIdentifier {
    pub fn parse(input: &str, dev: bool) -> NodeResult<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(NodeError::UnparseableIdentifier(input.to_string()));
        }

        if dev && !looks_like_url(input) {
            return Ok(NodeIdentifier::Development(input.to_string()));
        }

        if looks_like_url(input) {
            return Ok(parse_git_spec(input));
        }

        if input.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_') {
            return Ok(NodeIdentifier::Registry(input.to_string()));
        }

        Err(NodeError::UnparseableIdentifier(input.to_string()))
    }
}

fn looks_like_url(input: &str) -> bool {
    input.starts_with("http://")
        || input.starts_with("https://")
        || input.starts_with("git@")
        || input.starts_with("ssh://")
        || input.ends_with(".git")
}

fn parse_git_spec(input: &str) -> NodeIdentifier {
    if let Some((url, reference)) = input.rsplit_once('@') {
        // Avoid splitting `git@github.com:...` on its own `@`.
        if !url.is_empty() && !url.ends_with("git") {
            return NodeIdentifier::Git { url: url.to_string(), reference: Some(reference.to_string()) };
        }
    }
    NodeIdentifier::Git { url: input.to_string(), reference: None }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_lowercase_id_is_registry() {
        assert_eq!(
            NodeIdentifier::parse("comfyui-impact-pack", false).unwrap(),
            NodeIdentifier::Registry("comfyui-impact-pack".into())
        );
    }

    #[test]
    fn https_url_with_ref_splits_on_last_at() {
        let id = NodeIdentifier::parse("https://github.com/ltdrdata/ComfyUI-Impact-Pack@v2.0", false).unwrap();
        assert_eq!(
            id,
            NodeIdentifier::Git {
                url: "https://github.com/ltdrdata/ComfyUI-Impact-Pack".into(),
                reference: Some("v2.0".into())
            }
        );
    }

    #[test]
    fn ssh_style_url_without_ref_is_not_mis_split() {
        let id = NodeIdentifier::parse("git@github.com:ltdrdata/ComfyUI-Impact-Pack.git", false).unwrap();
        assert_eq!(
            id,
            NodeIdentifier::Git { url: "git@github.com:ltdrdata/ComfyUI-Impact-Pack.git".into(), reference: None }
        );
    }

    #[test]
    fn dev_flag_treats_plain_name_as_local_directory() {
        assert_eq!(NodeIdentifier::parse("my-local-node", true).unwrap(), NodeIdentifier::Development("my-local-node".into()));
    }
}
