//! Scans a node package's `requirements.txt` without executing `install.py`
//! (§4.5 step 4 / §9 Open Question).

use std::path::Path;

/// Parses requirement specifiers, skipping blank lines, comments, and `-r`/
/// `-e`/`--` option lines that would need a resolver to interpret properly.
pub fn parse_requirements(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(|line| line.split('#').next().unwrap_or("").trim())
        .filter(|line| !line.is_empty())
        .filter(|line| !line.starts_with('-'))
        .map(|line| line.to_string())
        .collect()
}

/// `None` if the package directory has no `requirements.txt`.
pub fn scan_requirements_file(package_dir: &Path) -> std::io::Result<Option<Vec<String>>> {
    let path = package_dir.join("requirements.txt");
    if !path.exists() {
        return Ok(None);
    }
    let contents = fs_err::read_to_string(&path)?;
    Ok(Some(parse_requirements(&contents)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_comments_blank_lines_and_options() {
        let contents = "\n# comment\nnumpy>=1.24\n-e ./local\nopencv-python\n  \n--no-binary :all:\n";
        let parsed = parse_requirements(contents);
        assert_eq!(parsed, vec!["numpy>=1.24".to_string(), "opencv-python".to_string()]);
    }

    #[test]
    fn inline_comment_is_stripped() {
        let parsed = parse_requirements("numpy>=1.24  # needed for arrays\n");
        assert_eq!(parsed, vec!["numpy>=1.24".to_string()]);
    }

    #[test]
    fn missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(scan_requirements_file(dir.path()).unwrap().is_none());
    }
}
