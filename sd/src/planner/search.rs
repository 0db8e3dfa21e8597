//! File search - materialize a plan's step list from a resolved query

use std::io;
use std::path::{Path, PathBuf};

use grep_matcher::Matcher;
use grep_regex::{RegexMatcher, RegexMatcherBuilder};
use grep_searcher::sinks::Lossy;
use grep_searcher::{BinaryDetection, Searcher, SearcherBuilder};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use super::{PlannerError, ResolvedQuery};
use crate::config::SearchConfig;

/// Finds the files a plan should walk, in a stable order
pub trait FileSearch: Send + Sync {
    fn search(&self, query: &ResolvedQuery) -> Result<Vec<PathBuf>, PlannerError>;
}

/// Directory walk filtered by glob patterns and keywords
///
/// A file qualifies when it matches any pattern (by file name or by path
/// relative to the search root) and, if keywords are given, any keyword
/// appears case-insensitively in its name or contents.
#[derive(Debug, Clone)]
pub struct WalkdirSearch {
    max_results: usize,
    follow_links: bool,
    include_hidden: bool,
}

impl WalkdirSearch {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            max_results: config.max_results,
            follow_links: config.follow_links,
            include_hidden: config.include_hidden,
        }
    }
}

impl Default for WalkdirSearch {
    fn default() -> Self {
        Self::new(&SearchConfig::default())
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_str().is_some_and(|name| name.starts_with('.'))
}

/// Case-insensitive any-of match over a set of keywords
struct KeywordMatcher {
    matcher: RegexMatcher,
    searcher: Searcher,
}

impl KeywordMatcher {
    /// `None` when there are no keywords to filter on
    fn new(keywords: &[String]) -> Result<Option<Self>, PlannerError> {
        let literals: Vec<String> = keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .map(regex::escape)
            .collect();
        if literals.is_empty() {
            return Ok(None);
        }

        let matcher = RegexMatcherBuilder::new()
            .case_insensitive(true)
            .build(&literals.join("|"))
            .map_err(|e| PlannerError::InvalidResolution(format!("Invalid keywords: {}", e)))?;
        let searcher = SearcherBuilder::new()
            .binary_detection(BinaryDetection::quit(b'\x00'))
            .build();

        Ok(Some(Self { matcher, searcher }))
    }

    /// True when a keyword appears in the file name or any line of the file
    ///
    /// Contents are streamed and decoded lossily, so stray non-UTF-8 bytes
    /// do not hide a match. Unreadable files can only match by name.
    fn matches(&mut self, path: &Path) -> bool {
        let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        if self.matcher.is_match(name.as_bytes()).unwrap_or(false) {
            return true;
        }

        let mut hit = false;
        let result = self.searcher.search_path(
            &self.matcher,
            path,
            Lossy(|_line_num, _line| -> Result<bool, io::Error> {
                hit = true;
                Ok(false)
            }),
        );
        if let Err(e) = result {
            debug!(path = %path.display(), error = %e, "KeywordMatcher::matches: skipping file");
        }
        hit
    }
}

impl FileSearch for WalkdirSearch {
    fn search(&self, query: &ResolvedQuery) -> Result<Vec<PathBuf>, PlannerError> {
        debug!(?query, "WalkdirSearch::search: called");
        let root = PathBuf::from(&query.search_path);
        if !root.is_dir() {
            return Err(PlannerError::Search(format!(
                "Search path is not a directory: {}",
                root.display()
            )));
        }

        let patterns = query
            .file_patterns
            .iter()
            .map(|p| {
                glob::Pattern::new(p)
                    .map_err(|e| PlannerError::InvalidResolution(format!("Invalid file pattern '{}': {}", p, e)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut keywords = KeywordMatcher::new(&query.keywords)?;

        let include_hidden = self.include_hidden;
        let walker = WalkDir::new(&root)
            .follow_links(self.follow_links)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |e| e.depth() == 0 || include_hidden || !is_hidden(e));

        let mut found = Vec::new();
        for entry in walker.filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let relative = path.strip_prefix(&root).unwrap_or(path);
            let name = entry.file_name().to_string_lossy();
            let pattern_hit =
                patterns.is_empty() || patterns.iter().any(|p| p.matches(&name) || p.matches_path(relative));

            if !pattern_hit {
                continue;
            }

            if keywords.as_mut().is_none_or(|k| k.matches(path)) {
                found.push(path.to_path_buf());
                if found.len() >= self.max_results {
                    debug!(max_results = self.max_results, "WalkdirSearch::search: max results reached");
                    break;
                }
            }
        }

        debug!(count = found.len(), "WalkdirSearch::search: done");
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn tree() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("app/models")).unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::write(root.join("app/main.py"), "import flask\n").unwrap();
        fs::write(root.join("app/models/user.py"), "class User: pass\n").unwrap();
        fs::write(root.join("app/models/order.py"), "class Order: pass\n").unwrap();
        fs::write(root.join("app/README.md"), "docs\n").unwrap();
        fs::write(root.join(".git/config.py"), "hidden\n").unwrap();
        fs::write(root.join(".env.py"), "hidden\n").unwrap();
        temp
    }

    fn query(root: &Path, patterns: &[&str], keywords: &[&str]) -> ResolvedQuery {
        ResolvedQuery {
            search_path: root.to_string_lossy().to_string(),
            file_patterns: patterns.iter().map(|s| s.to_string()).collect(),
            keywords: keywords.iter().map(|s| s.to_string()).collect(),
            output_filename: String::new(),
        }
    }

    fn names(root: &Path, paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_glob_by_file_name_sorted() {
        let temp = tree();
        let found = WalkdirSearch::default().search(&query(temp.path(), &["*.py"], &[])).unwrap();
        assert_eq!(
            names(temp.path(), &found),
            vec!["app/main.py", "app/models/order.py", "app/models/user.py"]
        );
    }

    #[test]
    fn test_glob_by_relative_path() {
        let temp = tree();
        let found = WalkdirSearch::default()
            .search(&query(temp.path(), &["app/models/*"], &[]))
            .unwrap();
        assert_eq!(names(temp.path(), &found), vec!["app/models/order.py", "app/models/user.py"]);
    }

    #[test]
    fn test_keywords_match_name_or_content() {
        let temp = tree();
        let found = WalkdirSearch::default()
            .search(&query(temp.path(), &["*.py"], &["FLASK", "order"]))
            .unwrap();
        assert_eq!(names(temp.path(), &found), vec!["app/main.py", "app/models/order.py"]);
    }

    #[test]
    fn test_keywords_match_files_with_invalid_utf8() {
        let temp = tree();
        fs::write(temp.path().join("app/legacy.py"), b"# caf\xe9\nimport flask\n").unwrap();

        let found = WalkdirSearch::default()
            .search(&query(temp.path(), &["*.py"], &["flask"]))
            .unwrap();
        assert_eq!(names(temp.path(), &found), vec!["app/legacy.py", "app/main.py"]);
    }

    #[test]
    fn test_keywords_are_literal_not_regex() {
        let temp = tree();
        fs::write(temp.path().join("app/calc.py"), "total = a+b\n").unwrap();

        let found = WalkdirSearch::default()
            .search(&query(temp.path(), &["*.py"], &["a+b"]))
            .unwrap();
        assert_eq!(names(temp.path(), &found), vec!["app/calc.py"]);
    }

    #[test]
    fn test_binary_files_do_not_match_on_content() {
        let temp = tree();
        fs::write(temp.path().join("app/blob.py"), b"\x00\x01flask\x00").unwrap();

        let found = WalkdirSearch::default()
            .search(&query(temp.path(), &["*.py"], &["flask"]))
            .unwrap();
        assert_eq!(names(temp.path(), &found), vec!["app/main.py"]);
    }

    #[test]
    fn test_hidden_entries_included_on_request() {
        let temp = tree();
        let config = SearchConfig {
            include_hidden: true,
            ..Default::default()
        };
        let found = WalkdirSearch::new(&config)
            .search(&query(temp.path(), &["*.py"], &["hidden"]))
            .unwrap();
        assert_eq!(names(temp.path(), &found), vec![".env.py", ".git/config.py"]);
    }

    #[test]
    fn test_max_results_truncates() {
        let temp = tree();
        let config = SearchConfig {
            max_results: 2,
            ..Default::default()
        };
        let found = WalkdirSearch::new(&config).search(&query(temp.path(), &[], &[])).unwrap();
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_missing_root_fails() {
        let temp = tree();
        let err = WalkdirSearch::default()
            .search(&query(&temp.path().join("nope"), &["*"], &[]))
            .unwrap_err();
        assert!(matches!(err, PlannerError::Search(_)));
    }

    #[test]
    fn test_invalid_pattern_fails() {
        let temp = tree();
        let err = WalkdirSearch::default()
            .search(&query(temp.path(), &["[unclosed"], &[]))
            .unwrap_err();
        assert!(matches!(err, PlannerError::InvalidResolution(_)));
    }
}
