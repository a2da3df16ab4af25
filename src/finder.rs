use nucleo_matcher::pattern::{CaseMatching, Normalization, Pattern};
use nucleo_matcher::{Config, Matcher, Utf32Str};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::state::AppContext;

/// Leading string that routes a quick-open query to the project finder
/// instead of the host's other search handlers.
pub const ACTIVATION_PREFIX: &str = ":";

/// Port for opening a selected project; the host decides what "open"
/// means (switch project, print the path, spawn an editor).
pub trait ProjectOpener {
    fn open(&self, path: &Path);
}

/// Filters the indexed project list against a live query string.
///
/// Stateless across calls apart from reading the shared project list, so a
/// query issued mid-scan simply sees whatever has been discovered so far.
pub struct ProjectFinder {
    ctx: Arc<AppContext>,
    opener: Box<dyn ProjectOpener>,
}

impl ProjectFinder {
    pub fn new(ctx: Arc<AppContext>, opener: Box<dyn ProjectOpener>) -> Self {
        Self { ctx, opener }
    }

    /// True iff the query is addressed to this finder.
    pub fn matches_activation(&self, query: &str) -> bool {
        query.starts_with(ACTIVATION_PREFIX)
    }

    /// Return every project matching the query, in discovery order.
    ///
    /// Exactly the activation prefix's length is stripped from the front of
    /// the query before handing the pattern to `match_fn`; the match
    /// predicate itself is the caller's concern.
    pub fn search<F>(&self, query: &str, match_fn: F) -> Vec<PathBuf>
    where
        F: Fn(&str, &str) -> bool,
    {
        let pattern = query.get(ACTIVATION_PREFIX.len()..).unwrap_or("");
        let projects = self.ctx.projects().snapshot();
        projects
            .into_iter()
            .filter(|path| match_fn(&path.to_string_lossy(), pattern))
            .collect()
    }

    /// Hand the chosen path to the host. Failure to open is the host's
    /// concern; nothing is reported back.
    pub fn select(&self, path: &Path) {
        debug!(project = %path.display(), "project selected");
        self.opener.open(path);
    }
}

/// Default match predicate: nucleo's path-tuned fuzzy matching with smart
/// case handling. The empty pattern matches everything.
pub fn fuzzy_match(candidate: &str, pattern: &str) -> bool {
    if pattern.is_empty() {
        return true;
    }
    let mut matcher = Matcher::new(Config::DEFAULT.match_paths());
    let pattern = Pattern::parse(pattern, CaseMatching::Smart, Normalization::Smart);
    let mut haystack_buf = Vec::new();
    let haystack = Utf32Str::new(candidate, &mut haystack_buf);
    pattern.score(haystack.slice(..), &mut matcher).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::sync::Mutex;

    struct RecordingOpener(Mutex<Vec<PathBuf>>);

    impl ProjectOpener for Arc<RecordingOpener> {
        fn open(&self, path: &Path) {
            self.0.lock().unwrap().push(path.to_path_buf());
        }
    }

    struct NullOpener;

    impl ProjectOpener for NullOpener {
        fn open(&self, _path: &Path) {}
    }

    fn finder_with_projects(paths: &[&str]) -> ProjectFinder {
        let ctx = Arc::new(AppContext::new(Config::default()));
        for path in paths {
            ctx.projects().insert(PathBuf::from(path));
        }
        ProjectFinder::new(ctx, Box::new(NullOpener))
    }

    #[test]
    fn test_matches_activation() {
        let finder = finder_with_projects(&[]);
        assert!(finder.matches_activation(":proj"));
        assert!(finder.matches_activation(":"));
        assert!(!finder.matches_activation("proj"));
        assert!(!finder.matches_activation(""));
        assert!(!finder.matches_activation("x:proj"));
    }

    #[test]
    fn test_search_strips_prefix_and_filters_with_substring_matcher() {
        let finder = finder_with_projects(&["/home/projects/foo", "/home/work/bar"]);

        let results = finder.search(":proj", |candidate, pattern| candidate.contains(pattern));

        assert_eq!(results, vec![PathBuf::from("/home/projects/foo")]);
    }

    #[test]
    fn test_search_preserves_discovery_order() {
        let finder = finder_with_projects(&["/z/repo", "/a/repo", "/m/repo"]);

        let results = finder.search(":repo", |candidate, pattern| candidate.contains(pattern));

        assert_eq!(
            results,
            vec![
                PathBuf::from("/z/repo"),
                PathBuf::from("/a/repo"),
                PathBuf::from("/m/repo"),
            ]
        );
    }

    #[test]
    fn test_search_bare_prefix_returns_everything() {
        let finder = finder_with_projects(&["/one", "/two"]);

        let results = finder.search(":", fuzzy_match);

        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_search_no_matches_is_empty_not_error() {
        let finder = finder_with_projects(&["/one", "/two"]);

        let results = finder.search(":zzz", fuzzy_match);

        assert!(results.is_empty());
    }

    #[test]
    fn test_select_delegates_to_opener() {
        let ctx = Arc::new(AppContext::new(Config::default()));
        let opener = Arc::new(RecordingOpener(Mutex::new(Vec::new())));
        let finder = ProjectFinder::new(ctx, Box::new(opener.clone()));

        finder.select(Path::new("/home/projects/foo"));

        assert_eq!(
            *opener.0.lock().unwrap(),
            vec![PathBuf::from("/home/projects/foo")]
        );
    }

    #[test]
    fn test_fuzzy_match_default_predicate() {
        assert!(fuzzy_match("/home/projects/foo", "pjf"));
        assert!(fuzzy_match("/home/projects/foo", "projects"));
        // Smart case: a lowercase pattern matches regardless of case
        assert!(fuzzy_match("/Home/Projects/Foo", "hpf"));
        assert!(fuzzy_match("/home/projects/foo", ""));
        assert!(!fuzzy_match("/home/projects/foo", "bar"));
        // Pattern characters must appear in candidate order
        assert!(!fuzzy_match("/home/projects/foo", "fjp"));
    }
}
