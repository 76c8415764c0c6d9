//! Path predicates
//!
//! A [`PathPredicate`] is a boolean test over synthetic path strings. The walk
//! uses one to prune directory recursion (tested against `dir + "/"`) and a
//! second one to decide whether a detected container is opened (tested
//! against `"<format>:<path>"`). Predicates never parse the string.

use std::fmt;
use std::sync::Arc;

use globset::{Glob, GlobSet, GlobSetBuilder};
use regex::Regex;

#[derive(Clone)]
pub struct PathPredicate {
    test: Arc<dyn Fn(&str) -> bool + Send + Sync>,
    description: Arc<str>,
}

impl PathPredicate {
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self::described(f, "fn")
    }

    fn described<F>(f: F, description: impl Into<Arc<str>>) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self {
            test: Arc::new(f),
            description: description.into(),
        }
    }

    pub fn always() -> Self {
        Self::described(|_| true, "always")
    }

    pub fn never() -> Self {
        Self::described(|_| false, "never")
    }

    /// Accept paths matching any `include` glob and no `exclude` glob.
    ///
    /// An empty include list accepts nothing. Ignore-style directory patterns
    /// such as `target/` match the directory itself and everything below it.
    /// A trailing `/` on the tested path is also tried without it, so
    /// `**/.git` prunes the directory string `repo/.git/`.
    pub fn globs(include: &[String], exclude: &[String]) -> Result<Self, globset::Error> {
        let include_set = build_globset(include)?;
        let exclude_set = build_globset(exclude)?;
        let description = format!("globs(include={include:?}, exclude={exclude:?})");

        Ok(Self::described(
            move |path| {
                let trimmed = path.trim_end_matches('/');
                let matches = |set: &GlobSet| set.is_match(path) || set.is_match(trimmed);
                matches(&include_set) && !matches(&exclude_set)
            },
            description,
        ))
    }

    /// Accept every path except those matching an `exclude` glob.
    pub fn excluding(exclude: &[String]) -> Result<Self, globset::Error> {
        Self::globs(&["*".to_string()], exclude)
    }

    /// Accept paths containing a match of `pattern`.
    pub fn regex(pattern: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(pattern)?;
        let description = format!("regex({pattern})");
        Ok(Self::described(move |path| regex.is_match(path), description))
    }

    /// Look-into gate accepting `"<format>:<path>"` for the listed formats only.
    pub fn formats<S: AsRef<str>>(names: &[S]) -> Self {
        let prefixes: Vec<String> = names.iter().map(|n| format!("{}:", n.as_ref())).collect();
        let description = format!("formats({prefixes:?})");
        Self::described(
            move |candidate| prefixes.iter().any(|p| candidate.starts_with(p.as_str())),
            description,
        )
    }

    pub fn and(self, other: PathPredicate) -> Self {
        let description = format!("({} and {})", self.description, other.description);
        Self::described(move |path| self.test(path) && other.test(path), description)
    }

    pub fn or(self, other: PathPredicate) -> Self {
        let description = format!("({} or {})", self.description, other.description);
        Self::described(move |path| self.test(path) || other.test(path), description)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        let description = format!("not {}", self.description);
        Self::described(move |path| !self.test(path), description)
    }

    pub fn test(&self, path: &str) -> bool {
        (self.test)(path)
    }
}

impl Default for PathPredicate {
    fn default() -> Self {
        Self::always()
    }
}

impl fmt::Debug for PathPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PathPredicate({})", self.description)
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet, globset::Error> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        if let Some(dir) = pattern.strip_suffix('/') {
            // "target/" matches the directory and its contents
            builder.add(Glob::new(dir)?);
            builder.add(Glob::new(&format!("{dir}/**"))?);
        } else {
            builder.add(Glob::new(pattern)?);
        }
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_constant_predicates() {
        assert!(PathPredicate::always().test("/anything"));
        assert!(!PathPredicate::never().test("/anything"));
        assert!(PathPredicate::default().test(""));
    }

    #[test]
    fn test_glob_include_and_exclude() {
        let predicate =
            PathPredicate::globs(&strings(&["**/*.txt"]), &strings(&["**/skip/**"])).unwrap();

        assert!(predicate.test("/d/a.txt"));
        assert!(predicate.test("/d/b.zip!inner/x.txt"));
        assert!(!predicate.test("/d/skip/a.txt"));
        assert!(!predicate.test("/d/a.bin"));
    }

    #[test]
    fn test_empty_include_accepts_nothing() {
        let predicate = PathPredicate::globs(&[], &[]).unwrap();
        assert!(!predicate.test("zip:/d/b.zip"));
    }

    #[test]
    fn test_excluding_prunes_directory_with_trailing_slash() {
        let predicate = PathPredicate::excluding(&strings(&["**/.git", "target/"])).unwrap();

        assert!(predicate.test("/repo/src/"));
        assert!(!predicate.test("/repo/.git/"));
        assert!(!predicate.test("target/"));
        assert!(!predicate.test("target/debug/"));
    }

    #[test]
    fn test_invalid_glob_is_reported() {
        assert!(PathPredicate::globs(&strings(&["a[b"]), &[]).is_err());
    }

    #[test]
    fn test_regex_predicate() {
        let predicate = PathPredicate::regex(r"\.zip(!|$)").unwrap();
        assert!(predicate.test("/d/b.zip"));
        assert!(predicate.test("/d/b.zip!x.txt"));
        assert!(!predicate.test("/d/b.zipper"));
        assert!(PathPredicate::regex("(").is_err());
    }

    #[test]
    fn test_format_gate() {
        let predicate = PathPredicate::formats(&["zip", "gzip"]);
        assert!(predicate.test("zip:/d/b.zip"));
        assert!(predicate.test("gzip:/d/c.gz"));
        assert!(!predicate.test("tar:/d/e.tar"));
    }

    #[test]
    fn test_combinators() {
        let txt = PathPredicate::from_fn(|p| p.ends_with(".txt"));
        let nested = PathPredicate::from_fn(|p| p.contains('!'));

        let both = txt.clone().and(nested.clone());
        assert!(both.test("/d/b.zip!x.txt"));
        assert!(!both.test("/d/a.txt"));

        let either = txt.clone().or(nested);
        assert!(either.test("/d/a.txt"));
        assert!(either.test("/d/b.zip!x.bin"));

        let not_txt = txt.not();
        assert!(not_txt.test("/d/a.bin"));
        assert!(format!("{not_txt:?}").contains("not fn"));
    }
}
