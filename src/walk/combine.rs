//! Folding child results into one parent result.
//!
//! Every combiner receives the children in their deterministic order
//! (archive order, or listing order for directories). `None` entries are
//! ordinary input: a child that produced nothing or a suppressed failure.

use std::path::Path;

pub trait ArchiveCombiner<T>: Send + Sync {
    fn combine(&self, archive_path: &str, results: Vec<Option<T>>) -> Option<T>;
}

impl<T, F> ArchiveCombiner<T> for F
where
    F: Fn(&str, Vec<Option<T>>) -> Option<T> + Send + Sync,
{
    fn combine(&self, archive_path: &str, results: Vec<Option<T>>) -> Option<T> {
        self(archive_path, results)
    }
}

/// Folds the single result of a decompressed stream.
pub trait CompressionCombiner<T>: Send + Sync {
    fn combine(&self, path: &str, result: Option<T>) -> Option<T>;
}

impl<T, F> CompressionCombiner<T> for F
where
    F: Fn(&str, Option<T>) -> Option<T> + Send + Sync,
{
    fn combine(&self, path: &str, result: Option<T>) -> Option<T> {
        self(path, result)
    }
}

pub trait DirectoryCombiner<T>: Send + Sync {
    fn combine(&self, path: &str, directory: &Path, results: Vec<Option<T>>) -> Option<T>;
}

impl<T, F> DirectoryCombiner<T> for F
where
    F: Fn(&str, &Path, Vec<Option<T>>) -> Option<T> + Send + Sync,
{
    fn combine(&self, path: &str, directory: &Path, results: Vec<Option<T>>) -> Option<T> {
        self(path, directory, results)
    }
}

/// Returns the inner result of a compressed stream unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassThrough;

impl<T> CompressionCombiner<T> for PassThrough {
    fn combine(&self, _path: &str, result: Option<T>) -> Option<T> {
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closures_fold_with_gaps() {
        let sum = |_: &str, results: Vec<Option<u64>>| Some(results.into_iter().flatten().sum());
        assert_eq!(ArchiveCombiner::combine(&sum, "/d/b.zip", vec![Some(1), None, Some(4)]), Some(5));

        let count = |_: &str, _: &Path, results: Vec<Option<u64>>| Some(results.len() as u64);
        assert_eq!(
            DirectoryCombiner::combine(&count, "/d", Path::new("/d"), vec![None, None]),
            Some(2)
        );
    }

    #[test]
    fn test_pass_through() {
        assert_eq!(CompressionCombiner::combine(&PassThrough, "/d/c.gz", Some(3)), Some(3));
        assert_eq!(CompressionCombiner::<u8>::combine(&PassThrough, "/d/c.gz", None), None);
    }
}
