pub mod predicate;

pub use predicate::PathPredicate;
