pub mod accessor;
pub mod editor;
pub mod engine;
pub mod report;
pub mod driver;

pub use accessor::{AccessorPath, PathSegment};
pub use driver::{
    list_pairs, load_document, CompareOptions, ComparisonDriver, DirectoryListing,
    DirectoryReport, PairResult,
};
pub use engine::{CategorizedChanges, DiffEngine};
pub use report::{flatten, nest, preview, ChangeTag, FlatEntry, ReportNode};
