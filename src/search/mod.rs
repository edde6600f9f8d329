//! Search module: what to ask the listing for
//!
//! This module turns structured search options and date bounds into the
//! parameter set a page fetcher sends, and carries the per-record time cutoffs.

mod dates;
mod options;
mod request;
mod spec;

pub use dates::{Cutoffs, SearchDate, DAY_FORMAT};
pub use options::SearchOptions;
pub use request::{SearchRequest, CURSOR_PARAM, QUERY_PARAM};
pub use spec::SearchSpec;
