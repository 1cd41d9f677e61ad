//! Pipeline stages for one digest run.
//!
//! - `fetch`: paginate the search API and merge new papers into the store
//! - `classify`: render one paper and evaluate the filter terms
//! - `digest`: accumulate bucket fragments and assemble the documents

pub mod classify;
pub mod digest;
pub mod fetch;

pub use classify::{Rendered, render_paper};
pub use digest::{Digest, DigestBuilder};
pub use fetch::{FetchOptions, FetchOutcome, run_fetch};
