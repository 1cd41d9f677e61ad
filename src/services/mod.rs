// src/services/mod.rs

//! External collaborators: the search API and the mail transport.

pub mod arxiv;
pub mod mailer;

pub use arxiv::{ArxivClient, PageRequest, SearchSource, SortOrder};
pub use mailer::Mailer;
