//! Archive service access
//!
//! The séance page's only network dependency: one request per session to
//! `/api/seance`, plus the learning chat's `/api/learn`.

pub mod client;
pub mod types;

pub use client::{ArchiveClient, HttpFetcher, ResultFetcher};
pub use types::{parse_learn_reply, parse_prophecy, FetchError, Prophecy, EMPTY_LEARN_REPLY};
