//! Application layer containing the bounty resolution logic.
//!
//! `engine::BountyEngine` is the entry point: it registers wallet sets for
//! open issues and, once an issue closes, walks its timeline to the merged
//! pull request, extracts contributor addresses and hands them to the
//! payout decider.

pub mod ci;
pub mod comment;
pub mod engine;
pub mod extractor;
pub mod locks;
pub mod payout;
pub mod timeline;
