//! Wire types shared between the document workflow client and its front ends.

pub mod domain;
pub mod error;
pub mod protocol;
