//! Route handlers organized by resource

pub mod health;
pub mod challenges;
pub mod conversations;
