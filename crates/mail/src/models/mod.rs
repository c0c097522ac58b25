//! Domain models for mail entities

mod email;
mod mailbox;

pub use email::{Category, Email, EmailAddress, EmailBuilder, EmailId};
pub use mailbox::{Mailbox, UnreadCounts};
