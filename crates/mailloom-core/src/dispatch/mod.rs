//! Mail dispatch - recipient partitioning, link rewriting, SMTP delivery

mod dispatcher;
mod mailer;
mod rewrite;
mod template;

pub use dispatcher::{DispatchRequest, DispatchSummary, MailDispatcher};
pub use mailer::{Mailer, OutgoingEmail, SmtpMailer};
pub use rewrite::LinkRewriter;
pub use template::render;
