//! # Agora Worker Library
//!
//! Delivers the notification emails that the API queues in `email_outbox`.
//!
//! ## Modules
//!
//! - `config`: Worker settings (`WORKER__*` variables plus `DATABASE_URL` and `MAIL_*`)
//! - `queue`: Claims and settles outbox rows
//! - `dispatcher`: Poll loop sending claimed emails through an `EmailTransport`

pub mod config;
pub mod dispatcher;
pub mod queue;
