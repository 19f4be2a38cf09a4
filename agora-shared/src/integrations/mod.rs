/// Clients for third-party services
///
/// - [`media`]: image/video hosting API
/// - [`mail`]: transactional email API, used by the outbox worker
///
/// The API never sends email inline; it only queues messages.

pub mod mail;
pub mod media;
