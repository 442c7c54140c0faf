//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! All driven ports are backed by PostgreSQL through Diesel, including the
//! mail outbox that the club's mailer drains. Adapters translate between
//! domain types and rows; they contain no business logic.

pub mod persistence;
