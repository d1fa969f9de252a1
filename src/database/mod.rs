//! Postgres persistence layer (feature = "database").
//!
//! Repository structs hold a `PgPool` and implement the store traits with
//! runtime-checked queries. Exact DDL is owned by the migration tooling; the
//! expected tables are `documents`, `users`, and `invoices` with the columns
//! referenced below.

pub mod document_repository;
pub mod invoice_repository;
pub mod user_repository;

pub use document_repository::PgDocumentStore;
pub use invoice_repository::PgInvoiceStore;
pub use user_repository::PgUserStore;
