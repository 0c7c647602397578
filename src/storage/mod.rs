//! Storage Module
//!
//! The CRUD dispatcher: [`DataStorage`] turns typed calls into transport requests
//! and transport responses back into envelopes.
//!
//! ## Operation Flow
//! 1. **Resolve** the partition (user template, read-only tag, pass-through).
//! 2. **Encode** the document for writes, or stop early on the read-only guard.
//! 3. **Dispatch** one request through the injected transport. No retries here.
//! 4. **Decode** the response into `Document<T>` / `Documents<T>`; any failure
//!    lands in the same envelope.
//!
//! `completion` adds callback-style variants on top of the async methods.

pub mod client;
pub mod completion;

pub use client::DataStorage;
