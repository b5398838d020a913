//! Application layer containing the booking orchestration.
//!
//! [`booking::BookingOrchestrator`] turns one stage request into one atomic
//! ledger batch. [`account_lookup::AccountLookup`] resolves customer IBANs to
//! their ledger accounts. [`worker::JobWorker`] wraps both for the job stream,
//! attaching the tracing context and mapping failures to manual-handling
//! signals.

pub mod account_lookup;
pub mod booking;
pub mod worker;
