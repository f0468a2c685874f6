#![deny(missing_docs)]
#![deny(missing_copy_implementations)]
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]
#![deny(unused_import_braces)]
#![deny(unused_qualifications)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

//! This crate keeps an up to date picture of every Formlabs printer
//! registered to one or more Formlabs cloud accounts, and republishes it.
//!
//! Each configured installation gets a [Coordinator] that polls the
//! Formlabs developer api on a fixed interval and holds the last good
//! [Snapshot]. Presentation adapters read snapshots through [Printer] views
//! and the projections in [sensors], and never fail on a missing or
//! malformed field.

pub mod config;
pub mod coordinator;
pub mod metrics;
pub mod printer;
pub mod redact;
pub mod sensors;
pub mod server;
pub mod snapshot;
pub mod thumbnail;
mod traits;


pub use config::Config;
pub use coordinator::{Coordinator, CoordinatorStatus, NotReady, UpdateFailed};
pub use printer::{CartridgeEncoding, DeviceInfo, PrintRun, Printer};
pub use snapshot::Snapshot;
pub use traits::PrinterSource;
