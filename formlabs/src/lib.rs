#![deny(missing_docs)]
#![deny(missing_copy_implementations)]
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]
#![deny(unused_import_braces)]
#![deny(unused_qualifications)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

//! This crate implements support for talking to the Formlabs developer
//! cloud api, which reports the state of every printer registered to an
//! account.
//!
//! Requests are authenticated with a bearer token obtained through an OAuth2
//! client-credentials exchange. The token is cached in memory and thrown away
//! whenever the api answers with a 401 or 403.

mod client;
mod error;
mod token;
mod transport;

pub use client::{Client, Credentials};
pub use error::{Error, Result};
pub use token::{Token, TokenCache};
pub use transport::{HttpResponse, ReqwestTransport, Transport};

/// Default root of the developer api.
pub const DEFAULT_BASE_URL: &str = "https://api.formlabs.com/developer/v1";

/// Path (relative to the base url) of the token exchange endpoint.
pub const TOKEN_PATH: &str = "/o/token/";

/// Path (relative to the base url) of the printer listing endpoint.
pub const PRINTERS_PATH: &str = "/printers/";
