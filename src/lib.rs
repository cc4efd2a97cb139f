//! The domain model and core functionality of mailhatch, an embeddable SMTP server.
//!
//! mailhatch accepts inbound mail submissions over a streaming transport and
//! hands the envelope and message data to your application through a small
//! set of callbacks. It speaks ESMTP with STARTTLS, AUTH (PLAIN, LOGIN,
//! XOAUTH2), PIPELINING, 8BITMIME, SMTPUTF8 and SIZE. It does not queue,
//! relay or store anything - that is your job.
//!
//! ```no_run
//! use mailhatch::common::Result;
//! use mailhatch::config::ServerConfig;
//! use mailhatch::mail::Builder;
//! use mailhatch::server::TcpServer;
//!
//! #[async_std::main]
//! async fn main() -> Result<()> {
//!     let service = Builder::default()
//!         .config(ServerConfig::new("mail.example.org"))
//!         .build();
//!     TcpServer::on("localhost:2525").serve(service).await
//! }
//! ```

#[macro_use]
extern crate log;

pub mod config;
pub mod io;
pub mod mail;
pub mod smtp;

#[cfg(feature = "server")]
pub mod server;

pub mod common {
    pub type Error = Box<dyn std::error::Error + Send + Sync + 'static>;
    pub type Result<T> = std::result::Result<T, Error>;
    pub use async_std::io;
    pub use async_std::io::prelude::{ReadExt, WriteExt};
    pub use async_std::io::{Read, Write};
    pub use std::future::*;
    pub type S3Fut<T> = Pin<Box<dyn Future<Output = T> + Sync + Send + 'static>>;
    pub type S2Fut<'a, T> = Pin<Box<dyn Future<Output = T> + Sync + Send + 'a>>;
    pub type S1Fut<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
    pub use std::fmt;
    pub use std::pin::Pin;
    pub use std::sync::Arc;
    pub use std::task::{Context, Poll};

    /// A time-derived identifier for sessions and mail transactions.
    /// Unique enough for correlation in logs, not for anything secret.
    pub fn time_based_id() -> String {
        fn nondigit(input: char) -> bool {
            !input.is_ascii_digit()
        }
        format!("{:?}", std::time::Instant::now()).replace(nondigit, "")
    }
}
