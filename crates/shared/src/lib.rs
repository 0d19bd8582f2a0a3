//! Types shared by the subtitler server and its upload clients.

pub mod domain;
pub mod error;
pub mod protocol;
