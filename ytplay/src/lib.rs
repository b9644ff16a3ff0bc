//! Manage YouTube playlists from the command line.
//!
//! The `ytplay` binary is a thin layer over this library: [`commands`] implements each
//! subcommand by composing the credential handling in [`credentials`], the API client in
//! [`youtube_api`], the ordering in [`sort`], and the renderers in [`output`].

pub mod commands;
pub mod config;
pub mod credentials;
pub mod duration;
pub mod error;
pub mod models;
pub mod oauth;
pub mod output;
pub mod playlist;
pub mod progress;
pub mod sort;
pub mod youtube_api;

pub use error::Error;
