//! # DAB API client
//!
//! Thin HTTP layer over the DAB music service: login, catalog lookups and
//! stream URL resolution. Everything here is plain request/decode glue; the
//! retrying and scheduling of downloads lives in [`crate::engine`].
//!
//! ## Endpoints
//!
//! - `POST api/auth/login` - session cookie for email and password
//! - `GET api/search?q=&type=` - tracks, albums or artists
//! - `GET api/album?albumId=` - album with track listing
//! - `GET api/discography?artistId=` - artist and their albums
//! - `GET api/stream?trackId=&quality=` - time-limited download URL
//!
//! ## Errors
//!
//! All calls return [`ApiError`]. Unknown ids surface as
//! [`ApiError::NotFound`] so callers can tell them apart from transport
//! failures and from a track that exists but has no stream location.

pub mod auth;
pub mod catalog;
mod client;
pub mod stream;

pub use client::{ApiError, DabClient, USER_AGENT};
