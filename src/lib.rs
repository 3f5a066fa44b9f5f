//! Asynchronous Document Translation Service
//!
//! This library provides the core functionality for doc-translate: an HTTP
//! service that accepts document uploads, delegates translation to the
//! DeepL document API, and lets clients poll job progress and download the
//! translated result.

pub mod app_state;
pub mod config;
pub mod models;
pub mod routes;
pub mod services;
