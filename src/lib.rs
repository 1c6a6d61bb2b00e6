// SPDX-License-Identifier: MIT

//! Recipebox: a recipe-publishing API.
//!
//! This crate provides the backend API for publishing recipes composed of
//! tagged ingredients, favoriting them, keeping a shopping cart, following
//! authors and exporting a consolidated shopping list.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod routes;
pub mod services;

use config::Config;
use db::Db;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Db,
}
