// SPDX-License-Identifier: MIT

//! CrewRun: a community running-crew matchmaking backend.
//!
//! Users create and join group-running crews, keep favorite routes, file
//! hazard reports and track running stats, authenticated with JWT access
//! tokens and rotating refresh tokens.

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod pace;
pub mod response;
pub mod routes;
pub mod services;

use std::sync::Arc;

use config::Config;
use db::Database;
use services::{AuthService, CrewService, RouteInfoClient};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Arc<Database>,
    pub auth: AuthService,
    pub crews: CrewService,
}

impl AppState {
    pub fn new(config: Config, db: Arc<Database>) -> Self {
        let auth = AuthService::new(db.clone(), &config);
        let route_client = RouteInfoClient::new(&config.route_service_url);
        let crews = CrewService::new(db.clone(), route_client);

        Self {
            config,
            db,
            auth,
            crews,
        }
    }
}
