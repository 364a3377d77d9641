// SPDX-License-Identifier: MIT

//! Business logic services.

pub mod auth;
pub mod crew;
pub mod route_info;

pub use auth::{AuthService, TokenIssuer, TokenPair};
pub use crew::CrewService;
pub use route_info::{RouteInfo, RouteInfoClient};
