pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod startup;

use std::sync::Arc;
use std::time::Duration;

use service_core::error::AppError;

use crate::config::GatewayConfig;
use crate::services::{DispatchTable, EmployeeClient, JwtService};

/// Shared per-process state. Everything here is immutable after startup, so
/// concurrent request tasks read it without synchronization.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub jwt: JwtService,
    pub employees: EmployeeClient,
    pub dispatch: Arc<DispatchTable>,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn from_config(config: GatewayConfig) -> Result<Self, AppError> {
        let timeout = Duration::from_secs(config.upstream.timeout_seconds);

        let jwt = JwtService::new(&config.jwt);
        let employees = EmployeeClient::new(&config.upstream.employees_url, timeout)?;
        let dispatch = Arc::new(DispatchTable::from_config(&config.upstream));
        let http = reqwest::Client::builder().timeout(timeout).build().map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!("Failed to build upstream client: {}", e))
        })?;

        Ok(Self {
            config: Arc::new(config),
            jwt,
            employees,
            dispatch,
            http,
        })
    }
}
