use std::net::{Ipv4Addr, SocketAddr};

use crate::domain::errors::{DomainError, Result};

/// Minimum allowed port (ports below 1024 are privileged)
const MIN_USER_PORT: u16 = 1024;

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    port: u16,
    max_body_bytes: u64,
}

impl ServerConfig {
    pub fn new(port: u16) -> Result<Self> {
        Self::validate_port(port)?;

        Ok(Self {
            port,
            max_body_bytes: 64 * 1024,
        })
    }

    pub fn with_max_body_bytes(mut self, bytes: u64) -> Self {
        self.max_body_bytes = bytes;
        self
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Largest overlay JSON body accepted.
    pub fn max_body_bytes(&self) -> u64 {
        self.max_body_bytes
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }

    fn validate_port(port: u16) -> Result<()> {
        if port == 0 {
            return Err(DomainError::InvalidPort);
        }
        if port < MIN_USER_PORT {
            return Err(DomainError::PortRequiresRoot(port));
        }
        Ok(())
    }
}
