//! Server configuration.
//!
//! Every option can be given as a flag or through its environment variable.

use clap::Parser;
use huddle_core::DEFAULT_ROOM_CODE_LEN;
use std::net::SocketAddr;
use thiserror::Error;

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

pub const DEFAULT_ROOM_CAPACITY: usize = 16;

/// Per-room command channel size.
pub const DEFAULT_COMMAND_BUFFER: usize = 100;

pub const DEFAULT_LOG_FILTER: &str = "huddle_server=info,tower_http=info";

const MAX_ROOM_CODE_LEN: usize = 16;

#[derive(Debug, Clone, Parser)]
#[command(name = "huddle-server", about = "Room and negotiation relay for browser peers")]
pub struct ServerConfig {
    /// Address the HTTP/WebSocket listener binds to.
    #[arg(long, env = "HUDDLE_BIND", default_value = DEFAULT_BIND_ADDRESS)]
    pub bind: SocketAddr,

    /// Length of generated room codes.
    #[arg(long, env = "HUDDLE_ROOM_CODE_LEN", default_value_t = DEFAULT_ROOM_CODE_LEN)]
    pub room_code_len: usize,

    /// Maximum members per room, owner included.
    #[arg(long, env = "HUDDLE_ROOM_CAPACITY", default_value_t = DEFAULT_ROOM_CAPACITY)]
    pub room_capacity: usize,

    #[arg(long, env = "HUDDLE_COMMAND_BUFFER", default_value_t = DEFAULT_COMMAND_BUFFER)]
    pub command_buffer: usize,

    /// `tracing` filter directive.
    #[arg(long, env = "RUST_LOG", default_value = DEFAULT_LOG_FILTER)]
    pub log_filter: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("room code length must be between 1 and {MAX_ROOM_CODE_LEN}, got {0}")]
    RoomCodeLen(usize),

    #[error("room capacity must allow at least two members, got {0}")]
    RoomCapacity(usize),

    #[error("command buffer must be at least 1")]
    CommandBuffer,
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.room_code_len == 0 || self.room_code_len > MAX_ROOM_CODE_LEN {
            return Err(ConfigError::RoomCodeLen(self.room_code_len));
        }
        if self.room_capacity < 2 {
            return Err(ConfigError::RoomCapacity(self.room_capacity));
        }
        if self.command_buffer == 0 {
            return Err(ConfigError::CommandBuffer);
        }
        Ok(())
    }

    pub fn registry_settings(&self) -> RegistrySettings {
        RegistrySettings {
            code_len: self.room_code_len,
            capacity: self.room_capacity,
            command_buffer: self.command_buffer,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8080)),
            room_code_len: DEFAULT_ROOM_CODE_LEN,
            room_capacity: DEFAULT_ROOM_CAPACITY,
            command_buffer: DEFAULT_COMMAND_BUFFER,
            log_filter: DEFAULT_LOG_FILTER.to_owned(),
        }
    }
}

/// The part of the configuration the room registry needs.
#[derive(Debug, Clone, Copy)]
pub struct RegistrySettings {
    pub code_len: usize,
    pub capacity: usize,
    pub command_buffer: usize,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        ServerConfig::default().registry_settings()
    }
}
