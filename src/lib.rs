/// Output formatting utilities for Markdown representations of search results
pub mod formatter;

/// GitLab REST client, resilient request transport and response decoding
pub mod gitlab;

/// Core services for configuration and remote content search
pub mod services;

/// MCP tool implementations exposing library functionality through the protocol
pub mod tools;

/// Transport layer implementations for MCP server modes (stdio, SSE)
pub mod transport;

/// Core type definitions and domain models used throughout the library
pub mod types;
