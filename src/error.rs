//! Crate-level error type
//!
//! Each subsystem keeps its own error enum; [`Error`] wraps them for hosts that
//! want one type, and [`Error::kind`] classifies any of them.

use crate::config::ConfigError;
use crate::graph::GraphError;
use crate::query::{ExecutionError, ParseError};
use crate::snapshot::CodecError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Query(#[from] ExecutionError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Error classes a host can react to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed pattern, rejected before execution
    Parse,
    /// Nonexistent or tombstoned node/relationship
    UnknownEntity,
    SchemaViolation,
    /// Slot misuse inside the store
    OutOfRange,
    Codec,
    /// Planning or runtime failure during a query
    Query,
    Config,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Graph(err) => graph_kind(err),
            Error::Parse(_) => ErrorKind::Parse,
            Error::Query(ExecutionError::Parse(_)) => ErrorKind::Parse,
            Error::Query(ExecutionError::Graph(err)) => graph_kind(err),
            Error::Query(_) => ErrorKind::Query,
            Error::Codec(_) => ErrorKind::Codec,
            Error::Config(_) => ErrorKind::Config,
        }
    }
}

fn graph_kind(err: &GraphError) -> ErrorKind {
    match err {
        GraphError::OutOfRange(_) => ErrorKind::OutOfRange,
        GraphError::SchemaViolation(_) => ErrorKind::SchemaViolation,
        _ => ErrorKind::UnknownEntity,
    }
}
