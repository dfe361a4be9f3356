use thiserror::Error;

use crate::tree::{MountId, NodeId};

#[derive(Error, Debug)]
pub enum VfsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Format error: {0}")]
    Format(String),

    #[error("invalid filter pattern: {0}")]
    InvalidFilter(#[from] regex::Error),

    #[error("failed to mount {label}: {source}")]
    Mount {
        label: String,
        #[source]
        source: Box<VfsError>,
    },

    #[error("node does not exist: {0}")]
    NodeNotFound(NodeId),

    #[error("not a file: {0}")]
    NotAFile(NodeId),

    #[error("not a directory: {0}")]
    NotADirectory(NodeId),

    #[error("unknown mount: {0}")]
    UnknownMount(MountId),

    #[error("unsafe path: {0}")]
    UnsafePath(String),
}

// Convenient crate-wide result type
pub type Result<T> = std::result::Result<T, VfsError>;
