#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod hash;

pub mod codec;

pub mod container {
    pub mod chunktab;
    pub mod superblock;
}

pub mod archive;
pub mod resolver;

pub mod tree;

pub mod extract;
pub mod mount;
pub mod selection;
pub mod traverse;

pub mod workspace;

// Re-exports: stable API surface
pub use archive::pack::{PackOptions, PackSummary, pack};
pub use archive::{ArchiveReader, Chunk, FsArchive, MemoryArchive, open_archive};
pub use config::WorkspaceConfig;
pub use error::{Result, VfsError};
pub use extract::{CancelToken, ExtractOptions, ExtractionReport};
pub use mount::{ArchiveMount, MountMode, MountOptions, MountReport, MountStats};
pub use resolver::{LoadStats, PathResolver};
pub use traverse::NodeFilter;
pub use tree::{ItemKind, MountId, NodeId, TreeNode, VirtualTree};
pub use workspace::Workspace;
