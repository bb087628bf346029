//! LMDB environment setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};
use tracing::info;

use crate::chain::LmdbChainStore;
use crate::LmdbError;

/// Default map size: 1 GiB.
pub const DEFAULT_MAP_SIZE: usize = 1 << 30;

const NODE_DB: &str = "node";

/// Wraps the LMDB environment and its database handles.
pub struct LmdbEnvironment {
    env: Arc<Env>,
    node_db: Database<Bytes, Bytes>,
    path: PathBuf,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at `path`, creating the directory
    /// if needed.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;
        // SAFETY: the environment is opened once per directory by this
        // process, and the memory map is only accessed through heed.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(1)
                .open(path)?
        };
        let mut wtxn = env.write_txn()?;
        let node_db: Database<Bytes, Bytes> = env.create_database(&mut wtxn, Some(NODE_DB))?;
        wtxn.commit()?;

        info!(path = %path.display(), "opened LMDB environment");
        Ok(Self {
            env: Arc::new(env),
            node_db,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A chain store backed by this environment.
    pub fn chain_store(&self) -> LmdbChainStore {
        LmdbChainStore {
            env: Arc::clone(&self.env),
            node_db: self.node_db,
        }
    }
}
