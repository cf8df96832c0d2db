//! Identify episode files and move them into place

use crate::Result;
use crate::cache::{CacheConfig, CacheStore, HashCache, METADATA_SUFFIX, RecordCache, days};
use crate::error::{ValidationError, io};
use crate::hashing::{self, Checksums, ContentFingerprint};
use crate::protocol::{CommandChannel, MylistState, ProtocolClient, ProtocolSession};
use crate::protocol::messages::FileRecord;
use crate::rename::relocate::{FileOps, TokioFileOps, link_back, move_file};
use crate::rename::sanitize::sanitize_path;
use crate::rename::template::Template;
use crate::rename::{RenameAction, RenameOptions, RenameOutcome};
use log::{debug, info};
use std::path::{Path, PathBuf};

/// An identified file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeRecord {
    /// Absolute path, updated when the file is moved
    pub path: PathBuf,
    pub fingerprint: ContentFingerprint,
    /// `None` in hash-only mode or when AniDB does not know the file
    pub record: Option<FileRecord>,
}

pub struct RenameEngine<C: CommandChannel = ProtocolClient> {
    session: ProtocolSession<C>,
    hashes: HashCache,
    metadata: RecordCache<FileRecord>,
    template: Template,
    target: PathBuf,
    rehash: bool,
    ops: Box<dyn FileOps>,
}

impl<C: CommandChannel> RenameEngine<C> {
    /// Open the caches under `config` and render destinations below `target`
    pub async fn new(
        config: &CacheConfig,
        session: ProtocolSession<C>,
        template: Template,
        target: impl Into<PathBuf>,
    ) -> Result<Self> {
        Ok(Self {
            session,
            hashes: HashCache::open(config).await?,
            metadata: RecordCache::new(
                "metadata",
                config.metadata_dir(),
                METADATA_SUFFIX,
                days(config.metadata_age),
            ),
            template,
            target: target.into(),
            rehash: false,
            ops: Box::new(TokioFileOps),
        })
    }

    /// Always hash files instead of trusting the hash cache
    pub fn with_rehash(mut self, rehash: bool) -> Self {
        self.rehash = rehash;
        self
    }

    pub fn with_file_ops(mut self, ops: Box<dyn FileOps>) -> Self {
        self.ops = ops;
        self
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn hashes(&self) -> &HashCache {
        &self.hashes
    }

    pub fn session(&self) -> &ProtocolSession<C> {
        &self.session
    }

    /// Fingerprint a file and resolve its metadata record
    ///
    /// The file is only hashed when the hash cache has no entry for it, the
    /// size changed or rehashing was requested. With `hash_only` no remote
    /// call is made. `refresh` bypasses the metadata cache.
    pub async fn identify(
        &mut self,
        path: &Path,
        refresh: bool,
        hash_only: bool,
    ) -> Result<EpisodeRecord> {
        let path = std::path::absolute(path).map_err(io::at(path))?;
        let size = hashing::regular_file_size(&path).await?;

        let (fingerprint, mut checksums) = match self.hashes.get(&path).await {
            Some(cached) if !self.rehash && cached.size == size => {
                debug!("Hash cache hit for {}", path.display());
                (cached, None)
            }
            _ => {
                debug!("Hashing {}", path.display());
                let (fingerprint, checksums) = hashing::fingerprint_with_checksums(&path).await?;
                self.hashes.put(&path, fingerprint.clone()).await?;
                (fingerprint, Some(checksums))
            }
        };

        if hash_only {
            return Ok(EpisodeRecord {
                path,
                fingerprint,
                record: None,
            });
        }

        let cached = if refresh {
            None
        } else {
            self.metadata.read(&fingerprint.hash).await?
        };
        let record = match cached {
            Some(record) => {
                debug!("Metadata cache hit for {}", fingerprint.hash);
                Some(record)
            }
            None => match self.session.query(&fingerprint).await? {
                Some(mut record) => {
                    if record.missing_checksums() {
                        let sums = match checksums.take() {
                            Some(sums) => sums,
                            None => hashing::checksums(&path).await?,
                        };
                        backfill(&mut record, &sums);
                    }
                    self.metadata
                        .write(&fingerprint.hash, record.clone())
                        .await?;
                    Some(record)
                }
                None => None,
            },
        };

        Ok(EpisodeRecord {
            path,
            fingerprint,
            record,
        })
    }

    /// Destination of a record below the target directory
    pub fn destination(&self, record: &FileRecord) -> PathBuf {
        self.target
            .join(sanitize_path(&self.template.render(record)))
    }

    /// Move, copy or symlink an identified file to its destination
    ///
    /// After a move the episode's path points at the destination, so a second
    /// call with the same episode reports `UpToDate`.
    pub async fn relocate(
        &mut self,
        episode: &mut EpisodeRecord,
        options: RenameOptions,
    ) -> Result<RenameOutcome> {
        if options.copy && options.symlink {
            return Err(ValidationError::conflict("copy", "symlink").into());
        }

        let source = episode.path.clone();
        let Some(record) = &episode.record else {
            return Ok(RenameOutcome {
                source,
                destination: None,
                action: RenameAction::Skipped,
            });
        };
        let destination = self.destination(record);
        let outcome = |action| RenameOutcome {
            source: source.clone(),
            destination: Some(destination.clone()),
            action,
        };

        if source == destination {
            return Ok(outcome(RenameAction::UpToDate));
        }

        let exists = tokio::fs::try_exists(&destination)
            .await
            .map_err(io::at(&destination))?;
        if exists && !options.overwrite {
            debug!("{} exists, skipping", destination.display());
            return Ok(outcome(RenameAction::Skipped));
        }

        if !options.dry_run
            && let Some(parent) = destination.parent()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(io::at(parent))?;
        }

        let action = if options.copy {
            if !options.dry_run {
                self.ops
                    .copy(&source, &destination)
                    .await
                    .map_err(io::at(&destination))?;
            }
            RenameAction::Copy
        } else {
            if !options.dry_run {
                move_file(self.ops.as_ref(), &source, &destination).await?;
            }
            if options.symlink {
                if !options.dry_run {
                    link_back(self.ops.as_ref(), &destination, &source).await?;
                }
                RenameAction::Symlink
            } else {
                RenameAction::Move
            }
        };

        if !options.dry_run {
            info!("{action} {} -> {}", source.display(), destination.display());
            self.hashes
                .rekey(&source, &destination, options.copy)
                .await?;
            if !options.copy {
                episode.path = destination.clone();
                episode.fingerprint.relink(&destination);
            }
        }

        Ok(outcome(action))
    }

    /// Sync the list entry of an identified file
    pub async fn mylist_update(
        &mut self,
        episode: &EpisodeRecord,
        state: MylistState,
    ) -> Result<bool> {
        Ok(self
            .session
            .mylist_update(&episode.fingerprint, state)
            .await?)
    }

    /// Log out of the protocol session
    pub async fn close(&mut self) {
        self.session.disconnect().await;
    }
}

fn backfill(record: &mut FileRecord, sums: &Checksums) {
    record.backfill(&sums.crc32, &sums.md5, &sums.sha1);
}
