//! Pooled access to the byte stream backing a container.
//!
//! Three policies exist:
//!
//! - **Shared**: idle readers are reused and every acquisition rewinds the
//!   reader to offset 0, so independent lookups never observe each other's
//!   cursor. A new reader is opened when none is idle.
//! - **Exclusive**: one reader, handed out without rewinding. The handle
//!   holds a lock, which serializes callers.
//! - **Static**: one already-open stream supplied by the caller, used by
//!   containers carved out of a parent entry. The pool never reopens it.

use std::fs::File;
use std::io::BufReader;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use std::path::Path;
use std::path::PathBuf;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use parking_lot::Mutex;
use parking_lot::MutexGuard;

use crate::Result;

/// Buffer size for file-backed readers.
const READER_BUFFER_SIZE: usize = 64 * 1024;

/// A seekable byte source.
pub trait ReadSeek: Read + Seek + Send {}

impl<T: Read + Seek + Send> ReadSeek for T {}

/// Boxed seekable byte source.
pub type BoxedReader = Box<dyn ReadSeek>;

/// Sharing policy for file-backed pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PoolPolicy {
    /// Many readers, each rewound on acquisition.
    #[default]
    Shared,
    /// One reader with a persistent cursor.
    Exclusive,
}

enum PoolInner {
    Shared {
        path: PathBuf,
        idle: Mutex<Vec<BoxedReader>>,
    },
    Exclusive {
        reader: Mutex<BoxedReader>,
    },
    Static {
        stream: Mutex<BoxedReader>,
    },
}

/// Concurrency-safety wrapper around a container's backing stream.
///
/// # Examples
///
/// ```
/// use gamepak_core::pool::ReaderPool;
/// use std::io::{Cursor, Read};
///
/// let pool = ReaderPool::bound("embedded", Box::new(Cursor::new(b"abc".to_vec())));
/// let mut reader = pool.acquire().unwrap();
/// let mut buf = String::new();
/// reader.read_to_string(&mut buf).unwrap();
/// assert_eq!(buf, "abc");
/// ```
pub struct ReaderPool {
    name: String,
    inner: PoolInner,
    opened: AtomicUsize,
}

impl ReaderPool {
    /// Creates a pool over a file.
    ///
    /// Returns `None` if the file does not exist or cannot be opened, so
    /// that a missing backing file surfaces as `NotFound` on first use
    /// instead of at construction.
    pub fn open(path: &Path, policy: PoolPolicy) -> Option<Self> {
        if !path.is_file() {
            return None;
        }
        let name = path.display().to_string();
        let inner = match policy {
            PoolPolicy::Shared => PoolInner::Shared {
                path: path.to_path_buf(),
                idle: Mutex::new(Vec::new()),
            },
            PoolPolicy::Exclusive => {
                let reader = open_file(path).ok()?;
                PoolInner::Exclusive {
                    reader: Mutex::new(reader),
                }
            }
        };
        let opened = usize::from(matches!(inner, PoolInner::Exclusive { .. }));
        tracing::debug!(pool = %name, ?policy, "reader pool created");
        Some(Self {
            name,
            inner,
            opened: AtomicUsize::new(opened),
        })
    }

    /// Wraps a stream the pool neither opens nor reopens.
    pub fn bound(name: impl Into<String>, stream: BoxedReader) -> Self {
        Self {
            name: name.into(),
            inner: PoolInner::Static {
                stream: Mutex::new(stream),
            },
            opened: AtomicUsize::new(1),
        }
    }

    /// Returns the name of the backing location.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of readers this pool has opened or been given.
    pub fn opened_readers(&self) -> usize {
        self.opened.load(Ordering::Relaxed)
    }

    /// Hands out a reader according to the pool policy.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if a shared reader cannot be opened or rewound.
    pub fn acquire(&self) -> Result<PooledReader<'_>> {
        match &self.inner {
            PoolInner::Shared { path, idle } => {
                let reused = idle.lock().pop();
                let mut reader = match reused {
                    Some(reader) => reader,
                    None => {
                        self.opened.fetch_add(1, Ordering::Relaxed);
                        open_file(path)?
                    }
                };
                reader.seek(SeekFrom::Start(0))?;
                Ok(PooledReader {
                    handle: Handle::Shared {
                        idle,
                        reader: Some(reader),
                    },
                })
            }
            PoolInner::Exclusive { reader } => Ok(PooledReader {
                handle: Handle::Locked(reader.lock()),
            }),
            PoolInner::Static { stream } => Ok(PooledReader {
                handle: Handle::Locked(stream.lock()),
            }),
        }
    }

    /// Returns a reader to the pool.
    ///
    /// Dropping the handle has the same effect.
    pub fn release(&self, reader: PooledReader<'_>) {
        drop(reader);
    }
}

impl std::fmt::Debug for ReaderPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let policy = match self.inner {
            PoolInner::Shared { .. } => "shared",
            PoolInner::Exclusive { .. } => "exclusive",
            PoolInner::Static { .. } => "static",
        };
        f.debug_struct("ReaderPool")
            .field("name", &self.name)
            .field("policy", &policy)
            .finish_non_exhaustive()
    }
}

fn open_file(path: &Path) -> std::io::Result<BoxedReader> {
    let file = File::open(path)?;
    Ok(Box::new(BufReader::with_capacity(READER_BUFFER_SIZE, file)))
}

enum Handle<'a> {
    Shared {
        idle: &'a Mutex<Vec<BoxedReader>>,
        reader: Option<BoxedReader>,
    },
    Locked(MutexGuard<'a, BoxedReader>),
}

/// A reader borrowed from a [`ReaderPool`].
pub struct PooledReader<'a> {
    handle: Handle<'a>,
}

impl PooledReader<'_> {
    fn stream(&mut self) -> &mut BoxedReader {
        match &mut self.handle {
            Handle::Shared { reader, .. } => reader
                .as_mut()
                .unwrap_or_else(|| unreachable!("shared reader taken before drop")),
            Handle::Locked(guard) => guard,
        }
    }

    /// Returns the reader as a trait object for driver calls.
    pub fn as_dyn(&mut self) -> &mut dyn ReadSeek {
        self.stream().as_mut()
    }
}

impl Read for PooledReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.stream().read(buf)
    }
}

impl Seek for PooledReader<'_> {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        self.stream().seek(pos)
    }
}

impl Drop for PooledReader<'_> {
    fn drop(&mut self) {
        if let Handle::Shared { idle, reader } = &mut self.handle
            && let Some(reader) = reader.take()
        {
            idle.lock().push(reader);
        }
    }
}
