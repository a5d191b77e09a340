//! Asset fetching with progress: the byte source behind every pipeline.

use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{Receiver, TryRecvError, bounded};
use hashbrown::HashMap;

/// Default read size per progress tick.
pub const DEFAULT_READ_CHUNK: usize = 64 * 1024;

#[derive(Debug, PartialEq, Eq)]
pub enum FetchPoll {
    /// Still loading; `total` is known once the size has been determined.
    Pending { loaded: u64, total: Option<u64> },
    Ready(Vec<u8>),
}

/// An in-flight fetch, polled without blocking.
pub trait AssetStream {
    fn poll(&mut self) -> io::Result<FetchPoll>;
}

/// Something that can start fetches by name.
pub trait AssetSource {
    fn open(&self, name: &str) -> io::Result<Box<dyn AssetStream>>;
}

enum Msg {
    Data(Vec<u8>),
    Done,
    Failed(io::Error),
}

/// Reads files under `root` on a background thread, one chunk per message.
#[derive(Clone, Debug)]
pub struct FileAssetSource {
    root: PathBuf,
    read_chunk: usize,
}

impl FileAssetSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            read_chunk: DEFAULT_READ_CHUNK,
        }
    }

    pub fn with_read_chunk(mut self, bytes: usize) -> Self {
        self.read_chunk = bytes.max(1);
        self
    }
}

impl AssetSource for FileAssetSource {
    fn open(&self, name: &str) -> io::Result<Box<dyn AssetStream>> {
        let path = self.root.join(name);
        let mut file = File::open(&path)?;
        let total = file.metadata().ok().map(|m| m.len());
        let read_chunk = self.read_chunk;
        let (tx, rx) = bounded(16);
        log::debug!(target: "runtime", "fetching {} ({:?} bytes)", path.display(), total);
        thread::Builder::new()
            .name(format!("fetch-{}", name))
            .spawn(move || {
                loop {
                    let mut buf = vec![0u8; read_chunk];
                    let msg = match file.read(&mut buf) {
                        Ok(0) => Msg::Done,
                        Ok(n) => {
                            buf.truncate(n);
                            Msg::Data(buf)
                        }
                        Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                        Err(e) => Msg::Failed(e),
                    };
                    let last = !matches!(msg, Msg::Data(_));
                    if tx.send(msg).is_err() || last {
                        break;
                    }
                }
            })?;
        Ok(Box::new(FileStream {
            rx,
            data: Vec::with_capacity(total.unwrap_or(0) as usize),
            total,
        }))
    }
}

struct FileStream {
    rx: Receiver<Msg>,
    data: Vec<u8>,
    total: Option<u64>,
}

impl AssetStream for FileStream {
    fn poll(&mut self) -> io::Result<FetchPoll> {
        loop {
            match self.rx.try_recv() {
                Ok(Msg::Data(bytes)) => self.data.extend_from_slice(&bytes),
                Ok(Msg::Done) => return Ok(FetchPoll::Ready(std::mem::take(&mut self.data))),
                Ok(Msg::Failed(e)) => return Err(e),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "fetch thread ended early",
                    ));
                }
            }
        }
        Ok(FetchPoll::Pending {
            loaded: self.data.len() as u64,
            total: self.total,
        })
    }
}

/// Serves registered in-memory assets, `read_chunk` bytes per poll.
#[derive(Clone, Debug)]
pub struct MemoryAssetSource {
    assets: HashMap<String, Arc<[u8]>>,
    read_chunk: usize,
}

impl MemoryAssetSource {
    pub fn new() -> Self {
        Self {
            assets: HashMap::new(),
            read_chunk: DEFAULT_READ_CHUNK,
        }
    }

    pub fn with_read_chunk(mut self, bytes: usize) -> Self {
        self.read_chunk = bytes.max(1);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> &mut Self {
        self.assets.insert(name.into(), bytes.into());
        self
    }
}

impl Default for MemoryAssetSource {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetSource for MemoryAssetSource {
    fn open(&self, name: &str) -> io::Result<Box<dyn AssetStream>> {
        let bytes = self.assets.get(name).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no asset named {}", name))
        })?;
        Ok(Box::new(MemoryStream {
            bytes,
            loaded: 0,
            read_chunk: self.read_chunk.max(1),
        }))
    }
}

struct MemoryStream {
    bytes: Arc<[u8]>,
    loaded: usize,
    read_chunk: usize,
}

impl AssetStream for MemoryStream {
    fn poll(&mut self) -> io::Result<FetchPoll> {
        if self.loaded >= self.bytes.len() {
            return Ok(FetchPoll::Ready(self.bytes.to_vec()));
        }
        self.loaded = (self.loaded + self.read_chunk).min(self.bytes.len());
        Ok(FetchPoll::Pending {
            loaded: self.loaded as u64,
            total: Some(self.bytes.len() as u64),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_stream_reports_progress_then_bytes() {
        let mut src = MemoryAssetSource::new().with_read_chunk(4);
        src.insert("a.bin", vec![1u8, 2, 3, 4, 5, 6]);
        let mut s = src.open("a.bin").unwrap();
        assert_eq!(s.poll().unwrap(), FetchPoll::Pending { loaded: 4, total: Some(6) });
        assert_eq!(s.poll().unwrap(), FetchPoll::Pending { loaded: 6, total: Some(6) });
        assert_eq!(s.poll().unwrap(), FetchPoll::Ready(vec![1, 2, 3, 4, 5, 6]));
        assert_eq!(src.open("b.bin").err().map(|e| e.kind()), Some(io::ErrorKind::NotFound));
    }
}
