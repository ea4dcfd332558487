//! Numeric channels used to move object state

use std::collections::{BTreeMap, VecDeque};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FrameError, FrameResult};

/// A channel moving flat numeric vectors and integer arrays
///
/// Objects address their data by `(db_tag, commit_tag)`. Channels that keep
/// data in arrival order may ignore the key.
pub trait Channel {
    /// Allocate a fresh database tag for an object that has none
    fn next_db_tag(&mut self) -> usize;

    fn send_vector(&mut self, db_tag: usize, commit_tag: usize, data: &[f64]) -> FrameResult<()>;

    fn recv_vector(&mut self, db_tag: usize, commit_tag: usize, len: usize) -> FrameResult<Vec<f64>>;

    fn send_id(&mut self, db_tag: usize, commit_tag: usize, data: &[i64]) -> FrameResult<()>;

    fn recv_id(&mut self, db_tag: usize, commit_tag: usize, len: usize) -> FrameResult<Vec<i64>>;
}

fn check_len(kind: &str, expected: usize, actual: usize) -> FrameResult<()> {
    if expected != actual {
        return Err(FrameError::SerializationMismatch(format!(
            "{} length {} received, {} expected",
            kind, actual, expected
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct VectorRecord {
    db_tag: usize,
    commit_tag: usize,
    data: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IdRecord {
    db_tag: usize,
    commit_tag: usize,
    data: Vec<i64>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Checkpoint {
    last_db_tag: usize,
    vectors: Vec<VectorRecord>,
    ids: Vec<IdRecord>,
}

/// Keyed store for checkpoint/restart
///
/// Vectors and integer arrays live in separate tables, so one object may
/// store one of each under its key. Writing to an existing key replaces it.
#[derive(Debug, Default)]
pub struct DatabaseChannel {
    last_db_tag: usize,
    vectors: BTreeMap<(usize, usize), Vec<f64>>,
    ids: BTreeMap<(usize, usize), Vec<i64>>,
}

impl DatabaseChannel {
    /// Create an empty database
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.vectors.len() + self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Save all records as JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> FrameResult<()> {
        let checkpoint = Checkpoint {
            last_db_tag: self.last_db_tag,
            vectors: self
                .vectors
                .iter()
                .map(|(&(db_tag, commit_tag), data)| VectorRecord {
                    db_tag,
                    commit_tag,
                    data: data.clone(),
                })
                .collect(),
            ids: self
                .ids
                .iter()
                .map(|(&(db_tag, commit_tag), data)| IdRecord {
                    db_tag,
                    commit_tag,
                    data: data.clone(),
                })
                .collect(),
        };
        let json = serde_json::to_string(&checkpoint)?;
        fs::write(path, json)?;
        log::debug!(
            "saved checkpoint with {} vectors and {} ids",
            checkpoint.vectors.len(),
            checkpoint.ids.len()
        );
        Ok(())
    }

    /// Load records previously written by [`DatabaseChannel::save`]
    pub fn load<P: AsRef<Path>>(path: P) -> FrameResult<Self> {
        let json = fs::read_to_string(path)?;
        let checkpoint: Checkpoint = serde_json::from_str(&json)?;

        let mut db = Self {
            last_db_tag: checkpoint.last_db_tag,
            ..Self::default()
        };
        for rec in checkpoint.vectors {
            db.vectors.insert((rec.db_tag, rec.commit_tag), rec.data);
        }
        for rec in checkpoint.ids {
            db.ids.insert((rec.db_tag, rec.commit_tag), rec.data);
        }
        Ok(db)
    }
}

impl Channel for DatabaseChannel {
    fn next_db_tag(&mut self) -> usize {
        self.last_db_tag += 1;
        self.last_db_tag
    }

    fn send_vector(&mut self, db_tag: usize, commit_tag: usize, data: &[f64]) -> FrameResult<()> {
        self.vectors.insert((db_tag, commit_tag), data.to_vec());
        Ok(())
    }

    fn recv_vector(&mut self, db_tag: usize, commit_tag: usize, len: usize) -> FrameResult<Vec<f64>> {
        let data = self.vectors.get(&(db_tag, commit_tag)).ok_or_else(|| {
            FrameError::Channel(format!(
                "no vector stored for db tag {} commit {}",
                db_tag, commit_tag
            ))
        })?;
        check_len("vector", len, data.len())?;
        Ok(data.clone())
    }

    fn send_id(&mut self, db_tag: usize, commit_tag: usize, data: &[i64]) -> FrameResult<()> {
        self.ids.insert((db_tag, commit_tag), data.to_vec());
        Ok(())
    }

    fn recv_id(&mut self, db_tag: usize, commit_tag: usize, len: usize) -> FrameResult<Vec<i64>> {
        let data = self.ids.get(&(db_tag, commit_tag)).ok_or_else(|| {
            FrameError::Channel(format!(
                "no id stored for db tag {} commit {}",
                db_tag, commit_tag
            ))
        })?;
        check_len("id", len, data.len())?;
        Ok(data.clone())
    }
}

#[derive(Debug, Clone)]
enum Message {
    Vector(Vec<f64>),
    Id(Vec<i64>),
}

/// First-in first-out channel for moving objects between partitions
///
/// Keys are ignored: the receiver must read in the order the sender wrote.
#[derive(Debug, Default)]
pub struct StreamChannel {
    last_db_tag: usize,
    queue: VecDeque<Message>,
}

impl StreamChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of unread messages
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    fn pop(&mut self) -> FrameResult<Message> {
        self.queue
            .pop_front()
            .ok_or_else(|| FrameError::Channel("stream is empty".to_string()))
    }
}

impl Channel for StreamChannel {
    fn next_db_tag(&mut self) -> usize {
        self.last_db_tag += 1;
        self.last_db_tag
    }

    fn send_vector(&mut self, _db_tag: usize, _commit_tag: usize, data: &[f64]) -> FrameResult<()> {
        self.queue.push_back(Message::Vector(data.to_vec()));
        Ok(())
    }

    fn recv_vector(&mut self, _db_tag: usize, _commit_tag: usize, len: usize) -> FrameResult<Vec<f64>> {
        match self.pop()? {
            Message::Vector(data) => {
                check_len("vector", len, data.len())?;
                Ok(data)
            }
            Message::Id(_) => Err(FrameError::SerializationMismatch(
                "expected a vector, found an id".to_string(),
            )),
        }
    }

    fn send_id(&mut self, _db_tag: usize, _commit_tag: usize, data: &[i64]) -> FrameResult<()> {
        self.queue.push_back(Message::Id(data.to_vec()));
        Ok(())
    }

    fn recv_id(&mut self, _db_tag: usize, _commit_tag: usize, len: usize) -> FrameResult<Vec<i64>> {
        match self.pop()? {
            Message::Id(data) => {
                check_len("id", len, data.len())?;
                Ok(data)
            }
            Message::Vector(_) => Err(FrameError::SerializationMismatch(
                "expected an id, found a vector".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_keys() {
        let mut db = DatabaseChannel::new();
        db.send_vector(3, 0, &[1.0, 2.0]).unwrap();
        db.send_vector(3, 1, &[5.0]).unwrap();
        db.send_id(3, 0, &[7]).unwrap();

        assert_eq!(db.recv_vector(3, 0, 2).unwrap(), vec![1.0, 2.0]);
        assert_eq!(db.recv_vector(3, 1, 1).unwrap(), vec![5.0]);
        assert_eq!(db.recv_id(3, 0, 1).unwrap(), vec![7]);
        assert!(matches!(db.recv_vector(4, 0, 1), Err(FrameError::Channel(_))));
        assert!(matches!(
            db.recv_vector(3, 0, 3),
            Err(FrameError::SerializationMismatch(_))
        ));
    }

    #[test]
    fn test_database_save_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checkpoint.json");

        let mut db = DatabaseChannel::new();
        let tag = db.next_db_tag();
        db.send_vector(tag, 2, &[0.5, -0.25]).unwrap();
        db.send_id(tag, 2, &[1, 2, 3]).unwrap();
        db.save(&path).unwrap();

        let mut loaded = DatabaseChannel::load(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.recv_vector(tag, 2, 2).unwrap(), vec![0.5, -0.25]);
        assert_eq!(loaded.recv_id(tag, 2, 3).unwrap(), vec![1, 2, 3]);
        assert_eq!(loaded.next_db_tag(), tag + 1);
    }

    #[test]
    fn test_stream_order_and_types() {
        let mut stream = StreamChannel::new();
        stream.send_id(0, 0, &[4, 5]).unwrap();
        stream.send_vector(0, 0, &[1.0]).unwrap();

        assert!(matches!(
            stream.recv_vector(0, 0, 1),
            Err(FrameError::SerializationMismatch(_))
        ));
        assert_eq!(stream.recv_vector(0, 0, 1).unwrap(), vec![1.0]);
        assert_eq!(stream.pending(), 0);
        assert!(stream.recv_id(0, 0, 2).is_err());
    }
}
