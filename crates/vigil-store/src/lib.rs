//! Durable local storage for the two pipeline records: settings and the
//! event log.
//!
//! Each record is an independently-keyed row in one SQLite table, sealed
//! with ChaCha20-Poly1305 under a per-record key derived from the device
//! secret. A blake3 digest of the ciphertext is stored alongside and
//! checked before decryption, so torn writes surface as a clean
//! [`StoreError::Corrupt`] instead of AEAD noise. The engine treats any
//! corrupt record as absent at startup; nothing here is fatal.

use std::path::Path;

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use chrono::Utc;
use hkdf::Hkdf;
use rand::RngCore;
use rusqlite::{params, Connection, OptionalExtension};
use sha2::Sha256;
use thiserror::Error;
use zeroize::Zeroizing;

use vigil_core::{LogEntry, LogPersistence, PersistError, Settings, SettingsPersistence};

const RECORD_SETTINGS: &str = "settings";
const RECORD_LOG: &str = "log";
const NONCE_LEN: usize = 12;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("record {0} is corrupt: {1}")]
    Corrupt(&'static str, String),
    #[error("crypto failure: {0}")]
    Crypto(&'static str),
    #[error("serialization: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("device secret is malformed")]
    BadSecret,
}

impl From<StoreError> for PersistError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Corrupt(record, detail) => {
                PersistError::Corrupt(format!("{record}: {detail}"))
            }
            other => PersistError::Backend(other.to_string()),
        }
    }
}

/// SQLite-backed store for the two durable records.
pub struct SafetyStore {
    conn: Connection,
    secret: Zeroizing<[u8; 32]>,
}

impl SafetyStore {
    /// Open (creating if needed) the store at `path`. The 32-byte device
    /// secret seals both records; losing it orphans the stored data.
    pub fn open(path: &Path, secret: [u8; 32]) -> Result<Self, StoreError> {
        Self::with_connection(Connection::open(path)?, secret)
    }

    /// In-memory store for tests and ephemeral runs.
    pub fn open_in_memory(secret: [u8; 32]) -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?, secret)
    }

    fn with_connection(conn: Connection, secret: [u8; 32]) -> Result<Self, StoreError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS records (
                 key        TEXT PRIMARY KEY,
                 nonce      BLOB NOT NULL,
                 body       BLOB NOT NULL,
                 digest     BLOB NOT NULL,
                 updated_at TEXT NOT NULL
             );",
        )?;
        Ok(Self {
            conn,
            secret: Zeroizing::new(secret),
        })
    }

    pub fn read_settings(&self) -> Result<Option<Settings>, StoreError> {
        match self.unseal(RECORD_SETTINGS)? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|err| StoreError::Corrupt(RECORD_SETTINGS, err.to_string())),
            None => Ok(None),
        }
    }

    pub fn write_settings(&self, settings: &Settings) -> Result<(), StoreError> {
        self.seal(RECORD_SETTINGS, &serde_json::to_vec(settings)?)
    }

    /// Newest-first, as written.
    pub fn read_log(&self) -> Result<Vec<LogEntry>, StoreError> {
        match self.unseal(RECORD_LOG)? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map_err(|err| StoreError::Corrupt(RECORD_LOG, err.to_string())),
            None => Ok(Vec::new()),
        }
    }

    pub fn write_log(&self, entries: &[LogEntry]) -> Result<(), StoreError> {
        self.seal(RECORD_LOG, &serde_json::to_vec(entries)?)
    }

    pub fn delete_log(&self) -> Result<(), StoreError> {
        self.conn
            .execute("DELETE FROM records WHERE key = ?1", params![RECORD_LOG])?;
        Ok(())
    }

    fn record_key(&self, record: &str) -> Result<Zeroizing<[u8; 32]>, StoreError> {
        let hk = Hkdf::<Sha256>::new(None, self.secret.as_slice());
        let mut out = Zeroizing::new([0u8; 32]);
        hk.expand(record.as_bytes(), out.as_mut_slice())
            .map_err(|_| StoreError::Crypto("hkdf expand"))?;
        Ok(out)
    }

    fn seal(&self, record: &'static str, plaintext: &[u8]) -> Result<(), StoreError> {
        let key = self.record_key(record)?;
        let cipher = ChaCha20Poly1305::new(Key::from_slice(key.as_slice()));
        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);
        let body = cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext)
            .map_err(|_| StoreError::Crypto("encrypt"))?;
        let digest = blake3::hash(&body);
        self.conn.execute(
            "INSERT INTO records (key, nonce, body, digest, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(key) DO UPDATE SET
                 nonce = excluded.nonce,
                 body = excluded.body,
                 digest = excluded.digest,
                 updated_at = excluded.updated_at",
            params![
                record,
                nonce.as_slice(),
                body,
                digest.as_bytes().as_slice(),
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(())
    }

    fn unseal(&self, record: &'static str) -> Result<Option<Vec<u8>>, StoreError> {
        let row: Option<(Vec<u8>, Vec<u8>, Vec<u8>)> = self
            .conn
            .query_row(
                "SELECT nonce, body, digest FROM records WHERE key = ?1",
                params![record],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;
        let Some((nonce, body, digest)) = row else {
            return Ok(None);
        };
        if digest.as_slice() != blake3::hash(&body).as_bytes() {
            return Err(StoreError::Corrupt(record, "ciphertext digest mismatch".into()));
        }
        if nonce.len() != NONCE_LEN {
            return Err(StoreError::Corrupt(record, "bad nonce length".into()));
        }
        let key = self.record_key(record)?;
        let cipher = ChaCha20Poly1305::new(Key::from_slice(key.as_slice()));
        cipher
            .decrypt(Nonce::from_slice(&nonce), body.as_slice())
            .map(Some)
            .map_err(|_| StoreError::Corrupt(record, "authentication failed".into()))
    }
}

impl SettingsPersistence for SafetyStore {
    fn load_settings(&self) -> Result<Option<Settings>, PersistError> {
        self.read_settings().map_err(PersistError::from)
    }

    fn save_settings(&self, settings: &Settings) -> Result<(), PersistError> {
        self.write_settings(settings).map_err(PersistError::from)
    }
}

impl LogPersistence for SafetyStore {
    fn load_log(&self) -> Result<Vec<LogEntry>, PersistError> {
        self.read_log().map_err(PersistError::from)
    }

    fn save_log(&self, entries: &[LogEntry]) -> Result<(), PersistError> {
        self.write_log(entries).map_err(PersistError::from)
    }

    fn clear_log(&self) -> Result<(), PersistError> {
        self.delete_log().map_err(PersistError::from)
    }
}

/// Load the device secret from `path`, generating and writing a fresh one
/// on first run. Stored hex-encoded, one line.
pub fn load_or_create_secret(path: &Path) -> Result<[u8; 32], StoreError> {
    if path.exists() {
        let text = std::fs::read_to_string(path)?;
        let bytes = hex::decode(text.trim()).map_err(|_| StoreError::BadSecret)?;
        let secret: [u8; 32] = bytes.try_into().map_err(|_| StoreError::BadSecret)?;
        Ok(secret)
    } else {
        let mut secret = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut secret);
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, hex::encode(secret))?;
        Ok(secret)
    }
}
