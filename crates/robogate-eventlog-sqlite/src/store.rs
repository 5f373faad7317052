// crates/robogate-eventlog-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Event Log Store
// Description: Durable, append-only, hash-chained EventLogStore backed by
//              SQLite WAL, keyed by (run_id, seq).
// Purpose: Give the control loop a tamper-evident record of everything a
//          run did (§4.2), independent of any one process's lifetime.
// Dependencies: robogate-core, rusqlite, serde_json, tokio, tracing
// ============================================================================

//! ## Overview
//! WAL mode, a busy-timeout pragma, a single-writer gateway thread fed by
//! an `mpsc::sync_channel`, and a small pool of read-only connections for
//! snapshot reads. This store's unit of durability is one `Event`,
//! appended once and never rewritten; `(run_id, seq)` is the primary key.

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::mpsc;
use std::sync::mpsc::SyncSender;
use std::thread;

use async_trait::async_trait;
use robogate_core::RobogateError;
use robogate_core::event::Event;
use robogate_core::event::EventPayload;
use robogate_core::hashing::DEFAULT_HASH_ALGORITHM;
use robogate_core::hashing::HashDigest;
use robogate_core::hashing::hash_canonical_json;
use robogate_core::identifiers::EventId;
use robogate_core::identifiers::RunId;
use robogate_core::interfaces::ChainVerification;
use robogate_core::interfaces::EventLogStore;
use robogate_core::time::MonotonicClock;
use robogate_core::time::Timestamp;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::params;

use crate::errors::EventLogError;

/// `SQLite` schema version for the event log.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout, milliseconds.
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Default writer command queue capacity.
const DEFAULT_WRITER_QUEUE_CAPACITY: usize = 1_024;
/// Default number of read-only connections in the snapshot pool.
const DEFAULT_READ_POOL_SIZE: usize = 4;

/// Configuration for [`SqliteEventLogStore`].
#[derive(Debug, Clone)]
pub struct SqliteEventLogConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout, milliseconds.
    pub busy_timeout_ms: u64,
    /// Writer command queue capacity; appends block once this fills.
    pub writer_queue_capacity: usize,
    /// Number of read-only connections used for `list`/`verify`.
    pub read_pool_size: usize,
}

impl Default for SqliteEventLogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("robogate-events.sqlite3"),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            writer_queue_capacity: DEFAULT_WRITER_QUEUE_CAPACITY,
            read_pool_size: DEFAULT_READ_POOL_SIZE,
        }
    }
}

/// Summary metadata for a run's stored log, used by the `/runs` list API.
#[derive(Debug, Clone, PartialEq)]
pub struct RunLogSummary {
    /// The run this summary describes.
    pub run_id: RunId,
    /// Number of events stored for this run.
    pub event_count: u64,
    /// The highest sequence number stored for this run.
    pub last_seq: u64,
    /// The timestamp of the most recently appended event.
    pub last_ts: Timestamp,
}

/// Command queued to the writer thread.
struct AppendCommand {
    run_id: RunId,
    payload: EventPayload,
    response: mpsc::Sender<Result<Event, EventLogError>>,
}

/// `SQLite`-backed, hash-chained event log (C2).
///
/// # Invariants
/// - Every append is funneled through a single writer thread, so `seq`
///   allocation and hash chaining within one run never race.
/// - Reads (`list`, `verify`) use a round-robin pool of read-only
///   connections, isolated from the writer under WAL.
pub struct SqliteEventLogStore {
    read_connections: Arc<Vec<Mutex<Connection>>>,
    read_cursor: Arc<AtomicUsize>,
    writer_sender: SyncSender<AppendCommand>,
    pending_depth: Arc<AtomicUsize>,
}

impl SqliteEventLogStore {
    /// Opens (creating if necessary) a `SQLite`-backed event log at
    /// `config.path`, starting its writer thread and read connection pool.
    ///
    /// # Errors
    ///
    /// Returns [`EventLogError`] if the database cannot be opened or its
    /// schema initialized.
    pub fn open(config: SqliteEventLogConfig) -> Result<Self, EventLogError> {
        ensure_parent_dir(&config.path)?;
        let mut write_connection = open_connection(&config.path, config.busy_timeout_ms)?;
        initialize_schema(&mut write_connection)?;

        let mut read_connections = Vec::with_capacity(config.read_pool_size.max(1));
        for _ in 0 .. config.read_pool_size.max(1) {
            let connection = open_connection(&config.path, config.busy_timeout_ms)?;
            read_connections.push(Mutex::new(connection));
        }

        let pending_depth = Arc::new(AtomicUsize::new(0));
        let (sender, receiver) = mpsc::sync_channel(config.writer_queue_capacity.max(1));
        spawn_writer_thread(write_connection, receiver, Arc::clone(&pending_depth));

        Ok(Self {
            read_connections: Arc::new(read_connections),
            read_cursor: Arc::new(AtomicUsize::new(0)),
            writer_sender: sender,
            pending_depth,
        })
    }

    /// Lists summaries for every run with at least one stored event,
    /// analogous to the teacher's `list_runs` operational helper.
    ///
    /// # Errors
    ///
    /// Returns [`RobogateError::Fatal`] if the query fails.
    pub async fn list_runs(&self) -> Result<Vec<RunLogSummary>, RobogateError> {
        let read_conn = Arc::clone(&self.read_connections);
        let cursor = Arc::clone(&self.read_cursor);
        tokio::task::spawn_blocking(move || list_runs_blocking(&read_conn, &cursor))
            .await
            .map_err(|err| RobogateError::Fatal(err.to_string()))?
            .map_err(RobogateError::from)
    }
}

#[async_trait]
impl EventLogStore for SqliteEventLogStore {
    async fn append(&self, run_id: &RunId, payload: EventPayload) -> Result<Event, RobogateError> {
        let run_id = run_id.clone();
        let sender = self.writer_sender.clone();
        let pending_depth = Arc::clone(&self.pending_depth);
        let (response_tx, response_rx) = mpsc::channel();
        tokio::task::spawn_blocking(move || {
            pending_depth.fetch_add(1, Ordering::Relaxed);
            let command = AppendCommand { run_id, payload, response: response_tx };
            let send_result = sender.send(command);
            pending_depth.fetch_sub(1, Ordering::Relaxed);
            send_result.map_err(|_| EventLogError::WriterShutDown)?;
            response_rx.recv().unwrap_or(Err(EventLogError::WriterShutDown))
        })
        .await
        .map_err(|err| RobogateError::Fatal(err.to_string()))?
        .map_err(RobogateError::from)
    }

    async fn list(&self, run_id: &RunId, since_seq: Option<u64>) -> Result<Vec<Event>, RobogateError> {
        let read_conn = Arc::clone(&self.read_connections);
        let cursor = Arc::clone(&self.read_cursor);
        let run_id = run_id.clone();
        tokio::task::spawn_blocking(move || list_events_blocking(&read_conn, &cursor, &run_id, since_seq))
            .await
            .map_err(|err| RobogateError::Fatal(err.to_string()))?
            .map_err(RobogateError::from)
    }

    async fn verify(&self, run_id: &RunId) -> Result<ChainVerification, RobogateError> {
        let events = self.list(run_id, None).await?;
        Ok(verify_chain(&events))
    }
}

fn spawn_writer_thread(connection: Connection, receiver: mpsc::Receiver<AppendCommand>, pending_depth: Arc<AtomicUsize>) {
    thread::spawn(move || {
        let connection = connection;
        let clock = MonotonicClock::new();
        while let Ok(command) = receiver.recv() {
            pending_depth.fetch_add(1, Ordering::Relaxed);
            let result = process_append(&connection, &clock, &command.run_id, command.payload);
            pending_depth.fetch_sub(1, Ordering::Relaxed);
            if let Err(err) = &result {
                tracing::warn!(run_id = %command.run_id, error = %err, "event log append failed");
            }
            let _ = command.response.send(result);
        }
    });
}

fn process_append(
    connection: &Connection,
    clock: &MonotonicClock,
    run_id: &RunId,
    payload: EventPayload,
) -> Result<Event, EventLogError> {
    let tx = connection.unchecked_transaction().map_err(|err| EventLogError::Db(err.to_string()))?;

    let last_row: Option<(i64, String)> = tx
        .query_row(
            "SELECT seq, hash FROM events WHERE run_id = ?1 ORDER BY seq DESC LIMIT 1",
            params![run_id.as_str()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()
        .map_err(|err| EventLogError::Db(err.to_string()))?;

    let (next_seq, prev_hash) = match last_row {
        Some((seq, hash)) => (seq + 1, HashDigest::from_hex(hash)),
        None => (1, HashDigest::genesis(DEFAULT_HASH_ALGORITHM)),
    };
    let next_seq = u64::try_from(next_seq).map_err(|_| EventLogError::Db("sequence overflow".to_string()))?;

    let ts = clock.now();
    let id = EventId::new(format!("{}-{next_seq}", run_id.as_str()));
    let event_type = payload.event_type();

    let mut event =
        Event { seq: next_seq, id, run_id: run_id.clone(), ts, payload, prev_hash, hash: HashDigest::genesis(DEFAULT_HASH_ALGORITHM) };
    event.hash = hash_canonical_json(DEFAULT_HASH_ALGORITHM, &event.hash_preimage())
        .map_err(|err| EventLogError::Canonicalization(err.to_string()))?;

    let payload_json =
        serde_json::to_string(&event.payload).map_err(|err| EventLogError::Canonicalization(err.to_string()))?;

    tx.execute(
        "INSERT INTO events (run_id, seq, id, ts_micros, event_type, payload_json, prev_hash, hash) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            run_id.as_str(),
            i64::try_from(next_seq).unwrap_or(i64::MAX),
            event.id.as_str(),
            event.ts.as_unix_micros(),
            format!("{event_type:?}"),
            payload_json,
            event.prev_hash.as_hex(),
            event.hash.as_hex(),
        ],
    )
    .map_err(|err| map_insert_error(run_id, &err))?;

    tx.commit().map_err(|err| EventLogError::Db(err.to_string()))?;

    Ok(event)
}

fn map_insert_error(run_id: &RunId, err: &rusqlite::Error) -> EventLogError {
    let message = err.to_string();
    if message.contains("UNIQUE constraint failed") {
        EventLogError::ConcurrentAppend { run_id: run_id.as_str().to_string() }
    } else {
        EventLogError::Db(message)
    }
}

fn list_events_blocking(
    read_connections: &Arc<Vec<Mutex<Connection>>>,
    cursor: &Arc<AtomicUsize>,
    run_id: &RunId,
    since_seq: Option<u64>,
) -> Result<Vec<Event>, EventLogError> {
    let since = since_seq.map(|seq| i64::try_from(seq).unwrap_or(i64::MAX)).unwrap_or(0);
    let connection = pick_read_connection(read_connections, cursor)
        .ok_or_else(|| EventLogError::Io("event log has no configured read connections".to_string()))?;
    let guard = connection.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    let mut stmt = guard
        .prepare(
            "SELECT seq, id, ts_micros, payload_json, prev_hash, hash FROM events \
             WHERE run_id = ?1 AND seq > ?2 ORDER BY seq ASC",
        )
        .map_err(|err| EventLogError::Db(err.to_string()))?;
    let rows = stmt
        .query_map(params![run_id.as_str(), since], |row| {
            let seq: i64 = row.get(0)?;
            let id: String = row.get(1)?;
            let ts_micros: i64 = row.get(2)?;
            let payload_json: String = row.get(3)?;
            let prev_hash: String = row.get(4)?;
            let hash: String = row.get(5)?;
            Ok((seq, id, ts_micros, payload_json, prev_hash, hash))
        })
        .map_err(|err| EventLogError::Db(err.to_string()))?;
    let mut events = Vec::new();
    for row in rows {
        let (seq, id, ts_micros, payload_json, prev_hash, hash) = row.map_err(|err| EventLogError::Db(err.to_string()))?;
        let payload: EventPayload =
            serde_json::from_str(&payload_json).map_err(|err| EventLogError::Canonicalization(err.to_string()))?;
        events.push(Event {
            seq: u64::try_from(seq).unwrap_or(0),
            id: EventId::new(id),
            run_id: run_id.clone(),
            ts: Timestamp::from_unix_micros(ts_micros),
            payload,
            prev_hash: HashDigest::from_hex(prev_hash),
            hash: HashDigest::from_hex(hash),
        });
    }
    Ok(events)
}

fn list_runs_blocking(
    read_connections: &Arc<Vec<Mutex<Connection>>>,
    cursor: &Arc<AtomicUsize>,
) -> Result<Vec<RunLogSummary>, EventLogError> {
    let connection = pick_read_connection(read_connections, cursor)
        .ok_or_else(|| EventLogError::Io("event log has no configured read connections".to_string()))?;
    let guard = connection.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    let mut stmt = guard
        .prepare("SELECT run_id, COUNT(*), MAX(seq), MAX(ts_micros) FROM events GROUP BY run_id ORDER BY run_id ASC")
        .map_err(|err| EventLogError::Db(err.to_string()))?;
    let rows = stmt
        .query_map([], |row| {
            let run_id: String = row.get(0)?;
            let count: i64 = row.get(1)?;
            let last_seq: i64 = row.get(2)?;
            let last_ts: i64 = row.get(3)?;
            Ok((run_id, count, last_seq, last_ts))
        })
        .map_err(|err| EventLogError::Db(err.to_string()))?;
    let mut summaries = Vec::new();
    for row in rows {
        let (run_id, count, last_seq, last_ts) = row.map_err(|err| EventLogError::Db(err.to_string()))?;
        summaries.push(RunLogSummary {
            run_id: RunId::new(run_id),
            event_count: u64::try_from(count).unwrap_or(0),
            last_seq: u64::try_from(last_seq).unwrap_or(0),
            last_ts: Timestamp::from_unix_micros(last_ts),
        });
    }
    Ok(summaries)
}

fn pick_read_connection<'a>(
    read_connections: &'a Arc<Vec<Mutex<Connection>>>,
    cursor: &Arc<AtomicUsize>,
) -> Option<&'a Mutex<Connection>> {
    if read_connections.is_empty() {
        return None;
    }
    let index = cursor.fetch_add(1, Ordering::Relaxed) % read_connections.len();
    Some(&read_connections[index])
}

fn verify_chain(events: &[Event]) -> ChainVerification {
    let mut expected_prev = HashDigest::genesis(DEFAULT_HASH_ALGORITHM);
    for event in events {
        if event.prev_hash != expected_prev {
            return ChainVerification { ok: false, break_at: Some(event.seq) };
        }
        let Ok(recomputed) = hash_canonical_json(DEFAULT_HASH_ALGORITHM, &event.hash_preimage()) else {
            return ChainVerification { ok: false, break_at: Some(event.seq) };
        };
        expected_prev = recomputed;
    }
    ChainVerification { ok: true, break_at: None }
}

fn ensure_parent_dir(path: &Path) -> Result<(), EventLogError> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| EventLogError::Io(err.to_string()))
}

fn open_connection(path: &Path, busy_timeout_ms: u64) -> Result<Connection, EventLogError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(path, flags).map_err(|err| EventLogError::Db(err.to_string()))?;
    apply_pragmas(&connection, busy_timeout_ms)?;
    Ok(connection)
}

fn apply_pragmas(connection: &Connection, busy_timeout_ms: u64) -> Result<(), EventLogError> {
    connection.execute_batch("PRAGMA journal_mode = WAL;").map_err(|err| EventLogError::Db(err.to_string()))?;
    connection.execute_batch("PRAGMA synchronous = NORMAL;").map_err(|err| EventLogError::Db(err.to_string()))?;
    connection
        .busy_timeout(std::time::Duration::from_millis(busy_timeout_ms))
        .map_err(|err| EventLogError::Db(err.to_string()))?;
    Ok(())
}

fn initialize_schema(connection: &mut Connection) -> Result<(), EventLogError> {
    let tx = connection.transaction().map_err(|err| EventLogError::Db(err.to_string()))?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(|err| EventLogError::Db(err.to_string()))?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", [], |row| row.get(0))
        .optional()
        .map_err(|err| EventLogError::Db(err.to_string()))?;
    if version.is_none() {
        tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
            .map_err(|err| EventLogError::Db(err.to_string()))?;
        tx.execute_batch(
            "CREATE TABLE IF NOT EXISTS events (
                run_id TEXT NOT NULL,
                seq INTEGER NOT NULL,
                id TEXT NOT NULL,
                ts_micros INTEGER NOT NULL,
                event_type TEXT NOT NULL,
                payload_json TEXT NOT NULL,
                prev_hash TEXT NOT NULL,
                hash TEXT NOT NULL,
                PRIMARY KEY (run_id, seq)
            );
            CREATE INDEX IF NOT EXISTS events_run_id_idx ON events(run_id);",
        )
        .map_err(|err| EventLogError::Db(err.to_string()))?;
    }
    tx.commit().map_err(|err| EventLogError::Db(err.to_string()))
}

#[cfg(test)]
#[allow(clippy::expect_used, reason = "test-only assertions")]
mod tests {
    use robogate_core::telemetry::Point2;
    use robogate_core::telemetry::Telemetry;
    use robogate_core::telemetry::Zone;

    use super::*;

    fn telemetry() -> Telemetry {
        Telemetry {
            x: 0.0,
            y: 0.0,
            theta: 0.0,
            speed: 0.0,
            zone: Zone::Other,
            nearest_obstacle_m: 10.0,
            human_detected: false,
            human_conf: 0.0,
            human_distance_m: 10.0,
            battery: None,
            target: Some(Point2::new(1.0, 1.0)),
            events: Vec::new(),
        }
    }

    fn open_file_backed() -> (SqliteEventLogStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("events.sqlite3");
        let store = SqliteEventLogStore::open(SqliteEventLogConfig { path, ..SqliteEventLogConfig::default() })
            .expect("open store");
        (store, dir)
    }

    #[tokio::test]
    async fn appended_events_chain_and_verify_clean() {
        let (store, _dir) = open_file_backed();
        let run_id = RunId::new("run-1");
        let first = store.append(&run_id, EventPayload::Telemetry(telemetry())).await.expect("append 1");
        let second = store.append(&run_id, EventPayload::Telemetry(telemetry())).await.expect("append 2");
        assert_eq!(first.seq, 1);
        assert_eq!(second.seq, 2);
        assert_eq!(second.prev_hash, first.hash);

        let verification = store.verify(&run_id).await.expect("verify");
        assert!(verification.ok);
        assert_eq!(verification.break_at, None);
    }

    #[tokio::test]
    async fn list_respects_since_seq() {
        let (store, _dir) = open_file_backed();
        let run_id = RunId::new("run-2");
        for _ in 0 .. 3 {
            store.append(&run_id, EventPayload::Telemetry(telemetry())).await.expect("append");
        }
        let events = store.list(&run_id, Some(1)).await.expect("list");
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].seq, 2);
    }

    #[tokio::test]
    async fn tampering_with_a_stored_event_breaks_verification() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("events.sqlite3");
        let run_id = RunId::new("run-3");
        {
            let store = SqliteEventLogStore::open(SqliteEventLogConfig { path: path.clone(), ..SqliteEventLogConfig::default() })
                .expect("open store");
            store.append(&run_id, EventPayload::Telemetry(telemetry())).await.expect("append 1");
            store.append(&run_id, EventPayload::Telemetry(telemetry())).await.expect("append 2");
        }
        let connection = Connection::open(&path).expect("reopen raw");
        connection
            .execute("UPDATE events SET payload_json = '{\"type\":\"TELEMETRY\"}' WHERE seq = 1", [])
            .expect("tamper");
        drop(connection);

        let store =
            SqliteEventLogStore::open(SqliteEventLogConfig { path, ..SqliteEventLogConfig::default() }).expect("reopen store");
        let verification = store.verify(&run_id).await.expect("verify");
        assert!(!verification.ok);
        assert_eq!(verification.break_at, Some(2));
    }

    #[tokio::test]
    async fn list_runs_reports_every_run_with_events() {
        let (store, _dir) = open_file_backed();
        store.append(&RunId::new("run-a"), EventPayload::Telemetry(telemetry())).await.expect("append a");
        store.append(&RunId::new("run-b"), EventPayload::Telemetry(telemetry())).await.expect("append b");
        let summaries = store.list_runs().await.expect("list_runs");
        assert_eq!(summaries.len(), 2);
    }
}
