//! Blocking RESP2 backend for Redis-compatible servers.
//!
//! Commands are encoded as RESP arrays of bulk strings and replies are
//! read synchronously from the socket. One TCP connection is shared
//! behind a mutex; a connection that hits an I/O error is dropped and
//! re-established on the next command.

use crate::backend::KvBackend;
use crate::error::{BackendError, BackendResult};
use bytes::{BufMut, BytesMut};
use parking_lot::Mutex;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;
use tracing::{debug, warn};

/// Maximum bulk string size accepted from the server (512 MB, as Redis).
const MAX_BULK_SIZE: usize = 512 * 1024 * 1024;

/// Maximum length of a status, error or length line, CRLF included.
const MAX_LINE_SIZE: usize = 64 * 1024;

/// Maximum array nesting accepted from the server.
const MAX_NESTING_DEPTH: usize = 32;

/// A decoded RESP2 reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// `+OK`
    Simple(String),
    /// `-ERR message`
    Error(String),
    /// `:42`
    Integer(i64),
    /// `$3 foo`, or `$-1` for nil.
    Bulk(Option<String>),
    /// `*2 ...`, or `*-1` for nil.
    Array(Option<Vec<Reply>>),
}

/// Encodes a command as a RESP array of bulk strings.
pub(crate) fn encode_command(args: &[&str]) -> BytesMut {
    let mut buf = BytesMut::with_capacity(16 + args.iter().map(|a| a.len() + 16).sum::<usize>());
    buf.put_slice(format!("*{}\r\n", args.len()).as_bytes());
    for arg in args {
        buf.put_slice(format!("${}\r\n", arg.len()).as_bytes());
        buf.put_slice(arg.as_bytes());
        buf.put_slice(b"\r\n");
    }
    buf
}

/// Encodes a reply. Only the test server needs this direction.
#[cfg(test)]
pub(crate) fn encode_reply(reply: &Reply) -> BytesMut {
    let mut buf = BytesMut::new();
    match reply {
        Reply::Simple(s) => buf.put_slice(format!("+{s}\r\n").as_bytes()),
        Reply::Error(s) => buf.put_slice(format!("-{s}\r\n").as_bytes()),
        Reply::Integer(n) => buf.put_slice(format!(":{n}\r\n").as_bytes()),
        Reply::Bulk(None) => buf.put_slice(b"$-1\r\n"),
        Reply::Bulk(Some(s)) => {
            buf.put_slice(format!("${}\r\n", s.len()).as_bytes());
            buf.put_slice(s.as_bytes());
            buf.put_slice(b"\r\n");
        }
        Reply::Array(None) => buf.put_slice(b"*-1\r\n"),
        Reply::Array(Some(items)) => {
            buf.put_slice(format!("*{}\r\n", items.len()).as_bytes());
            for item in items {
                buf.extend_from_slice(&encode_reply(item));
            }
        }
    }
    buf
}

/// Reads one CRLF-terminated line, without the terminator.
fn read_line<R: BufRead>(reader: &mut R) -> BackendResult<String> {
    let mut line = Vec::new();
    let n = reader
        .by_ref()
        .take(MAX_LINE_SIZE as u64)
        .read_until(b'\n', &mut line)?;
    if n == MAX_LINE_SIZE && !line.ends_with(b"\n") {
        return Err(BackendError::protocol(format!(
            "reply line longer than {MAX_LINE_SIZE} bytes"
        )));
    }
    if n == 0 {
        return Err(BackendError::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "connection closed by server",
        )));
    }
    if !line.ends_with(b"\r\n") {
        return Err(BackendError::protocol("line not terminated by CRLF"));
    }
    line.truncate(line.len() - 2);
    String::from_utf8(line).map_err(|_| BackendError::protocol("invalid UTF-8 in reply line"))
}

fn parse_len(s: &str) -> BackendResult<i64> {
    s.parse::<i64>()
        .map_err(|_| BackendError::protocol(format!("invalid length: {s}")))
}

/// Reads one reply from the stream.
pub(crate) fn read_reply<R: BufRead>(reader: &mut R) -> BackendResult<Reply> {
    read_reply_at(reader, 0)
}

fn read_reply_at<R: BufRead>(reader: &mut R, depth: usize) -> BackendResult<Reply> {
    if depth > MAX_NESTING_DEPTH {
        return Err(BackendError::protocol("maximum nesting depth exceeded"));
    }

    let line = read_line(reader)?;
    let mut chars = line.chars();
    let prefix = chars.next();
    let rest = chars.as_str();
    match prefix {
        Some('+') => Ok(Reply::Simple(rest.to_string())),
        Some('-') => Ok(Reply::Error(rest.to_string())),
        Some(':') => rest
            .parse::<i64>()
            .map(Reply::Integer)
            .map_err(|_| BackendError::protocol("invalid integer")),
        Some('$') => {
            let len = parse_len(rest)?;
            if len < 0 {
                return Ok(Reply::Bulk(None));
            }
            let len = len as usize;
            if len > MAX_BULK_SIZE {
                return Err(BackendError::protocol(format!(
                    "bulk string too large: {len} > {MAX_BULK_SIZE}"
                )));
            }
            let mut data = vec![0u8; len + 2];
            reader.read_exact(&mut data)?;
            if &data[len..] != b"\r\n" {
                return Err(BackendError::protocol("missing CRLF after bulk string"));
            }
            data.truncate(len);
            String::from_utf8(data)
                .map(|s| Reply::Bulk(Some(s)))
                .map_err(|_| BackendError::protocol("bulk string is not valid UTF-8"))
        }
        Some('*') => {
            let len = parse_len(rest)?;
            if len < 0 {
                return Ok(Reply::Array(None));
            }
            let mut items = Vec::with_capacity((len as usize).min(1024));
            for _ in 0..len {
                items.push(read_reply_at(reader, depth + 1)?);
            }
            Ok(Reply::Array(Some(items)))
        }
        _ => Err(BackendError::protocol(format!(
            "unknown reply type: {line:?}"
        ))),
    }
}

/// Configuration for a [`RespBackend`] connection.
#[derive(Debug, Clone)]
pub struct RespConfig {
    /// Server address, `host:port`.
    pub address: String,
    /// Timeout for establishing the TCP connection (`None` = OS default).
    pub connect_timeout: Option<Duration>,
    /// Read and write timeout for each command (`None` = block forever).
    pub io_timeout: Option<Duration>,
    /// Database index selected after connecting.
    pub database: Option<u32>,
    /// Password sent with `AUTH` after connecting.
    pub password: Option<String>,
}

impl Default for RespConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:6379".to_string(),
            connect_timeout: Some(Duration::from_secs(5)),
            io_timeout: None,
            database: None,
            password: None,
        }
    }
}

impl RespConfig {
    /// Creates a configuration for the given address.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }

    /// Sets the connect timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets the per-command I/O timeout.
    #[must_use]
    pub fn io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = Some(timeout);
        self
    }

    /// Selects a database index after connecting.
    #[must_use]
    pub fn database(mut self, index: u32) -> Self {
        self.database = Some(index);
        self
    }

    /// Authenticates with a password after connecting.
    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }
}

/// One live socket.
struct RespStream {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl RespStream {
    fn connect(config: &RespConfig) -> BackendResult<Self> {
        let stream = match config.connect_timeout {
            Some(timeout) => {
                let mut last_err = None;
                let mut connected = None;
                for addr in config.address.to_socket_addrs()? {
                    match TcpStream::connect_timeout(&addr, timeout) {
                        Ok(s) => {
                            connected = Some(s);
                            break;
                        }
                        Err(e) => last_err = Some(e),
                    }
                }
                match connected {
                    Some(s) => s,
                    None => {
                        return Err(BackendError::Io(last_err.unwrap_or_else(|| {
                            std::io::Error::new(
                                std::io::ErrorKind::AddrNotAvailable,
                                format!("no address resolved for {}", config.address),
                            )
                        })))
                    }
                }
            }
            None => TcpStream::connect(&config.address)?,
        };
        stream.set_nodelay(true)?;
        stream.set_read_timeout(config.io_timeout)?;
        stream.set_write_timeout(config.io_timeout)?;

        let mut conn = Self {
            reader: BufReader::new(stream.try_clone()?),
            writer: stream,
        };

        if let Some(password) = &config.password {
            expect_ok("AUTH", conn.call(&["AUTH", password])?)?;
        }
        if let Some(db) = config.database {
            expect_ok("SELECT", conn.call(&["SELECT", &db.to_string()])?)?;
        }

        debug!(address = %config.address, "connected to RESP server");
        Ok(conn)
    }

    fn call(&mut self, args: &[&str]) -> BackendResult<Reply> {
        self.writer.write_all(&encode_command(args))?;
        self.writer.flush()?;
        read_reply(&mut self.reader)
    }
}

fn unexpected(command: &str, reply: &Reply) -> BackendError {
    BackendError::UnexpectedReply {
        command: command.to_string(),
        reply: format!("{reply:?}"),
    }
}

fn expect_ok(command: &str, reply: Reply) -> BackendResult<()> {
    match reply {
        Reply::Simple(_) => Ok(()),
        Reply::Error(msg) => Err(BackendError::Server(msg)),
        other => Err(unexpected(command, &other)),
    }
}

fn expect_integer(command: &str, reply: Reply) -> BackendResult<i64> {
    match reply {
        Reply::Integer(n) => Ok(n),
        other => Err(unexpected(command, &other)),
    }
}

fn expect_bulk(command: &str, reply: Reply) -> BackendResult<Option<String>> {
    match reply {
        Reply::Bulk(value) => Ok(value),
        other => Err(unexpected(command, &other)),
    }
}

fn expect_strings(command: &str, reply: Reply) -> BackendResult<Vec<String>> {
    match reply {
        Reply::Array(None) => Ok(Vec::new()),
        Reply::Array(Some(items)) => items
            .into_iter()
            .map(|item| match item {
                Reply::Bulk(Some(s)) | Reply::Simple(s) => Ok(s),
                other => Err(unexpected(command, &other)),
            })
            .collect(),
        other => Err(unexpected(command, &other)),
    }
}

/// A [`KvBackend`] speaking RESP2 to a Redis-compatible server.
///
/// # Thread Safety
///
/// Commands from different threads are serialized over one connection.
/// Open several backends to get parallel connections.
///
/// # Example
///
/// ```no_run
/// use kvrecord_backend::{KvBackend, RespBackend, RespConfig};
///
/// let backend = RespBackend::connect(RespConfig::new("127.0.0.1:6379")).unwrap();
/// let id = backend.incr("user:counter").unwrap();
/// ```
pub struct RespBackend {
    config: RespConfig,
    stream: Mutex<Option<RespStream>>,
}

impl std::fmt::Debug for RespBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RespBackend")
            .field("address", &self.config.address)
            .field("connected", &self.stream.lock().is_some())
            .finish()
    }
}

impl RespBackend {
    /// Connects to the server described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection, `AUTH` or `SELECT` fails.
    pub fn connect(config: RespConfig) -> BackendResult<Self> {
        let stream = RespStream::connect(&config)?;
        Ok(Self {
            config,
            stream: Mutex::new(Some(stream)),
        })
    }

    /// Returns the configuration this backend connects with.
    pub fn config(&self) -> &RespConfig {
        &self.config
    }

    /// Sends a raw command and returns the reply.
    ///
    /// Error replies are translated into [`BackendError`]s.
    pub fn command(&self, args: &[&str]) -> BackendResult<Reply> {
        let mut guard = self.stream.lock();
        let mut stream = match guard.take() {
            Some(stream) => stream,
            None => RespStream::connect(&self.config)?,
        };

        match stream.call(args) {
            Ok(reply) => {
                *guard = Some(stream);
                match reply {
                    Reply::Error(msg) => Err(translate_error(args, msg)),
                    reply => Ok(reply),
                }
            }
            Err(e) => {
                warn!(address = %self.config.address, error = %e, "dropping RESP connection");
                Err(e)
            }
        }
    }
}

fn translate_error(args: &[&str], msg: String) -> BackendError {
    let key = args.get(1).copied().unwrap_or_default();
    if msg.starts_with("WRONGTYPE") {
        BackendError::wrong_type(key)
    } else if msg.contains("not an integer") || msg.contains("overflow") {
        BackendError::not_an_integer(key)
    } else {
        BackendError::Server(msg)
    }
}

impl KvBackend for RespBackend {
    fn get(&self, key: &str) -> BackendResult<Option<String>> {
        expect_bulk("GET", self.command(&["GET", key])?)
    }

    fn set(&self, key: &str, value: &str) -> BackendResult<()> {
        expect_ok("SET", self.command(&["SET", key, value])?)
    }

    fn set_nx(&self, key: &str, value: &str) -> BackendResult<bool> {
        Ok(expect_integer("SETNX", self.command(&["SETNX", key, value])?)? == 1)
    }

    fn del(&self, key: &str) -> BackendResult<bool> {
        Ok(expect_integer("DEL", self.command(&["DEL", key])?)? > 0)
    }

    fn exists(&self, key: &str) -> BackendResult<bool> {
        Ok(expect_integer("EXISTS", self.command(&["EXISTS", key])?)? > 0)
    }

    fn incr(&self, key: &str) -> BackendResult<i64> {
        expect_integer("INCR", self.command(&["INCR", key])?)
    }

    fn hget(&self, key: &str, field: &str) -> BackendResult<Option<String>> {
        expect_bulk("HGET", self.command(&["HGET", key, field])?)
    }

    fn hset(&self, key: &str, field: &str, value: &str) -> BackendResult<bool> {
        Ok(expect_integer("HSET", self.command(&["HSET", key, field, value])?)? == 1)
    }

    fn hdel(&self, key: &str, field: &str) -> BackendResult<bool> {
        Ok(expect_integer("HDEL", self.command(&["HDEL", key, field])?)? > 0)
    }

    fn zadd(&self, key: &str, score: f64, member: &str) -> BackendResult<bool> {
        let score = score.to_string();
        Ok(expect_integer("ZADD", self.command(&["ZADD", key, &score, member])?)? == 1)
    }

    fn zrem(&self, key: &str, member: &str) -> BackendResult<bool> {
        Ok(expect_integer("ZREM", self.command(&["ZREM", key, member])?)? > 0)
    }

    fn zrange(&self, key: &str, start: i64, stop: i64) -> BackendResult<Vec<String>> {
        let (start, stop) = (start.to_string(), stop.to_string());
        expect_strings("ZRANGE", self.command(&["ZRANGE", key, &start, &stop])?)
    }

    fn rpush(&self, key: &str, value: &str) -> BackendResult<u64> {
        let len = expect_integer("RPUSH", self.command(&["RPUSH", key, value])?)?;
        Ok(len.max(0) as u64)
    }

    fn lrem(&self, key: &str, count: i64, value: &str) -> BackendResult<u64> {
        let count = count.to_string();
        let removed = expect_integer("LREM", self.command(&["LREM", key, &count, value])?)?;
        Ok(removed.max(0) as u64)
    }

    fn lrange(&self, key: &str, start: i64, stop: i64) -> BackendResult<Vec<String>> {
        let (start, stop) = (start.to_string(), stop.to_string());
        expect_strings("LRANGE", self.command(&["LRANGE", key, &start, &stop])?)
    }

    fn sadd(&self, key: &str, member: &str) -> BackendResult<bool> {
        Ok(expect_integer("SADD", self.command(&["SADD", key, member])?)? == 1)
    }

    fn srem(&self, key: &str, member: &str) -> BackendResult<bool> {
        Ok(expect_integer("SREM", self.command(&["SREM", key, member])?)? == 1)
    }

    fn smembers(&self, key: &str) -> BackendResult<Vec<String>> {
        expect_strings("SMEMBERS", self.command(&["SMEMBERS", key])?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryBackend;
    use std::io::Cursor;
    use std::net::TcpListener;
    use std::thread;

    fn parse(bytes: &[u8]) -> BackendResult<Reply> {
        read_reply(&mut Cursor::new(bytes.to_vec()))
    }

    fn bulk(s: &str) -> Reply {
        Reply::Bulk(Some(s.to_string()))
    }

    #[test]
    fn encode_command_as_bulk_array() {
        let buf = encode_command(&["SET", "user:id:1", "1"]);
        assert_eq!(&buf[..], b"*3\r\n$3\r\nSET\r\n$9\r\nuser:id:1\r\n$1\r\n1\r\n");
    }

    #[test]
    fn parse_simple_types() {
        assert_eq!(parse(b"+OK\r\n").unwrap(), Reply::Simple("OK".into()));
        assert_eq!(
            parse(b"-ERR boom\r\n").unwrap(),
            Reply::Error("ERR boom".into())
        );
        assert_eq!(parse(b":42\r\n").unwrap(), Reply::Integer(42));
        assert_eq!(parse(b"$-1\r\n").unwrap(), Reply::Bulk(None));
        assert_eq!(parse(b"*-1\r\n").unwrap(), Reply::Array(None));
        assert_eq!(parse(b"$0\r\n\r\n").unwrap(), bulk(""));
    }

    #[test]
    fn parse_nested_array() {
        let reply = parse(b"*2\r\n$1\r\n1\r\n*1\r\n:7\r\n").unwrap();
        assert_eq!(
            reply,
            Reply::Array(Some(vec![
                bulk("1"),
                Reply::Array(Some(vec![Reply::Integer(7)]))
            ]))
        );
    }

    #[test]
    fn parse_rejects_malformed_input() {
        assert!(matches!(parse(b"?x\r\n"), Err(BackendError::Protocol(_))));
        assert!(matches!(parse(b":abc\r\n"), Err(BackendError::Protocol(_))));
        assert!(matches!(parse(b"+OK\n"), Err(BackendError::Protocol(_))));
        assert!(matches!(
            parse(b"$3\r\nabcXY"),
            Err(BackendError::Protocol(_))
        ));
        assert!(matches!(parse(b""), Err(BackendError::Io(_))));
    }

    #[test]
    fn overlong_line_is_rejected() {
        let mut input = vec![b'+'];
        input.extend(std::iter::repeat(b'a').take(MAX_LINE_SIZE * 2));
        input.extend_from_slice(b"\r\n");

        assert!(matches!(parse(&input), Err(BackendError::Protocol(_))));
    }

    #[test]
    fn line_just_under_limit_is_accepted() {
        let mut input = vec![b'+'];
        input.extend(std::iter::repeat(b'a').take(MAX_LINE_SIZE - 3));
        input.extend_from_slice(b"\r\n");

        let Reply::Simple(s) = parse(&input).unwrap() else {
            panic!("expected a simple string");
        };
        assert_eq!(s.len(), MAX_LINE_SIZE - 3);
    }

    #[test]
    fn encoded_replies_parse_back() {
        let reply = Reply::Array(Some(vec![
            bulk("a"),
            Reply::Bulk(None),
            Reply::Integer(-3),
            Reply::Simple("OK".into()),
        ]));
        assert_eq!(parse(&encode_reply(&reply)).unwrap(), reply);
    }

    #[test]
    fn translate_error_kinds() {
        assert!(matches!(
            translate_error(&["HGET", "k", "f"], "WRONGTYPE Operation".into()),
            BackendError::WrongType { key } if key == "k"
        ));
        assert!(matches!(
            translate_error(&["INCR", "c"], "ERR value is not an integer or out of range".into()),
            BackendError::NotAnInteger { .. }
        ));
        assert!(matches!(
            translate_error(&["FOO"], "ERR unknown command".into()),
            BackendError::Server(_)
        ));
    }

    fn ok() -> Reply {
        Reply::Simple("OK".into())
    }

    fn int(b: bool) -> Reply {
        Reply::Integer(i64::from(b))
    }

    fn strings(items: Vec<String>) -> Reply {
        Reply::Array(Some(items.into_iter().map(|s| Reply::Bulk(Some(s))).collect()))
    }

    /// Answers one command against an in-memory store, Redis style.
    fn dispatch(store: &InMemoryBackend, args: &[String]) -> Reply {
        let a: Vec<&str> = args.iter().map(String::as_str).collect();
        let result = match a.as_slice() {
            ["GET", k] => store.get(k).map(Reply::Bulk),
            ["SET", k, v] => store.set(k, v).map(|_| ok()),
            ["SETNX", k, v] => store.set_nx(k, v).map(int),
            ["DEL", k] => store.del(k).map(int),
            ["EXISTS", k] => store.exists(k).map(int),
            ["INCR", k] => store.incr(k).map(Reply::Integer),
            ["HGET", k, f] => store.hget(k, f).map(Reply::Bulk),
            ["HSET", k, f, v] => store.hset(k, f, v).map(int),
            ["HDEL", k, f] => store.hdel(k, f).map(int),
            ["ZADD", k, s, m] => store.zadd(k, s.parse().unwrap(), m).map(int),
            ["ZREM", k, m] => store.zrem(k, m).map(int),
            ["ZRANGE", k, s, e] => store
                .zrange(k, s.parse().unwrap(), e.parse().unwrap())
                .map(strings),
            ["RPUSH", k, v] => store.rpush(k, v).map(|n| Reply::Integer(n as i64)),
            ["LREM", k, c, v] => store
                .lrem(k, c.parse().unwrap(), v)
                .map(|n| Reply::Integer(n as i64)),
            ["LRANGE", k, s, e] => store
                .lrange(k, s.parse().unwrap(), e.parse().unwrap())
                .map(strings),
            ["SADD", k, m] => store.sadd(k, m).map(int),
            ["SREM", k, m] => store.srem(k, m).map(int),
            ["SMEMBERS", k] => store.smembers(k).map(strings),
            ["AUTH", _] | ["SELECT", _] => Ok(ok()),
            _ => return Reply::Error("ERR unknown command".into()),
        };
        match result {
            Ok(reply) => reply,
            Err(BackendError::WrongType { .. }) => Reply::Error(
                "WRONGTYPE Operation against a key holding the wrong kind of value".into(),
            ),
            Err(BackendError::NotAnInteger { .. }) => {
                Reply::Error("ERR value is not an integer or out of range".into())
            }
            Err(e) => Reply::Error(format!("ERR {e}")),
        }
    }

    /// Spawns a single-connection server backed by an in-memory store.
    fn spawn_server() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap().to_string();
        thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut writer = stream.try_clone().unwrap();
            let mut reader = BufReader::new(stream);
            let store = InMemoryBackend::new();
            while let Ok(Reply::Array(Some(items))) = read_reply(&mut reader) {
                let args: Vec<String> = items
                    .into_iter()
                    .map(|item| match item {
                        Reply::Bulk(Some(s)) => s,
                        _ => String::new(),
                    })
                    .collect();
                let reply = dispatch(&store, &args);
                if writer.write_all(&encode_reply(&reply)).is_err() {
                    break;
                }
            }
        });
        address
    }

    #[test]
    fn resp_backend_round_trips_commands() {
        let address = spawn_server();
        let backend = RespBackend::connect(
            RespConfig::new(address)
                .database(0)
                .password("secret")
                .io_timeout(Duration::from_secs(5)),
        )
        .unwrap();

        assert_eq!(backend.incr("user:counter").unwrap(), 1);
        assert_eq!(backend.incr("user:counter").unwrap(), 2);

        backend.set("user:id:1", "1").unwrap();
        assert_eq!(backend.get("user:id:1").unwrap().as_deref(), Some("1"));
        assert!(backend.exists("user:id:1").unwrap());
        assert!(!backend.set_nx("user:id:1", "9").unwrap());
        assert!(backend.set_nx("user:name:fred", "1").unwrap());

        assert!(backend.hset("user:id:1:hash", "name", "Fred").unwrap());
        assert_eq!(
            backend.hget("user:id:1:hash", "name").unwrap().as_deref(),
            Some("Fred")
        );
        assert_eq!(backend.hget("user:id:1:hash", "email").unwrap(), None);
        assert!(backend.hdel("user:id:1:hash", "name").unwrap());

        backend.zadd("user:all", 2.0, "2").unwrap();
        backend.zadd("user:all", 1.0, "1").unwrap();
        assert_eq!(backend.zrange("user:all", 0, -1).unwrap(), vec!["1", "2"]);
        assert!(backend.zrem("user:all", "1").unwrap());

        assert_eq!(backend.rpush("list", "a").unwrap(), 1);
        assert_eq!(backend.lrange("list", 0, -1).unwrap(), vec!["a"]);
        assert_eq!(backend.lrem("list", 0, "a").unwrap(), 1);

        assert!(backend.sadd("set", "x").unwrap());
        assert_eq!(backend.smembers("set").unwrap(), vec!["x"]);
        assert!(backend.srem("set", "x").unwrap());

        assert!(backend.del("user:id:1").unwrap());
        assert_eq!(backend.get("user:id:1").unwrap(), None);
    }

    #[test]
    fn resp_backend_translates_server_errors() {
        let address = spawn_server();
        let backend = RespBackend::connect(RespConfig::new(address)).unwrap();

        backend.set("k", "v").unwrap();
        assert!(matches!(
            backend.hget("k", "f"),
            Err(BackendError::WrongType { .. })
        ));
        assert!(matches!(
            backend.incr("k"),
            Err(BackendError::NotAnInteger { .. })
        ));
        assert!(matches!(
            backend.command(&["FLUSHALL"]),
            Err(BackendError::Server(_))
        ));
        // The connection is still usable after error replies.
        assert_eq!(backend.get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn resp_backend_connect_failure_is_io_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap().to_string();
        drop(listener);

        let result = RespBackend::connect(
            RespConfig::new(address).connect_timeout(Duration::from_millis(200)),
        );
        assert!(matches!(result, Err(BackendError::Io(_))));
    }

    mod codec_properties {
        use super::super::{encode_reply, read_reply, Reply};
        use proptest::prelude::*;
        use std::io::Cursor;

        fn reply_strategy() -> impl Strategy<Value = Reply> {
            let leaf = prop_oneof![
                "[^\r\n]{0,16}".prop_map(Reply::Simple),
                "[^\r\n]{0,16}".prop_map(Reply::Error),
                any::<i64>().prop_map(Reply::Integer),
                Just(Reply::Bulk(None)),
                any::<String>().prop_map(|s| Reply::Bulk(Some(s))),
                Just(Reply::Array(None)),
            ];
            leaf.prop_recursive(4, 32, 6, |inner| {
                prop::collection::vec(inner, 0..6).prop_map(|items| Reply::Array(Some(items)))
            })
        }

        proptest! {
            #[test]
            fn encoded_reply_reads_back(reply in reply_strategy()) {
                let encoded = encode_reply(&reply);
                let mut cursor = Cursor::new(encoded.to_vec());
                prop_assert_eq!(read_reply(&mut cursor).unwrap(), reply);
                prop_assert_eq!(cursor.position() as usize, encoded.len());
            }

            #[test]
            fn truncated_reply_is_an_error(reply in reply_strategy(), cut in 1usize..8) {
                let encoded = encode_reply(&reply);
                let keep = encoded.len().saturating_sub(cut);
                let mut cursor = Cursor::new(encoded[..keep].to_vec());
                prop_assert!(read_reply(&mut cursor).is_err());
            }
        }
    }
}
