//! TCP-backed channel handles: the runtime side of `c_channel`/`s_channel`.
//!
//! Each handle exclusively owns its OS socket (invariant 5). Closing is
//! idempotent: the socket is dropped and further operations raise
//! `RuntimeError::ChannelClosed` rather than erroring on the underlying fd.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};

use parking_lot::Mutex;

use crate::error::RuntimeError;

struct Streams {
    writer: TcpStream,
    reader: BufReader<TcpStream>,
}

/// A single client/server connection: the handle behind `c_channel` and the
/// per-client connections `accept()` returns.
pub struct ChannelHandle {
    streams: Mutex<Option<Streams>>,
}

impl ChannelHandle {
    pub fn connect(host: &str, port: f64) -> Result<Self, RuntimeError> {
        let addr = format!("{}:{}", host, port as u16);
        let stream = TcpStream::connect(&addr).map_err(|e| RuntimeError::Io(e.to_string()))?;
        Ok(Self::from_stream(stream))
    }

    pub fn from_stream(stream: TcpStream) -> Self {
        let reader_stream = stream.try_clone().expect("tcp stream try_clone");
        ChannelHandle {
            streams: Mutex::new(Some(Streams {
                writer: stream,
                reader: BufReader::new(reader_stream),
            })),
        }
    }

    pub fn send(&self, payload: &str) -> Result<(), RuntimeError> {
        let mut guard = self.streams.lock();
        let streams = guard.as_mut().ok_or(RuntimeError::ChannelClosed)?;
        streams
            .writer
            .write_all(payload.as_bytes())
            .and_then(|_| streams.writer.write_all(b"\n"))
            .and_then(|_| streams.writer.flush())
            .map_err(|e| RuntimeError::Io(e.to_string()))
    }

    pub fn recv(&self) -> Result<String, RuntimeError> {
        let mut guard = self.streams.lock();
        let streams = guard.as_mut().ok_or(RuntimeError::ChannelClosed)?;
        let mut line = String::new();
        let n = streams
            .reader
            .read_line(&mut line)
            .map_err(|e| RuntimeError::Io(e.to_string()))?;
        if n == 0 {
            return Ok(String::new()); // EOF
        }
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(line)
    }

    pub fn close(&self) {
        *self.streams.lock() = None;
    }
}

/// A bound TCP listener: the handle behind `s_channel`.
pub struct ListenerHandle {
    listener: Mutex<Option<TcpListener>>,
}

impl ListenerHandle {
    pub fn bind(host: &str, port: f64) -> Result<Self, RuntimeError> {
        let addr = format!("{}:{}", host, port as u16);
        let listener = TcpListener::bind(&addr).map_err(|e| RuntimeError::Io(e.to_string()))?;
        Ok(ListenerHandle {
            listener: Mutex::new(Some(listener)),
        })
    }

    pub fn accept(&self) -> Result<ChannelHandle, RuntimeError> {
        let guard = self.listener.lock();
        let listener = guard.as_ref().ok_or(RuntimeError::ChannelClosed)?;
        let (stream, _addr) = listener.accept().map_err(|e| RuntimeError::Io(e.to_string()))?;
        Ok(ChannelHandle::from_stream(stream))
    }

    pub fn close(&self) {
        *self.listener.lock() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn echo_round_trip() {
        let listener = ListenerHandle::bind("127.0.0.1", 0.0).unwrap();
        let port = {
            let guard = listener.listener.lock();
            guard.as_ref().unwrap().local_addr().unwrap().port()
        };

        let server = thread::spawn(move || {
            let conn = listener.accept().unwrap();
            let msg = conn.recv().unwrap();
            conn.send(&msg).unwrap();
            conn.close();
            listener.close();
        });

        let client = ChannelHandle::connect("127.0.0.1", port as f64).unwrap();
        client.send("hi").unwrap();
        let echoed = client.recv().unwrap();
        client.close();
        server.join().unwrap();

        assert_eq!(echoed, "hi");
    }

    #[test]
    fn double_close_is_a_no_op() {
        let listener = ListenerHandle::bind("127.0.0.1", 0.0).unwrap();
        listener.close();
        listener.close();
        assert!(matches!(listener.accept(), Err(RuntimeError::ChannelClosed)));
    }

    #[test]
    fn send_after_close_is_channel_closed_error() {
        let listener = ListenerHandle::bind("127.0.0.1", 0.0).unwrap();
        let port = {
            let guard = listener.listener.lock();
            guard.as_ref().unwrap().local_addr().unwrap().port()
        };
        let server = thread::spawn(move || {
            let conn = listener.accept().unwrap();
            conn.close();
        });
        let client = ChannelHandle::connect("127.0.0.1", port as f64).unwrap();
        client.close();
        server.join().unwrap();
        assert!(matches!(client.send("x"), Err(RuntimeError::ChannelClosed)));
    }
}
