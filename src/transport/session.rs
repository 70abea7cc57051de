//! Whole-message exchange over a TCP connection.
//!
//! [`Transport`] composes a [`TcpConnection`] with the packet framer: outbound
//! messages are wrapped in chunk framing and written; inbound bytes are read,
//! the framing stripped, and the message parsed. There is no buffering across
//! calls and no pipelining — each send is followed by one receive.

use std::time::Duration;

use crate::codec::Message;
use crate::core::constants::DEFAULT_FRAGMENT_SIZE;
use crate::core::error::WinboxError;
use crate::framing::{wire_complete, Packet};

use super::connection::TcpConnection;

/// Sends and receives whole messages over one TCP connection.
#[derive(Debug)]
pub struct Transport {
    conn: TcpConnection,
}

impl Transport {
    /// Connect to `host:port` within the given timeout.
    pub async fn connect(host: &str, port: u16, timeout: Duration) -> Result<Self, WinboxError> {
        Ok(Self {
            conn: TcpConnection::connect(host, port, timeout).await?,
        })
    }

    /// Wrap an existing connection.
    pub fn new(conn: TcpConnection) -> Self {
        Self { conn }
    }

    /// Access the underlying connection.
    pub fn connection(&mut self) -> &mut TcpConnection {
        &mut self.conn
    }

    /// Send a packet, wrapping it first if it is still headerless.
    pub async fn send(&mut self, mut packet: Packet) -> Result<(), WinboxError> {
        if !packet.has_header() {
            packet.wrap()?;
        }
        self.conn.send_bytes(packet.raw()).await
    }

    /// Serialize and send one message.
    pub async fn send_message(&mut self, msg: &Message) -> Result<(), WinboxError> {
        let raw = msg.to_bytes()?;
        self.send(Packet::new(raw)).await
    }

    /// Read up to `max` bytes once and strip the packet framing.
    ///
    /// The caller must size `max` for the expected reply; replies whose chunk
    /// chain spans multiple reads need [`Transport::receive_complete`].
    pub async fn receive(&mut self, max: usize) -> Result<Packet, WinboxError> {
        let bytes = self.conn.recv_bytes(max).await?;
        let mut pkt = Packet::new(bytes);
        pkt.unwrap()?;
        Ok(pkt)
    }

    /// Read `fragment_size`-byte fragments until the chunk chain is complete,
    /// then strip the framing.
    pub async fn receive_complete(&mut self, fragment_size: usize) -> Result<Packet, WinboxError> {
        let mut buf = Vec::new();
        loop {
            let bytes = self.conn.recv_bytes(fragment_size).await?;
            buf.extend_from_slice(&bytes);
            if wire_complete(&buf)? {
                break;
            }
        }
        let mut pkt = Packet::new(buf);
        pkt.unwrap()?;
        Ok(pkt)
    }

    /// Receive one reply (default fragment size) and parse it as a message.
    pub async fn receive_message(&mut self) -> Result<Message, WinboxError> {
        let pkt = self.receive_complete(DEFAULT_FRAGMENT_SIZE).await?;
        Ok(Message::parse_bytes(pkt.raw())?)
    }

    /// Shut down the connection.
    pub async fn close(self) -> Result<(), WinboxError> {
        self.conn.close().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DEFAULT_TIMEOUT;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_message_roundtrip_over_tcp() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 2048];
            let n = sock.read(&mut buf).await.unwrap();

            let mut pkt = Packet::new(buf[..n].to_vec());
            pkt.unwrap().unwrap();
            let request = Message::parse_bytes(pkt.raw()).unwrap();
            assert_eq!(request.get_u32(1).unwrap(), Some(7));

            let mut reply = Message::new();
            reply.add_u32(2, 99);
            let mut out = Packet::new(reply.to_bytes().unwrap());
            out.wrap().unwrap();
            sock.write_all(out.raw()).await.unwrap();
        });

        let mut transport = Transport::connect("127.0.0.1", addr.port(), DEFAULT_TIMEOUT)
            .await
            .unwrap();

        let mut request = Message::new();
        request.add_u32(1, 7);
        transport.send_message(&request).await.unwrap();

        let reply = transport.receive_message().await.unwrap();
        assert_eq!(reply.get_u32(2).unwrap(), Some(99));
    }

    #[tokio::test]
    async fn test_receive_complete_reassembles_chunks() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // A reply far larger than one fragment, written in two bursts.
        let payload = vec![0x5a; 5000];
        let expected = payload.clone();
        tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();

            let mut reply = Message::new();
            reply.add_raw(3, payload);
            let mut out = Packet::new(reply.to_bytes().unwrap());
            out.wrap().unwrap();

            let bytes = out.raw();
            let split = bytes.len() / 2;
            sock.write_all(&bytes[..split]).await.unwrap();
            sock.flush().await.unwrap();
            tokio::time::sleep(Duration::from_millis(20)).await;
            sock.write_all(&bytes[split..]).await.unwrap();
        });

        let mut transport = Transport::connect("127.0.0.1", addr.port(), DEFAULT_TIMEOUT)
            .await
            .unwrap();
        let pkt = transport.receive_complete(1460).await.unwrap();
        let reply = Message::parse_bytes(pkt.raw()).unwrap();
        assert_eq!(reply.get_raw(3).unwrap(), Some(expected.as_slice()));
    }

    #[tokio::test]
    async fn test_send_wraps_headerless_packets() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 256];
            let n = sock.read(&mut buf).await.unwrap();
            // First two framing bytes: total length, chain-start marker.
            assert_eq!(buf[1], 0x01);
            assert_eq!(&buf[4..6], b"M2");
            sock.write_all(&buf[..n]).await.unwrap();
        });

        let mut transport = Transport::connect("127.0.0.1", addr.port(), DEFAULT_TIMEOUT)
            .await
            .unwrap();
        let mut msg = Message::new();
        msg.add_u32(1, 1);
        transport.send_message(&msg).await.unwrap();
        let echoed = transport.receive_message().await.unwrap();
        assert_eq!(echoed, msg);
    }
}
