//! OSC listener for external control surfaces
//!
//! Receives control messages over UDP and routes them into the per-topic
//! latest-wins channels. The address is the topic name (`/drum1`,
//! `/synth`, `/note3`, ...); the first numeric argument is the selector,
//! the second - when present - the value. Single-argument messages carry
//! their argument in both positions, so value-only topics (note pitches,
//! reverb amount) decode without a special case.

use crate::channel::{ControlMessage, Publisher};
use rosc::{OscMessage, OscPacket, OscType};
use std::collections::HashMap;
use std::net::UdpSocket;
use tracing::{debug, info, warn};

pub struct OscListener {
    socket: UdpSocket,
    topics: HashMap<&'static str, Publisher>,
}

impl OscListener {
    /// Bind the control socket. One publisher per declared topic; topics
    /// are fixed at startup, like the loop set itself.
    pub fn bind(
        port: u16,
        topics: HashMap<&'static str, Publisher>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let addr = format!("0.0.0.0:{port}");
        let socket = UdpSocket::bind(&addr)?;
        socket.set_nonblocking(true)?;
        info!("control listener on {addr} ({} topics)", topics.len());
        Ok(Self { socket, topics })
    }

    /// Poll the socket forever, decoding and publishing. Malformed
    /// packets and unknown addresses are logged and dropped - control
    /// input can degrade but never stop the music.
    pub async fn run(self) {
        let mut buf = [0u8; 65536];
        loop {
            match self.socket.recv_from(&mut buf) {
                Ok((size, from)) => {
                    debug!("received {size} bytes from {from}");
                    match rosc::decoder::decode_udp(&buf[..size]) {
                        Ok((_, packet)) => self.handle_packet(packet),
                        Err(e) => warn!("failed to decode OSC packet: {e}"),
                    }
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    tokio::time::sleep(tokio::time::Duration::from_millis(1)).await;
                }
                Err(e) => warn!("control socket error: {e}"),
            }
        }
    }

    fn handle_packet(&self, packet: OscPacket) {
        match packet {
            OscPacket::Message(msg) => self.handle_message(msg),
            OscPacket::Bundle(bundle) => {
                for inner in bundle.content {
                    self.handle_packet(inner);
                }
            }
        }
    }

    fn handle_message(&self, msg: OscMessage) {
        let topic = msg.addr.trim_start_matches('/');
        let Some(publisher) = self.topics.get(topic) else {
            warn!(addr = msg.addr, "unknown control address ignored");
            return;
        };
        match decode_args(&msg.args) {
            Some(control) => publisher.publish(control),
            None => warn!(addr = msg.addr, "non-numeric control message ignored"),
        }
    }
}

/// Decode OSC arguments into `(selector, value)`.
pub fn decode_args(args: &[OscType]) -> Option<ControlMessage> {
    let first = args.first().and_then(numeric)?;
    let value = args.get(1).and_then(numeric).unwrap_or(first);
    Some(ControlMessage::new(first as i32, value))
}

fn numeric(arg: &OscType) -> Option<f32> {
    match arg {
        OscType::Int(v) => Some(*v as f32),
        OscType::Float(v) => Some(*v),
        OscType::Double(v) => Some(*v as f32),
        OscType::Long(v) => Some(*v as f32),
        _ => None,
    }
}
