//! MQTT client for remote parameter changes
//!
//! Connects to an MQTT broker and subscribes to a topic. Payloads are JSON
//! parameter patches (`{"size": 80, "angle": -300}`) or plain control
//! commands (`outline toggle`); both are forwarded to the main loop.

use crate::control::{parse_command, Command};
use anyhow::{anyhow, Context, Result};
use rumqttc::{Client, Event, MqttOptions, Packet, QoS};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

const DEFAULT_PORT: u16 = 1883;
const DEFAULT_TOPIC: &str = "kaleidoscope";

/// MQTT client that receives commands in a background thread
pub struct MqttClient {
    receiver: Receiver<Command>,
    _thread: thread::JoinHandle<()>,
}

impl MqttClient {
    /// Create a new MQTT client and connect to the broker.
    /// Fails immediately if connection cannot be established.
    pub fn new(host: &str, topic: &str) -> Result<Self> {
        let topic = if topic.is_empty() { DEFAULT_TOPIC } else { topic };

        let mut options = MqttOptions::new("kaleidoscope", host, DEFAULT_PORT);
        options.set_keep_alive(Duration::from_secs(30));

        let (client, mut connection) = Client::new(options, 10);

        client
            .subscribe(topic, QoS::AtMostOnce)
            .with_context(|| format!("failed to subscribe to topic '{}'", topic))?;

        // Test connection by polling once - fail fast if broker unreachable
        match connection.iter().next() {
            Some(Ok(_)) => {},
            Some(Err(e)) => {
                return Err(anyhow!(e).context(format!(
                    "failed to connect to MQTT broker at {}:{}",
                    host, DEFAULT_PORT
                )));
            },
            None => {
                return Err(anyhow!(
                    "failed to connect to MQTT broker at {}:{} - connection closed",
                    host,
                    DEFAULT_PORT
                ));
            },
        }

        let (sender, receiver) = mpsc::channel();
        let topic_owned = topic.to_string();

        let handle = thread::spawn(move || {
            Self::message_loop(connection, sender, &topic_owned);
        });

        info!(host, port = DEFAULT_PORT, topic, "MQTT connected");

        Ok(Self {
            receiver,
            _thread: handle,
        })
    }

    fn message_loop(mut connection: rumqttc::Connection, sender: Sender<Command>, topic: &str) {
        for event in connection.iter() {
            match event {
                Ok(Event::Incoming(Packet::Publish(publish))) if publish.topic == topic => {
                    let Ok(text) = String::from_utf8(publish.payload.to_vec()) else {
                        warn!("MQTT payload is not UTF-8");
                        continue;
                    };
                    match parse_command(&text) {
                        Some(cmd) => {
                            debug!(?cmd, "MQTT command");
                            if sender.send(cmd).is_err() {
                                // Main thread gone, exit
                                break;
                            }
                        },
                        None => warn!(payload = %text.trim(), "ignoring MQTT message"),
                    }
                },
                Ok(_) => {},
                Err(e) => {
                    warn!("MQTT error: {}", e);
                    // Continue trying - connection may recover
                },
            }
        }
    }

    /// Drain all pending commands (non-blocking)
    pub fn poll(&self) -> Vec<Command> {
        let mut commands = Vec::new();
        while let Ok(cmd) = self.receiver.try_recv() {
            commands.push(cmd);
        }
        commands
    }

    /// Default MQTT topic
    pub fn default_topic() -> &'static str {
        DEFAULT_TOPIC
    }
}
