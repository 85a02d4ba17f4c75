//! Minimal Discord gateway client
//!
//! Only what the reaction feedback needs: heartbeat, identify with the
//! guild-message-reactions intent, and `MESSAGE_REACTION_ADD` dispatches.

use crate::error::{BotError, Result};
use crate::types::{ChannelRef, MessageRef};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

/// GUILD_MESSAGE_REACTIONS
pub const REACTION_INTENTS: u64 = 1 << 10;

const RECONNECT_DELAY: Duration = Duration::from_secs(5);

mod opcode {
    pub const DISPATCH: u8 = 0;
    pub const HEARTBEAT: u8 = 1;
    pub const IDENTIFY: u8 = 2;
    pub const RECONNECT: u8 = 7;
    pub const INVALID_SESSION: u8 = 9;
    pub const HELLO: u8 = 10;
}

/// A reaction added to a message the bot can see
#[derive(Debug, Clone, PartialEq)]
pub struct ReactionEvent {
    /// `None` for direct messages
    pub guild_id: Option<String>,
    pub channel: ChannelRef,
    pub message: MessageRef,
    pub user_id: String,
    pub user_name: String,
    pub emoji: String,
    /// Added by the bot itself
    pub is_self: bool,
}

#[derive(Debug, Deserialize)]
pub struct GatewayPayload {
    pub op: u8,
    #[serde(default)]
    pub d: Value,
    pub s: Option<u64>,
    pub t: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReactionAdd {
    user_id: String,
    channel_id: String,
    message_id: String,
    guild_id: Option<String>,
    emoji: ReactionEmoji,
    member: Option<ReactionMember>,
}

#[derive(Debug, Deserialize)]
struct ReactionEmoji {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReactionMember {
    nick: Option<String>,
    user: Option<ReactionUser>,
}

#[derive(Debug, Deserialize)]
struct ReactionUser {
    username: String,
    global_name: Option<String>,
}

/// Parse a `MESSAGE_REACTION_ADD` payload
pub fn reaction_event(d: &Value, bot_user_id: Option<&str>) -> Option<ReactionEvent> {
    let add = ReactionAdd::deserialize(d).ok()?;
    let emoji = add.emoji.name?;

    let user_name = add
        .member
        .and_then(|m| {
            m.nick
                .or_else(|| m.user.map(|u| u.global_name.unwrap_or(u.username)))
        })
        .unwrap_or_else(|| add.user_id.clone());

    Some(ReactionEvent {
        is_self: bot_user_id == Some(add.user_id.as_str()),
        guild_id: add.guild_id,
        channel: ChannelRef::new(add.channel_id),
        message: MessageRef(add.message_id),
        user_id: add.user_id,
        user_name,
        emoji,
    })
}

pub fn identify_payload(token: &str) -> Value {
    json!({
        "op": opcode::IDENTIFY,
        "d": {
            "token": token,
            "intents": REACTION_INTENTS,
            "properties": { "os": std::env::consts::OS, "browser": "fintwit-bot", "device": "fintwit-bot" }
        }
    })
}

pub fn heartbeat_payload(sequence: Option<u64>) -> Value {
    json!({ "op": opcode::HEARTBEAT, "d": sequence })
}

pub struct ReactionListener {
    gateway_url: String,
    bot_token: String,
}

impl ReactionListener {
    pub fn new(gateway_url: &str, bot_token: &str) -> Self {
        Self {
            gateway_url: gateway_url.to_string(),
            bot_token: bot_token.to_string(),
        }
    }

    /// Forward reactions until the receiver is dropped, reconnecting on failure
    pub async fn run(self, tx: mpsc::Sender<ReactionEvent>) {
        info!("Starting Discord gateway listener");

        loop {
            match self.connect_and_listen(&tx).await {
                Ok(()) if tx.is_closed() => {
                    info!("Reaction receiver closed, stopping gateway listener");
                    return;
                }
                Ok(()) => warn!("Discord gateway disconnected, reconnecting..."),
                Err(e) => error!("Discord gateway error: {}, reconnecting in 5s...", e),
            }
            tokio::time::sleep(RECONNECT_DELAY).await;
        }
    }

    async fn connect_and_listen(&self, tx: &mpsc::Sender<ReactionEvent>) -> Result<()> {
        let (ws_stream, _) = connect_async(self.gateway_url.as_str())
            .await
            .map_err(|e| BotError::WebSocket(e.to_string()))?;
        let (mut write, mut read) = ws_stream.split();

        info!("Connected to Discord gateway");

        let mut sequence: Option<u64> = None;
        let mut bot_user_id: Option<String> = None;
        let mut heartbeat: Option<tokio::time::Interval> = None;

        loop {
            let next_beat = async {
                match heartbeat.as_mut() {
                    Some(interval) => {
                        interval.tick().await;
                    }
                    None => std::future::pending::<()>().await,
                }
            };

            tokio::select! {
                _ = next_beat => {
                    write
                        .send(Message::Text(heartbeat_payload(sequence).to_string().into()))
                        .await
                        .map_err(|e| BotError::WebSocket(e.to_string()))?;
                }
                msg = read.next() => {
                    let text = match msg {
                        Some(Ok(Message::Text(text))) => text,
                        Some(Ok(Message::Close(frame))) => {
                            warn!("Gateway closed by server: {:?}", frame);
                            return Ok(());
                        }
                        Some(Ok(_)) => continue,
                        Some(Err(e)) => return Err(BotError::WebSocket(e.to_string())),
                        None => return Ok(()),
                    };

                    let payload: GatewayPayload = match serde_json::from_str(&text) {
                        Ok(p) => p,
                        Err(e) => {
                            debug!("Skipping unparseable gateway frame: {}", e);
                            continue;
                        }
                    };
                    if payload.s.is_some() {
                        sequence = payload.s;
                    }

                    match payload.op {
                        opcode::HELLO => {
                            let millis = payload.d["heartbeat_interval"].as_u64().unwrap_or(41_250);
                            let mut interval = tokio::time::interval(Duration::from_millis(millis));
                            // First tick fires immediately
                            interval.tick().await;
                            heartbeat = Some(interval);

                            write
                                .send(Message::Text(identify_payload(&self.bot_token).to_string().into()))
                                .await
                                .map_err(|e| BotError::WebSocket(e.to_string()))?;
                        }
                        opcode::RECONNECT | opcode::INVALID_SESSION => {
                            warn!("Gateway requested a new session");
                            return Ok(());
                        }
                        opcode::DISPATCH => match payload.t.as_deref() {
                            Some("READY") => {
                                bot_user_id = payload.d["user"]["id"].as_str().map(str::to_string);
                                info!("Gateway ready as user {:?}", bot_user_id);
                            }
                            Some("MESSAGE_REACTION_ADD") => {
                                if let Some(event) = reaction_event(&payload.d, bot_user_id.as_deref()) {
                                    if tx.send(event).await.is_err() {
                                        return Ok(());
                                    }
                                }
                            }
                            _ => {}
                        },
                        _ => {}
                    }
                }
            }
        }
    }
}
