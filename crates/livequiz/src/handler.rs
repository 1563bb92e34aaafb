//! Per-connection handler: request dispatch and event push.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The task waits on three things at once:
//!
//! ```text
//!   client frame ──▶ decode ──▶ dispatch ──▶ reply frame
//!   watched event ─────────────────────────▶ Event frame
//!   idle deadline ─────────────────────────▶ close
//! ```
//!
//! The idle deadline only runs while nothing is watched. A watching
//! connection stays open for as long as its session does.
//!
//! The connection remembers at most one joined player (the identity used
//! by `Answer`) and at most one watch subscription. The subscription is a
//! [`Listener`], so it unsubscribes itself on every exit path.

use std::sync::Arc;
use std::time::Instant;

use livequiz_broadcast::Listener;
use livequiz_protocol::{
    ClientMessage, Codec, Envelope, ProtocolError, ServerMessage, SessionCode,
};
use livequiz_session::{SessionError, SessionRef};
use livequiz_transport::{WebSocketConnection, WsSender};

use crate::LiveQuizError;
use crate::server::ServerState;

/// The player this connection speaks for.
struct Identity {
    session: SessionRef,
    name: String,
}

/// The session this connection receives events from.
struct Watch {
    code: SessionCode,
    listener: Listener,
}

/// What to do after a request has been handled.
enum Reply {
    Send(ServerMessage),
    Close,
}

/// Outbound half plus per-connection numbering.
struct Outbound<'a, C: Codec> {
    sender: WsSender,
    codec: &'a C,
    seq: u64,
    start: Instant,
}

impl<C: Codec> Outbound<'_, C> {
    async fn send(&mut self, payload: ServerMessage) -> Result<(), LiveQuizError> {
        let envelope = Envelope::new(
            next_seq(&mut self.seq),
            self.start.elapsed().as_millis() as u64,
            payload,
        );
        let text = self.codec.encode(&envelope)?;
        self.sender.send_text(text).await?;
        Ok(())
    }

    async fn send_error(&mut self, err: &LiveQuizError) -> Result<(), LiveQuizError> {
        self.send(ServerMessage::Error {
            code: err.code(),
            message: err.to_string(),
        })
        .await
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), LiveQuizError> {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, peer = %conn.peer_addr(), "handling new connection");

    let (sender, mut receiver) = conn.split();
    let mut out = Outbound {
        sender,
        codec: &state.codec,
        seq: 1,
        start: Instant::now(),
    };
    let mut identity: Option<Identity> = None;
    let mut watch: Option<Watch> = None;

    let idle = tokio::time::sleep(state.idle_timeout);
    tokio::pin!(idle);

    loop {
        tokio::select! {
            frame = receiver.recv_text() => {
                idle.as_mut().reset(tokio::time::Instant::now() + state.idle_timeout);

                let text = match frame {
                    Ok(Some(text)) => text,
                    Ok(None) => {
                        tracing::info!(%conn_id, "connection closed cleanly");
                        break;
                    }
                    Err(e) => {
                        tracing::debug!(%conn_id, error = %e, "recv error");
                        break;
                    }
                };

                let request: Envelope<ClientMessage> = match state.codec.decode(&text) {
                    Ok(envelope) => envelope,
                    Err(e) => {
                        tracing::debug!(%conn_id, error = %e, "failed to decode envelope");
                        out.send_error(&LiveQuizError::from(e)).await?;
                        continue;
                    }
                };

                match dispatch(&state, request.payload, &mut identity, &mut watch) {
                    Ok(Reply::Send(msg)) => out.send(msg).await?,
                    Ok(Reply::Close) => break,
                    Err(e) => {
                        tracing::debug!(%conn_id, code = e.code(), error = %e, "request rejected");
                        out.send_error(&e).await?;
                    }
                }
            }

            event = next_event(&mut watch) => {
                idle.as_mut().reset(tokio::time::Instant::now() + state.idle_timeout);
                match event {
                    Some((code, event)) => {
                        out.send(ServerMessage::Event { code, event }).await?;
                    }
                    None => {
                        // The watched session was torn down.
                        if let Some(ended) = watch.take() {
                            tracing::debug!(%conn_id, code = %ended.code, "watched session closed");
                            out.send_error(&LiveQuizError::Registry(
                                livequiz_registry::RegistryError::UnknownSession(ended.code),
                            ))
                            .await?;
                        }
                    }
                }
            }

            () = &mut idle, if watch.is_none() => {
                tracing::info!(%conn_id, "connection timed out");
                break;
            }
        }
    }

    let _ = out.sender.close().await;
    // `watch` drops here, unsubscribing its listener.
    Ok(())
}

/// Waits for the next event on the watched session. Never resolves while
/// nothing is watched.
async fn next_event(watch: &mut Option<Watch>) -> Option<(SessionCode, String)> {
    match watch {
        Some(w) => {
            let event = w.listener.recv().await?;
            Some((w.code.clone(), event))
        }
        None => std::future::pending().await,
    }
}

/// Applies one request. Never awaits: every quiz operation is a short
/// synchronous critical section.
fn dispatch<C: Codec>(
    state: &ServerState<C>,
    msg: ClientMessage,
    identity: &mut Option<Identity>,
    watch: &mut Option<Watch>,
) -> Result<Reply, LiveQuizError> {
    let registry = &state.registry;

    let reply = match msg {
        ClientMessage::ListTemplates => ServerMessage::TemplateList {
            templates: registry.template_names(),
        },

        ClientMessage::Create { template } => {
            let (code, _) = registry.create(&template)?;
            ServerMessage::Created { code }
        }

        ClientMessage::Join { code, name } => {
            let session = registry.get(code.as_str())?;
            let joined = session.join(&name)?;
            *identity = Some(Identity {
                session,
                name: joined.name.clone(),
            });
            ServerMessage::Joined {
                code,
                name: joined.name,
                handle: joined.handle,
            }
        }

        ClientMessage::Resume { code, handle } => {
            let session = registry.get(code.as_str())?;
            let joined = session
                .resume(&handle)
                .ok_or_else(|| SessionError::UnknownPlayer(handle.to_string()))?;
            tracing::info!(%code, player = %joined.name, "player resumed");
            *identity = Some(Identity {
                session,
                name: joined.name.clone(),
            });
            ServerMessage::Joined {
                code,
                name: joined.name,
                handle: joined.handle,
            }
        }

        ClientMessage::Answer { value } => {
            let Some(player) = identity.as_ref() else {
                return Err(ProtocolError::InvalidMessage(
                    "join a session before answering".into(),
                )
                .into());
            };
            player.session.submit_answer(&player.name, &value)?;
            ServerMessage::AnswerAccepted
        }

        ClientMessage::Advance { code } => {
            let outcome = registry.get(code.as_str())?.advance();
            ServerMessage::Advanced {
                code,
                state: outcome.state(),
            }
        }

        ClientMessage::Watch { code } => {
            let session = registry.get(code.as_str())?;
            // Replacing the old watch drops its listener.
            *watch = Some(Watch {
                code: code.clone(),
                listener: session.subscribe(),
            });
            ServerMessage::Watching { code }
        }

        ClientMessage::Unwatch => ServerMessage::Unwatched {
            code: watch.take().map(|ended| ended.code),
        },

        ClientMessage::Snapshot { code } => ServerMessage::Snapshot {
            session: registry.get(code.as_str())?.snapshot(),
        },

        ClientMessage::Disconnect { reason } => {
            tracing::info!(%reason, "client disconnected");
            return Ok(Reply::Close);
        }
    };

    Ok(Reply::Send(reply))
}

/// Increments and returns the next sequence number.
fn next_seq(seq: &mut u64) -> u64 {
    let current = *seq;
    *seq += 1;
    current
}
