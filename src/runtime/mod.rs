// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Control-thread marshaling for async hosts.
//!
//! The engine itself is single-threaded; this module moves it onto one
//! tokio task and turns every interaction into an [`EngineCommand`] on a
//! channel. Provider replies arriving from arbitrary threads are enqueued
//! and the task is woken, so all session and registry mutation stays on the
//! one logical control thread.
//!
//! The provider is wrapped on the way in: rapid query submissions can be
//! coalesced behind a debounce interval, and an optional watchdog cancels
//! sessions whose provider never answers. Superseding a query only aborts
//! the not-yet-dispatched work; an in-flight provider call is never
//! interrupted, its late replies are simply discarded.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::warn;

use crate::engine::MentionsEngine;
use crate::model::{EntityRecord, ResolvedMention};
use crate::provider::{EntityProvider, ProviderReply, QueryRequest, ReplyQueue, ReplyRoute, ResultSink};
use crate::session::SessionPhase;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeOptions {
    /// Hold each query back this long; a newer query submitted in the
    /// window replaces it before the provider is ever called.
    pub debounce_interval: Option<Duration>,
    /// Cancel the session when the active query has not settled within
    /// this window.
    pub query_timeout: Option<Duration>,
}

#[derive(Debug)]
pub enum EngineCommand {
    InsertText { offset: usize, text: String },
    DeleteRange { start: usize, end: usize },
    ReplaceRange { start: usize, end: usize, text: String },
    SetCursor { offset: usize },
    FocusChanged { focused: bool },
    SelectEntity { index: usize },
    CancelMention,
    /// Drain provider replies that were enqueued from another thread.
    Pump,
    QueryTimedOut { seq: u64 },
    Snapshot { reply: oneshot::Sender<EngineSnapshot> },
    Shutdown,
}

/// Point-in-time copy of the engine state, for hosts and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSnapshot {
    pub text: String,
    pub cursor: usize,
    pub phase: SessionPhase,
    pub mentions: Vec<ResolvedMention>,
    pub presented: Vec<EntityRecord>,
}

/// Route that enqueues the reply and wakes the engine task.
struct WakingRoute {
    queue: ReplyQueue,
    wake: mpsc::UnboundedSender<EngineCommand>,
}

impl ReplyRoute for WakingRoute {
    fn deliver(&self, reply: ProviderReply) {
        ReplyRoute::deliver(&self.queue, reply);
        let _ = self.wake.send(EngineCommand::Pump);
    }
}

/// Provider wrapper adding the debounce window and the timeout watchdog.
struct DispatchingProvider {
    inner: Arc<dyn EntityProvider>,
    options: RuntimeOptions,
    commands: mpsc::UnboundedSender<EngineCommand>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl EntityProvider for DispatchingProvider {
    fn query(&self, request: &QueryRequest, sink: ResultSink) {
        let mut pending = self.pending.lock().expect("dispatch state poisoned");
        if let Some(previous) = pending.take() {
            previous.abort();
        }

        let inner = Arc::clone(&self.inner);
        let request = request.clone();
        let options = self.options;
        let commands = self.commands.clone();
        let seq = sink.seq();
        *pending = Some(tokio::spawn(async move {
            if let Some(interval) = options.debounce_interval {
                tokio::time::sleep(interval).await;
            }
            inner.query(&request, sink);
            if let Some(timeout) = options.query_timeout {
                tokio::time::sleep(timeout).await;
                let _ = commands.send(EngineCommand::QueryTimedOut { seq });
            }
        }));
    }
}

pub struct EngineRuntime;

impl EngineRuntime {
    /// Move `engine` onto a tokio task and return the handle that feeds it.
    /// Must be called from within a tokio runtime.
    pub fn spawn(mut engine: MentionsEngine, options: RuntimeOptions) -> EngineHandle {
        let (commands, mut receiver) = mpsc::unbounded_channel();

        engine.set_reply_route(Arc::new(WakingRoute {
            queue: engine.reply_queue(),
            wake: commands.clone(),
        }));
        let inner = engine.provider_handle();
        engine.set_provider(Arc::new(DispatchingProvider {
            inner,
            options,
            commands: commands.clone(),
            pending: Mutex::new(None),
        }));

        tokio::spawn(async move {
            while let Some(command) = receiver.recv().await {
                match command {
                    EngineCommand::InsertText { offset, text } => {
                        if let Err(err) = engine.insert_text(offset, &text) {
                            warn!(%err, "insert rejected");
                        }
                    }
                    EngineCommand::DeleteRange { start, end } => {
                        if let Err(err) = engine.delete_range(start, end) {
                            warn!(%err, "delete rejected");
                        }
                    }
                    EngineCommand::ReplaceRange { start, end, text } => {
                        if let Err(err) = engine.replace_range(start, end, &text) {
                            warn!(%err, "replace rejected");
                        }
                    }
                    EngineCommand::SetCursor { offset } => {
                        if let Err(err) = engine.set_cursor(offset) {
                            warn!(%err, "cursor move rejected");
                        }
                    }
                    EngineCommand::FocusChanged { focused } => engine.focus_changed(focused),
                    EngineCommand::SelectEntity { index } => {
                        if let Err(err) = engine.select_entity(index) {
                            warn!(%err, "selection rejected");
                        }
                    }
                    EngineCommand::CancelMention => engine.cancel_mention(),
                    EngineCommand::Pump => engine.pump(),
                    EngineCommand::QueryTimedOut { seq } => engine.query_timed_out(seq),
                    EngineCommand::Snapshot { reply } => {
                        let _ = reply.send(EngineSnapshot {
                            text: engine.text().to_owned(),
                            cursor: engine.cursor(),
                            phase: engine.phase(),
                            mentions: engine.mentions().into_iter().cloned().collect(),
                            presented: engine
                                .presented_entities()
                                .map(<[EntityRecord]>::to_vec)
                                .unwrap_or_default(),
                        });
                    }
                    EngineCommand::Shutdown => break,
                }
            }
        });

        EngineHandle { commands }
    }
}

/// Cheap-to-clone sender half; every method just enqueues a command.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    commands: mpsc::UnboundedSender<EngineCommand>,
}

impl EngineHandle {
    pub fn send(&self, command: EngineCommand) -> Result<(), RuntimeError> {
        self.commands
            .send(command)
            .map_err(|_| RuntimeError::Closed)
    }

    pub fn insert_text(&self, offset: usize, text: impl Into<String>) -> Result<(), RuntimeError> {
        self.send(EngineCommand::InsertText {
            offset,
            text: text.into(),
        })
    }

    pub fn delete_range(&self, start: usize, end: usize) -> Result<(), RuntimeError> {
        self.send(EngineCommand::DeleteRange { start, end })
    }

    pub fn set_cursor(&self, offset: usize) -> Result<(), RuntimeError> {
        self.send(EngineCommand::SetCursor { offset })
    }

    pub fn focus_changed(&self, focused: bool) -> Result<(), RuntimeError> {
        self.send(EngineCommand::FocusChanged { focused })
    }

    pub fn select_entity(&self, index: usize) -> Result<(), RuntimeError> {
        self.send(EngineCommand::SelectEntity { index })
    }

    pub fn cancel_mention(&self) -> Result<(), RuntimeError> {
        self.send(EngineCommand::CancelMention)
    }

    pub fn shutdown(&self) -> Result<(), RuntimeError> {
        self.send(EngineCommand::Shutdown)
    }

    pub async fn snapshot(&self) -> Result<EngineSnapshot, RuntimeError> {
        let (reply, receive) = oneshot::channel();
        self.send(EngineCommand::Snapshot { reply })?;
        receive.await.map_err(|_| RuntimeError::Closed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeError {
    /// The engine task is gone; no further commands can be delivered.
    Closed,
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => f.write_str("engine task has shut down"),
        }
    }
}

impl std::error::Error for RuntimeError {}
