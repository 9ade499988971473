//! Dispatch Queue
//!
//! A tokio task that owns the job of dispatching into one store. Async code
//! (a middleware that fired off a request, a timer, a socket reader) sends
//! actions to the queue instead of calling `dispatch` from wherever it
//! happens to be running, and the queue applies them one at a time, in the
//! order they were sent.
//!
//! `Store::dispatch` blocks on the store's writer lock, and runs middleware
//! and subscribers to completion. The queue task therefore hands each action
//! to tokio's blocking pool and awaits it, so a contended store never stalls
//! a runtime worker. Actions are still applied one at a time.
//!
//! The store does not track in-flight async work. Cancelling it is up to the
//! code that started it.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use super::action::Action;
use super::container::Store;
use crate::error::{StoreError, StoreResult};

/// Sending half of a store's dispatch queue.
///
/// The queue task exits once every `DispatchQueue` clone has been dropped.
pub struct DispatchQueue<A> {
    sender: mpsc::Sender<A>,
}

impl<A> Clone for DispatchQueue<A> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<A: Action> DispatchQueue<A> {
    /// Queue `action`, waiting for room if the queue is full.
    pub async fn send(&self, action: A) -> StoreResult<()> {
        self.sender
            .send(action)
            .await
            .map_err(|_| StoreError::QueueClosed)
    }

    /// Queue `action` without waiting.
    pub fn try_send(&self, action: A) -> StoreResult<()> {
        match self.sender.try_send(action) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(StoreError::QueueFull),
            Err(TrySendError::Closed(_)) => Err(StoreError::QueueClosed),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

impl<S, A> Store<S, A>
where
    S: Send + Sync + 'static,
    A: Action,
{
    /// Spawn the dispatch queue task for this store.
    ///
    /// Must be called from inside a tokio runtime. Capacity comes from
    /// [`StoreConfig::queue_capacity`](crate::config::StoreConfig::queue_capacity).
    pub fn spawn_queue(&self) -> (DispatchQueue<A>, JoinHandle<()>) {
        let (sender, mut receiver) = mpsc::channel(self.config().queue_capacity);
        let store = self.clone();

        let task = tokio::spawn(async move {
            debug!(store = store.label(), "dispatch queue started");

            while let Some(action) = receiver.recv().await {
                let target = store.clone();
                match tokio::task::spawn_blocking(move || target.dispatch(action)).await {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => {
                        warn!(store = store.label(), error = %err, "queued dispatch failed");
                    }
                    Err(err) => {
                        error!(store = store.label(), error = %err, "queued dispatch panicked");
                    }
                }
            }

            debug!(store = store.label(), "dispatch queue stopped");
        });

        (DispatchQueue { sender }, task)
    }
}
