//! Slave: one simulation replica behind a FIFO inbox
//!
//! The replica task owns its [`Game`] outright and drains the inbox one
//! envelope at a time, so a command is fully applied before the next is
//! looked at. Digest and snapshot requests ride the same inbox, which means
//! they observe exactly the commands that arrived before them.

use crate::game::{Command, Game, StateSnapshot};
use crate::{BattlerError, Result};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Inbox capacity; senders park when a replica falls this far behind
pub const INBOX_CAPACITY: usize = 256;

/// Everything a replica's inbox can carry
#[derive(Debug)]
pub enum Envelope {
    Command(Command),
    Digest(oneshot::Sender<u64>),
    Snapshot(oneshot::Sender<StateSnapshot>),
    /// Stop after everything queued before this
    Shutdown,
}

pub struct Slave {
    name: String,
    game: Game,
    inbox: mpsc::Receiver<Envelope>,
}

/// The outside of a running replica
#[derive(Debug)]
pub struct SlaveHandle {
    name: String,
    tx: mpsc::Sender<Envelope>,
    task: JoinHandle<Result<Game>>,
}

impl Slave {
    /// Move `game` onto its own task and return the handle feeding it
    pub fn spawn(name: impl Into<String>, mut game: Game) -> SlaveHandle {
        let name = name.into();
        game.logger.set_tag(name.clone());
        let (tx, inbox) = mpsc::channel(INBOX_CAPACITY);
        let slave = Slave {
            name: name.clone(),
            game,
            inbox,
        };
        let task = tokio::spawn(slave.run());
        SlaveHandle { name, tx, task }
    }

    /// Apply envelopes in arrival order until shutdown or every sender is gone
    ///
    /// A command that fails (pool underflow) ends the replica with that
    /// error; the game state is not handed back.
    async fn run(mut self) -> Result<Game> {
        while let Some(envelope) = self.inbox.recv().await {
            match envelope {
                Envelope::Command(cmd) => {
                    if let Err(e) = self.game.apply(cmd) {
                        self.game
                            .logger
                            .minimal(&format!("replica {} stopped: {}", self.name, e));
                        return Err(e);
                    }
                }
                Envelope::Digest(reply) => {
                    let _ = reply.send(self.game.digest());
                }
                Envelope::Snapshot(reply) => {
                    let _ = reply.send(self.game.snapshot());
                }
                Envelope::Shutdown => break,
            }
        }
        Ok(self.game)
    }
}

impl SlaveHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queue a command; waits only while the inbox is full
    pub async fn send(&self, cmd: Command) -> Result<()> {
        self.tx
            .send(Envelope::Command(cmd))
            .await
            .map_err(|_| BattlerError::ReplicaClosed)
    }

    /// A cloneable sender into this replica's inbox
    pub fn sender(&self) -> mpsc::Sender<Envelope> {
        self.tx.clone()
    }

    /// State hash after every command queued so far
    pub async fn digest(&self) -> Result<u64> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Envelope::Digest(reply))
            .await
            .map_err(|_| BattlerError::ReplicaClosed)?;
        rx.await.map_err(|_| BattlerError::ReplicaClosed)
    }

    pub async fn snapshot(&self) -> Result<StateSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Envelope::Snapshot(reply))
            .await
            .map_err(|_| BattlerError::ReplicaClosed)?;
        rx.await.map_err(|_| BattlerError::ReplicaClosed)
    }

    /// Finish the queued work and take the game back
    pub async fn shutdown(self) -> Result<Game> {
        // A closed inbox means the task already ended; its result says why.
        let _ = self.tx.send(Envelope::Shutdown).await;
        self.task.await?
    }
}
