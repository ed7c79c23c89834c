//! Master: one global command order for every replica
//!
//! Each client connection owns a replica and, if it is seated, a
//! [`SeatHandle`] for submitting commands. Submissions from all seats land
//! in one shared queue; the master takes them off in arrival order and hands
//! each one to every replica concurrently, waiting until all have it before
//! moving to the next. Every replica therefore sees the same sequence.

use crate::game::{Command, CommandKind};
use crate::replication::slave::{Envelope, SlaveHandle};
use crate::{BattlerError, Result};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

/// Client-side submitter for one seat
#[derive(Debug, Clone)]
pub struct SeatHandle {
    seat: usize,
    tx: mpsc::UnboundedSender<Command>,
}

impl SeatHandle {
    pub fn seat(&self) -> usize {
        self.seat
    }

    /// Submit a command for this seat
    pub fn send(&self, kind: CommandKind) -> Result<()> {
        self.tx
            .send(Command::new(self.seat, kind))
            .map_err(|_| BattlerError::ReplicaClosed)
    }
}

#[derive(Debug)]
struct Connection {
    seat: Option<usize>,
    replica: SlaveHandle,
}

pub struct Master {
    queue_tx: mpsc::UnboundedSender<Command>,
    queue_rx: mpsc::UnboundedReceiver<Command>,
    connections: Vec<Connection>,
}

impl Master {
    pub fn new() -> Self {
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        Master {
            queue_tx,
            queue_rx,
            connections: Vec::new(),
        }
    }

    /// Attach a replica; seated connections get a handle for submitting
    ///
    /// `None` is a spectator: it receives every command but submits none.
    pub fn connect(&mut self, seat: Option<usize>, replica: SlaveHandle) -> Option<SeatHandle> {
        self.connections.push(Connection { seat, replica });
        seat.map(|seat| SeatHandle {
            seat,
            tx: self.queue_tx.clone(),
        })
    }

    pub fn connections(&self) -> usize {
        self.connections.len()
    }

    /// Seats with at least one connection
    pub fn seated(&self) -> Vec<usize> {
        let mut seats: Vec<usize> = self.connections.iter().filter_map(|c| c.seat).collect();
        seats.sort_unstable();
        seats.dedup();
        seats
    }

    /// Forward commands until every [`SeatHandle`] is dropped and the queue
    /// is drained, then hand the replicas back in connection order
    pub async fn run(self) -> Result<Vec<SlaveHandle>> {
        let Master {
            queue_tx,
            mut queue_rx,
            connections,
        } = self;
        drop(queue_tx);

        let inboxes: Vec<mpsc::Sender<Envelope>> =
            connections.iter().map(|c| c.replica.sender()).collect();

        while let Some(cmd) = queue_rx.recv().await {
            let mut deliveries = JoinSet::new();
            for inbox in &inboxes {
                let inbox = inbox.clone();
                let cmd = cmd.clone();
                deliveries.spawn(async move { inbox.send(Envelope::Command(cmd)).await.is_ok() });
            }
            while let Some(delivered) = deliveries.join_next().await {
                if !delivered? {
                    return Err(BattlerError::ReplicaClosed);
                }
            }
        }

        Ok(connections.into_iter().map(|c| c.replica).collect())
    }
}

impl Default for Master {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Master {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Master")
            .field("connections", &self.connections.len())
            .field("seated", &self.seated())
            .finish()
    }
}
