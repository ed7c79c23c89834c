//! Lockstep replication
//!
//! Replicas never exchange state, only commands. A [`Master`] fixes one
//! global order for every submitted command and fans each one out to all
//! [`Slave`] replicas; since every replica starts from the same seed and
//! applies the same sequence, they all end in the same state.

pub mod master;
pub mod slave;

pub use master::{Master, SeatHandle};
pub use slave::{Envelope, Slave, SlaveHandle};

use crate::game::{format_hash, Replay};
use crate::loader::Content;
use crate::Result;
use std::sync::Arc;

/// Final digests of a lockstep run, one per replica in connection order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockstepReport {
    pub digests: Vec<(String, u64)>,
    pub commands: usize,
}

impl LockstepReport {
    pub fn agree(&self) -> bool {
        self.digests.windows(2).all(|w| w[0].1 == w[1].1)
    }

    pub fn summary(&self) -> String {
        self.digests
            .iter()
            .map(|(name, hash)| format!("{}={}", name, format_hash(*hash)))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Feed a replay's log through a master to one replica per seat plus
/// `spectators` extra replicas, and collect every replica's final digest
pub async fn run_lockstep(
    replay: &Replay,
    content: Arc<dyn Content>,
    spectators: usize,
) -> Result<LockstepReport> {
    let mut master = Master::new();
    let mut seats = Vec::new();
    for seat in 0..replay.roles.len() {
        let game = replay.new_game(Arc::clone(&content))?;
        let replica = Slave::spawn(format!("seat{}", seat), game);
        seats.extend(master.connect(Some(seat), replica));
    }
    for n in 0..spectators {
        let game = replay.new_game(Arc::clone(&content))?;
        master.connect(None, Slave::spawn(format!("spectator{}", n), game));
    }

    let forwarding = tokio::spawn(master.run());
    for cmd in &replay.log {
        if let Some(handle) = seats.get(cmd.player) {
            handle.send(cmd.kind.clone())?;
        }
    }
    drop(seats);

    let replicas = forwarding.await??;
    let mut digests = Vec::with_capacity(replicas.len());
    for replica in replicas {
        let digest = replica.digest().await?;
        digests.push((replica.name().to_string(), digest));
        replica.shutdown().await?;
    }
    Ok(LockstepReport {
        digests,
        commands: replay.log.len(),
    })
}
