//! The Game entity: root of the bus tree and owner of all shared state

use crate::bus::{self, Emitter, Message, NodeRef, Topology};
use crate::core::{CardId, DescriptorId, EntityStore, Card, Player, RoleKind};
use crate::effects::DescriptorCatalog;
use crate::game::commands::{self, Command};
use crate::game::logger::GameLogger;
use crate::game::snapshot::StateSnapshot;
use crate::game::{log_if_verbose, state_hash, GameConfig};
use crate::loader::Content;
use crate::pool::CardPool;
use crate::Result;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use smallvec::SmallVec;
use std::sync::Arc;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Derive the generator seed from the textual match seed
///
/// FNV-1a over the UTF-8 bytes in explicit `u64` arithmetic, so every
/// platform derives the same generator stream from the same seed.
pub fn seed_from_str(seed: &str) -> u64 {
    seed.bytes().fold(FNV_OFFSET, |h, b| (h ^ b as u64).wrapping_mul(FNV_PRIME))
}

pub struct Game {
    pub config: GameConfig,
    pub(crate) content: Arc<dyn Content>,
    pub(crate) catalog: Arc<dyn DescriptorCatalog>,

    pub players: Vec<Player>,
    pub cards: EntityStore<Card>,
    pub pool: CardPool,

    /// 0 until [`Game::start`], then the 1-based round number
    pub round: u32,
    pub(crate) done_count: usize,

    /// Every command applied so far, in order
    log: Vec<Command>,
    seed: String,

    /// The one generator every random decision draws from
    pub(crate) rng: ChaCha12Rng,
    pub(crate) bus: Emitter<Game>,
    pub logger: GameLogger,

    next_descriptor: u32,
    next_query: u32,
}

impl Game {
    /// Set up a match: pool, players and command handlers
    ///
    /// The pool is filled before anything else draws from the generator, so
    /// two games with the same seed, content and seats start identical.
    pub fn new(
        config: GameConfig,
        content: Arc<dyn Content>,
        catalog: Arc<dyn DescriptorCatalog>,
        seed: &str,
        roles: &[RoleKind],
    ) -> Self {
        let mut rng = ChaCha12Rng::seed_from_u64(seed_from_str(seed));
        let pool = CardPool::new(content.as_ref(), &config, &mut rng);
        let players = roles
            .iter()
            .enumerate()
            .map(|(seat, &role)| Player::new(seat, role, &config))
            .collect();

        let mut bus = Emitter::new();
        commands::install(&mut bus);

        Game {
            config,
            content,
            catalog,
            players,
            cards: EntityStore::new(),
            pool,
            round: 0,
            done_count: 0,
            log: Vec::new(),
            seed: seed.to_string(),
            rng,
            bus,
            logger: GameLogger::new(),
            next_descriptor: 0,
            next_query: 0,
        }
    }

    pub fn content(&self) -> Arc<dyn Content> {
        Arc::clone(&self.content)
    }

    pub fn catalog(&self) -> Arc<dyn DescriptorCatalog> {
        Arc::clone(&self.catalog)
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }

    pub fn log(&self) -> &[Command] {
        &self.log
    }

    pub fn card(&self, id: CardId) -> Option<&Card> {
        self.cards.find(id)
    }

    pub fn player(&self, seat: usize) -> Option<&Player> {
        self.players.get(seat)
    }

    /// Deliver a message from the root of the bus tree
    ///
    /// Returns the message as the last handler left it, so callers can read
    /// back payloads that prev-phase handlers rewrote.
    pub fn post(&mut self, mut msg: Message) -> Result<Message> {
        log_if_verbose!(self, "post {} {:?}/{:?}", msg.kind, msg.player, msg.card);
        bus::emit(self, NodeRef::Root, &mut msg)?;
        Ok(msg)
    }

    /// Record a command and deliver it to the root command handlers
    ///
    /// Commands are never validated here: an illegal command is logged by
    /// its handler and ignored, but it still lands in the log so replicas
    /// replay the exact same stream.
    pub fn apply(&mut self, cmd: Command) -> Result<()> {
        let msg = cmd.to_message();
        self.log.push(cmd);
        self.post(msg)?;
        Ok(())
    }

    pub(crate) fn next_descriptor_id(&mut self) -> DescriptorId {
        let id = DescriptorId(self.next_descriptor);
        self.next_descriptor += 1;
        id
    }

    pub(crate) fn next_query_id(&mut self) -> u32 {
        let id = self.next_query;
        self.next_query += 1;
        id
    }

    /// Is descriptor `id` on `card` bound and enabled?
    pub fn descriptor_live(&self, card: CardId, id: DescriptorId) -> bool {
        self.cards.find(card).map_or(false, |c| {
            c.descriptors.iter().any(|d| d.id == id && d.is_live())
        })
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot::capture(self)
    }

    /// Hash of everything that must agree across replicas
    pub fn digest(&self) -> u64 {
        state_hash::compute_state_hash(&self.snapshot())
    }
}

impl Topology for Game {
    fn emitter(&self, node: NodeRef) -> Option<&Emitter<Self>> {
        match node {
            NodeRef::Root => Some(&self.bus),
            NodeRef::Player(seat) => self.players.get(seat).map(|p| &p.bus),
            NodeRef::Card(id) => self.cards.find(id).map(|c| &c.bus),
        }
    }

    fn route(&self, node: NodeRef, msg: &Message) -> SmallVec<[NodeRef; 8]> {
        match node {
            NodeRef::Root => {
                let seats: SmallVec<[Option<usize>; 8]> = (0..self.players.len()).map(Some).collect();
                msg.player
                    .select(&seats, |_| None)
                    .into_iter()
                    .map(NodeRef::Player)
                    .collect()
            }
            NodeRef::Player(seat) => match self.players.get(seat) {
                Some(player) => msg
                    .card
                    .select(&player.present, |id| {
                        self.cards
                            .find(id)
                            .filter(|c| c.owner == seat)
                            .map(|c| c.id)
                    })
                    .into_iter()
                    .map(NodeRef::Card)
                    .collect(),
                None => SmallVec::new(),
            },
            NodeRef::Card(_) => SmallVec::new(),
        }
    }
}

impl std::fmt::Debug for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("seed", &self.seed)
            .field("round", &self.round)
            .field("players", &self.players.len())
            .field("cards", &self.cards.len())
            .field("log", &self.log.len())
            .finish()
    }
}
