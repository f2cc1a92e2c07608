use crate::gate::ActivationGate;
use crossbeam_utils::atomic::AtomicCell;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Static description of one agent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentProfile {
    /// Name used to label this agent's lines in other transcripts.
    pub name: String,
    /// Identifier the presentation layer knows the agent by.
    pub id: u32,
    /// Visual effect toggled while the agent speaks.
    #[serde(default)]
    pub filter: String,
    /// Voice passed to the synthesizer.
    pub speaker_id: String,
    pub system_prompt: String,
}

impl AgentProfile {
    /// The system message that opens this agent's transcript.
    pub fn system_message(&self) -> String {
        format!("Your real name is {}. {}", self.name, self.system_prompt)
    }
}

/// Where an agent currently is in its turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AgentState {
    Idle,
    Claimed,
    Generating,
    FanningOut,
    SchedulingNext,
    Synthesizing,
    AwaitingVoice,
    Speaking,
    Presenting,
    ShutdownExiting,
    /// A backend call failed and the loop is gone for good.
    Failed,
}

/// One place at the table: the agent's profile, gate and observable state.
#[derive(Debug)]
pub struct Seat {
    profile: AgentProfile,
    gate: ActivationGate,
    state: AtomicCell<AgentState>,
}

impl Seat {
    fn new(profile: AgentProfile) -> Self {
        Self {
            profile,
            gate: ActivationGate::new(),
            state: AtomicCell::new(AgentState::Idle),
        }
    }

    pub fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    pub fn name(&self) -> &str {
        &self.profile.name
    }

    pub fn gate(&self) -> &ActivationGate {
        &self.gate
    }

    pub fn state(&self) -> AgentState {
        self.state.load()
    }

    pub(crate) fn set_state(&self, state: AgentState) {
        self.state.store(state);
    }
}

/// Fixed list of agents, shared read-only by every loop.
#[derive(Debug)]
pub struct Roster {
    seats: Vec<Seat>,
}

impl Roster {
    pub fn new(profiles: Vec<AgentProfile>) -> Self {
        Self {
            seats: profiles.into_iter().map(Seat::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    pub fn seat(&self, index: usize) -> Option<&Seat> {
        self.seats.get(index)
    }

    /// Seat at an index already checked against [`Roster::len`].
    pub(crate) fn at(&self, index: usize) -> &Seat {
        &self.seats[index]
    }

    pub fn seats(&self) -> impl Iterator<Item = &Seat> {
        self.seats.iter()
    }

    /// Raise the gate of the agent at `index`. Returns `false` if there is none.
    pub fn activate(&self, index: usize) -> bool {
        match self.seats.get(index) {
            Some(seat) => {
                seat.gate.activate();
                true
            }
            None => false,
        }
    }

    /// Uniformly random agent other than `exclude`.
    pub fn pick_peer(&self, exclude: usize) -> Option<usize> {
        let peers: Vec<usize> = (0..self.seats.len()).filter(|i| *i != exclude).collect();
        peers.choose(&mut rand::thread_rng()).copied()
    }

    /// Uniformly random agent.
    pub fn pick_any(&self) -> Option<usize> {
        let all: Vec<usize> = (0..self.seats.len()).collect();
        all.choose(&mut rand::thread_rng()).copied()
    }
}
