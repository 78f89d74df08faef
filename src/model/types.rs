use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const HOLES_PER_ROUND: u8 = 18;
pub const ROUNDS_PER_TOURNAMENT: u8 = 4;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct PlayerId(pub i64);

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct CourseId(pub i64);

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct TournamentId(pub i64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for TournamentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Skill ratings, each roughly in `70.0..=98.0`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct SkillVector {
    pub overall: f64,
    pub driving: f64,
    pub approach: f64,
    pub short_game: f64,
    pub putting: f64,
}

impl SkillVector {
    #[must_use]
    pub fn uniform(rating: f64) -> Self {
        Self {
            overall: rating,
            driving: rating,
            approach: rating,
            short_game: rating,
            putting: rating,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub country: Option<String>,
    pub skills: SkillVector,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Hole {
    pub number: u8,
    pub par: u8,
    pub difficulty: f64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Course {
    pub id: CourseId,
    pub name: String,
    pub holes: Vec<Hole>,
}

impl Course {
    /// Checks that the course has exactly 18 holes numbered in order with a par of 3, 4 or 5.
    ///
    /// # Errors
    ///
    /// Returns a description of the first malformed hole.
    pub fn validate(&self) -> Result<(), String> {
        if self.holes.len() != usize::from(HOLES_PER_ROUND) {
            return Err(format!(
                "course {} has {} holes, expected {HOLES_PER_ROUND}",
                self.id,
                self.holes.len()
            ));
        }
        for (idx, hole) in self.holes.iter().enumerate() {
            if usize::from(hole.number) != idx + 1 {
                return Err(format!(
                    "course {} hole at position {} is numbered {}",
                    self.id,
                    idx + 1,
                    hole.number
                ));
            }
            if !(3..=5).contains(&hole.par) {
                return Err(format!(
                    "course {} hole {} has par {}",
                    self.id, hole.number, hole.par
                ));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn hole(&self, number: u8) -> Option<&Hole> {
        self.holes.iter().find(|h| h.number == number)
    }

    #[must_use]
    pub fn par(&self) -> i32 {
        self.holes.iter().map(|h| i32::from(h.par)).sum()
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TournamentStatus {
    Pending,
    Active,
    Completed,
    Cancelled,
}

impl TournamentStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "active" => Some(Self::Active),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for TournamentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A round number, always within `1..=4`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "u8", into = "u8")]
pub struct Round(u8);

impl Round {
    pub const FIRST: Self = Self(1);
    pub const CUT: Self = Self(2);
    pub const THIRD: Self = Self(3);
    pub const FINAL: Self = Self(ROUNDS_PER_TOURNAMENT);

    #[must_use]
    pub fn new(n: u8) -> Option<Self> {
        (1..=ROUNDS_PER_TOURNAMENT).contains(&n).then_some(Self(n))
    }

    #[must_use]
    pub fn get(self) -> u8 {
        self.0
    }

    #[must_use]
    pub fn next(self) -> Option<Self> {
        Self::new(self.0 + 1)
    }

    pub fn all() -> impl Iterator<Item = Self> {
        (1..=ROUNDS_PER_TOURNAMENT).map(Self)
    }

    /// Zero-based slot for per-round arrays.
    #[must_use]
    pub fn index(self) -> usize {
        usize::from(self.0 - 1)
    }
}

impl TryFrom<u8> for Round {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("round {value} is outside 1..={ROUNDS_PER_TOURNAMENT}"))
    }
}

impl From<Round> for u8 {
    fn from(value: Round) -> Self {
        value.0
    }
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", self.0)
    }
}

/// Global steps at which rounds 2..=4 started. Round 1 always starts at step 0.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RoundStartSteps([u64; 3]);

impl RoundStartSteps {
    #[must_use]
    pub fn new(r2: u64, r3: u64, r4: u64) -> Self {
        Self([r2, r3, r4])
    }

    #[must_use]
    pub fn get(&self, round: Round) -> u64 {
        match round.get() {
            1 => 0,
            n => self.0[usize::from(n - 2)],
        }
    }

    /// Records a round's start step. Round 1 is fixed at 0 and cannot be set.
    ///
    /// # Errors
    ///
    /// Returns `Err` when asked to move the first round.
    pub fn set(&mut self, round: Round, step: u64) -> Result<(), String> {
        match round.get() {
            1 => Err("round 1 always starts at step 0".to_string()),
            n => {
                self.0[usize::from(n - 2)] = step;
                Ok(())
            }
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub course_id: CourseId,
    pub start_date: NaiveDate,
    pub status: TournamentStatus,
    pub current_round: Round,
    pub simulation_step: u64,
    pub round_starts: RoundStartSteps,
    pub cut_applied: bool,
    pub regrouped_final_round: bool,
}

impl Tournament {
    /// A freshly scheduled tournament that has not been started yet.
    #[must_use]
    pub fn pending(
        id: TournamentId,
        name: impl Into<String>,
        course_id: CourseId,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            course_id,
            start_date,
            status: TournamentStatus::Pending,
            current_round: Round::FIRST,
            simulation_step: 0,
            round_starts: RoundStartSteps::default(),
            cut_applied: false,
            regrouped_final_round: false,
        }
    }

    #[must_use]
    pub fn current_round_start(&self) -> u64 {
        self.round_starts.get(self.current_round)
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PlayerStatus {
    Active,
    Cut,
}

impl PlayerStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Cut => "cut",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "cut" => Some(Self::Cut),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TournamentPlayer {
    pub player: Player,
    pub initial_group: u32,
    pub status: PlayerStatus,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TeeGroup {
    pub number: u32,
    pub players: Vec<PlayerId>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct LiveScore {
    pub tournament_id: TournamentId,
    pub player_id: PlayerId,
    pub round: Round,
    pub hole: u8,
    pub strokes: i32,
}

/// Score for one round on the leaderboard. `strokes` is only set once all 18 holes are in.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct RoundScore {
    pub display: Option<String>,
    pub strokes: Option<i32>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Standing {
    pub player_id: PlayerId,
    pub player_name: String,
    pub status: PlayerStatus,
    pub tee_group: Option<u32>,
    pub tee_step: Option<u64>,
    pub total_strokes: i32,
    pub score_to_par: i32,
    pub holes_played: u32,
    /// Holes completed in the tournament's current round.
    pub thru: u8,
    pub rounds: [RoundScore; 4],
    pub position: Option<u32>,
}

impl Standing {
    #[must_use]
    pub fn has_started(&self) -> bool {
        self.holes_played > 0
    }

    #[must_use]
    pub fn is_cut(&self) -> bool {
        self.status == PlayerStatus::Cut
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FinalResult {
    pub tournament_id: TournamentId,
    pub player_id: PlayerId,
    pub total_strokes: i32,
    pub score_to_par: i32,
    pub position: Option<u32>,
    pub round_strokes: [Option<i32>; 4],
}
