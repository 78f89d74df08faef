use super::types::{Course, CourseId, Player, Tournament, TournamentId};
use ahash::AHashSet;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A tournament as listed in a catalog file. It always loads as pending.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CatalogTournament {
    pub id: TournamentId,
    pub name: String,
    pub course_id: CourseId,
    pub start_date: NaiveDate,
}

impl From<&CatalogTournament> for Tournament {
    fn from(entry: &CatalogTournament) -> Self {
        Tournament::pending(entry.id, entry.name.clone(), entry.course_id, entry.start_date)
    }
}

/// Players, courses and tournaments to preload, read from a JSON file such as:
///
/// ```json
/// { "players": [{ "id": 1, "name": "A. Player", "country": null,
///                 "skills": { "overall": 90, "driving": 88, "approach": 91,
///                             "short_game": 87, "putting": 85 } }],
///   "courses": [{ "id": 1, "name": "Links", "holes": [{ "number": 1, "par": 4, "difficulty": 1.0 }] }],
///   "tournaments": [{ "id": 1, "name": "Open", "course_id": 1, "start_date": "2026-04-09" }] }
/// ```
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Catalog {
    #[serde(default)]
    pub players: Vec<Player>,
    #[serde(default)]
    pub courses: Vec<Course>,
    #[serde(default)]
    pub tournaments: Vec<CatalogTournament>,
}

impl Catalog {
    /// # Errors
    ///
    /// Will return `Err` on duplicate ids, a malformed course, or a tournament whose
    /// course is not in the catalog.
    pub fn validate(&self) -> Result<(), String> {
        let mut player_ids = AHashSet::new();
        for player in &self.players {
            if !player_ids.insert(player.id) {
                return Err(format!("player {} appears more than once", player.id));
            }
        }
        let mut course_ids = AHashSet::new();
        for course in &self.courses {
            course.validate()?;
            if !course_ids.insert(course.id) {
                return Err(format!("course {} appears more than once", course.id));
            }
        }
        let mut tournament_ids = AHashSet::new();
        for entry in &self.tournaments {
            if !tournament_ids.insert(entry.id) {
                return Err(format!("tournament {} appears more than once", entry.id));
            }
            if !course_ids.contains(&entry.course_id) {
                return Err(format!(
                    "tournament {} refers to course {}, which is not in the catalog",
                    entry.id, entry.course_id
                ));
            }
        }
        Ok(())
    }
}

/// Rows actually inserted by a prefill; existing ids are skipped.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PrefillCounts {
    pub players: usize,
    pub courses: usize,
    pub tournaments: usize,
}
