use serde::{Deserialize, Serialize};

/// Name for a single hole result relative to par.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub enum ScoreDisplay {
    Albatross,
    Eagle,
    Birdie,
    Par,
    Bogey,
    DoubleBogey,
    TripleBogey,
}

impl ScoreDisplay {
    /// The hole engine clamps to `par - 2 ..= par + 3`, so anything outside folds into the ends.
    #[must_use]
    pub fn from_relative(strokes_over_par: i32) -> Self {
        match strokes_over_par {
            i32::MIN..=-3 => Self::Albatross,
            -2 => Self::Eagle,
            -1 => Self::Birdie,
            0 => Self::Par,
            1 => Self::Bogey,
            2 => Self::DoubleBogey,
            _ => Self::TripleBogey,
        }
    }

    #[must_use]
    pub fn for_hole(strokes: i32, par: u8) -> Self {
        Self::from_relative(strokes - i32::from(par))
    }
}

/// `0` renders as `E`, positives carry a `+`.
#[must_use]
pub fn to_par_display(to_par: i32) -> String {
    match to_par {
        0 => "E".to_string(),
        n if n > 0 => format!("+{n}"),
        n => n.to_string(),
    }
}
