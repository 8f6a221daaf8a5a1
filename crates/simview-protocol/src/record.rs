//! Typed server records.

use std::fmt;

use simview_core::{Agent, GridConfig, Place, StatsSummary};

use crate::{FIELD_DELIMITER, FRAME_END};

/// One decoded server line.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// `CONFIG;<w>;<h>` - grid resize, applied immediately
    Config(GridConfig),

    /// `AGENT;<name>;<x>;<y>;<energy>;<stress>;<money>;<state>;<heading>`
    Agent(Agent),

    /// `<MAISON|TRAVAIL|PARC|LOISIR>;<x>;<y>;<0|1>`
    Place(Place),

    /// `STATS;<avgE>;<avgS>;<avgM>;<alive>;<dead>;<occupied>`
    Stats(StatsSummary),

    /// `END` - closes the current frame
    End,
}

impl Record {
    /// Wire tag of the record (first field).
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG",
            Self::Agent(_) => "AGENT",
            Self::Place(place) => place.kind.wire_tag(),
            Self::Stats(_) => "STATS",
            Self::End => FRAME_END,
        }
    }

    /// Encodes the record as a protocol line, without the terminator.
    ///
    /// Floats use their shortest exact representation, so decoding the
    /// result yields the same values. Agent names and states are written
    /// verbatim; a `;` inside them cannot be represented.
    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = FIELD_DELIMITER;
        let tag = self.tag();
        match self {
            Self::Config(grid) => write!(f, "{tag}{d}{}{d}{}", grid.width, grid.height),
            Self::Agent(a) => write!(
                f,
                "{tag}{d}{}{d}{}{d}{}{d}{}{d}{}{d}{}{d}{}{d}{}",
                a.name, a.x, a.y, a.energy, a.stress, a.money, a.state, a.heading
            ),
            Self::Place(p) => write!(
                f,
                "{tag}{d}{}{d}{}{d}{}",
                p.x,
                p.y,
                if p.occupied { "1" } else { "0" }
            ),
            Self::Stats(s) => write!(
                f,
                "{tag}{d}{}{d}{}{d}{}{d}{}{d}{}{d}{}",
                s.avg_energy, s.avg_stress, s.avg_money, s.alive, s.dead, s.occupied
            ),
            Self::End => write!(f, "{tag}"),
        }
    }
}
