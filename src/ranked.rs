use serde::{Deserialize, Deserializer};

use crate::prelude::*;

/// Per-legend aggregate ranked statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendStats {
  pub name: String,
  pub rating: i32,
  pub peak_rating: i32,
  pub tier: String,
  pub wins: u32,
  pub games: u32,
}

/// Per-2v2-team aggregate ranked statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamStats {
  pub teamname: String,
  pub rating: i32,
  pub peak_rating: i32,
  pub tier: String,
  pub wins: u32,
  pub games: u32,
  pub global_rank: Option<u32>,
}

/// Parsed ranked payload. `no_data` is set when the API answered an
/// empty body; every other field is meaningful only when it is false,
/// and `legends` is then non-empty.
#[derive(Debug, Clone, Default)]
pub struct RankedStats {
  pub no_data: bool,
  pub name: String,
  pub rating: i32,
  pub peak_rating: i32,
  pub tier: String,
  pub wins: u32,
  pub games: u32,
  pub region: String,
  pub global_rank: Option<u32>,
  pub region_rank: Option<u32>,
  pub legends: Vec<LegendStats>,
  pub tvt: Vec<TeamStats>,
}

// Typed mirrors of the wire payload. Unknown keys are ignored, absent
// ranks default to zero and are folded into `None`.

#[derive(Debug, Deserialize)]
struct RawLegend {
  legend_name_key: String,
  rating: i32,
  peak_rating: i32,
  tier: String,
  wins: u32,
  games: u32,
}

#[derive(Debug, Deserialize)]
struct RawTeam {
  teamname: String,
  rating: i32,
  peak_rating: i32,
  tier: String,
  wins: u32,
  games: u32,
  #[serde(default, deserialize_with = "zero_as_none")]
  global_rank: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawRanked {
  name: String,
  rating: i32,
  peak_rating: i32,
  tier: String,
  wins: u32,
  games: u32,
  region: String,
  #[serde(default, deserialize_with = "zero_as_none")]
  global_rank: Option<u32>,
  #[serde(default, deserialize_with = "zero_as_none")]
  region_rank: Option<u32>,
  #[serde(default)]
  legends: Vec<RawLegend>,
  #[serde(rename = "2v2", default)]
  tvt: Vec<RawTeam>,
}

/// The API reports "no rank" as 0.
fn zero_as_none<'de, D>(de: D) -> Result<Option<u32>, D::Error>
where
  D: Deserializer<'de>,
{
  let value = Option::<u32>::deserialize(de)?;
  Ok(value.filter(|rank| *rank != 0))
}

impl From<RawLegend> for LegendStats {
  fn from(raw: RawLegend) -> Self {
    Self {
      name: utils::title_case(&raw.legend_name_key),
      rating: raw.rating,
      peak_rating: raw.peak_rating,
      tier: raw.tier,
      wins: raw.wins,
      games: raw.games,
    }
  }
}

impl From<RawTeam> for TeamStats {
  fn from(raw: RawTeam) -> Self {
    Self {
      teamname: raw.teamname,
      rating: raw.rating,
      peak_rating: raw.peak_rating,
      tier: raw.tier,
      wins: raw.wins,
      games: raw.games,
      global_rank: raw.global_rank,
    }
  }
}

impl From<RawRanked> for RankedStats {
  fn from(raw: RawRanked) -> Self {
    Self {
      no_data: false,
      name: raw.name,
      rating: raw.rating,
      peak_rating: raw.peak_rating,
      tier: raw.tier,
      wins: raw.wins,
      games: raw.games,
      region: raw.region,
      global_rank: raw.global_rank,
      region_rank: raw.region_rank,
      legends: raw.legends.into_iter().map(Into::into).collect(),
      tvt: raw.tvt.into_iter().map(Into::into).collect(),
    }
  }
}

impl RankedStats {
  pub fn from_payload(payload: json::Value) -> Result<Self> {
    if payload_is_empty(&payload) {
      return Ok(Self { no_data: true, ..Self::default() });
    }
    let raw: RawRanked = json::from_value(payload)?;
    Ok(raw.into())
  }

  /// Legend with the most games. Ties keep the first in payload order.
  pub fn most_played(&self) -> Option<&LegendStats> {
    self
      .legends
      .iter()
      .reduce(|best, legend| if legend.games > best.games { legend } else { best })
  }

  /// Legend with the highest current rating. Ties keep the first.
  pub fn highest_rated(&self) -> Option<&LegendStats> {
    self
      .legends
      .iter()
      .reduce(|best, legend| if legend.rating > best.rating { legend } else { best })
  }

  /// Team with the most games, `None` when no 2v2 teams were played.
  pub fn most_played_team(&self) -> Option<&TeamStats> {
    self
      .tvt
      .iter()
      .reduce(|best, team| if team.games > best.games { team } else { best })
  }

  /// 1v1 wins plus the wins of every 2v2 team.
  pub fn total_wins(&self) -> u32 {
    self.wins + self.tvt.iter().map(|team| team.wins).sum::<u32>()
  }

  /// Estimated glory payout from peak rating and total wins.
  pub fn glory(&self) -> u32 {
    let total_wins = self.total_wins();
    if total_wins < 10 {
      return 0;
    }

    let rating = rating_glory(self.peak_rating);
    if total_wins <= 150 {
      rating + 20 * total_wins
    } else {
      let wins = f64::from(total_wins);
      rating + 245 + (450.0 * (2.0 * wins).log10().powi(2)).floor() as u32
    }
  }
}

fn payload_is_empty(value: &json::Value) -> bool {
  match value {
    json::Value::Null => true,
    json::Value::Object(map) => map.is_empty(),
    json::Value::Array(items) => items.is_empty(),
    _ => false,
  }
}

/// One row of the peak-rating glory table. Ranges are inclusive,
/// contiguous and checked in order; the first matching row wins.
struct GloryRange {
  lo: i32,
  hi: i32,
  base: f64,
  mult: f64,
  origin: i32,
  div: f64,
}

#[rustfmt::skip]
const RATING_GLORY: [GloryRange; 7] = [
  GloryRange { lo: 0,    hi: 1199,     base: 25.0,  mult: 0.0,   origin: 0,    div: 1.0 },
  GloryRange { lo: 1200, hi: 1285,     base: 25.0,  mult: 75.0,  origin: 1200, div: 86.0 },
  GloryRange { lo: 1286, hi: 1389,     base: 100.0, mult: 75.0,  origin: 1286, div: 104.0 },
  GloryRange { lo: 1390, hi: 1679,     base: 187.0, mult: 113.0, origin: 1390, div: 290.0 },
  GloryRange { lo: 1680, hi: 1999,     base: 300.0, mult: 137.0, origin: 1680, div: 320.0 },
  GloryRange { lo: 2000, hi: 2299,     base: 437.0, mult: 43.0,  origin: 2000, div: 300.0 },
  GloryRange { lo: 2300, hi: i32::MAX, base: 480.0, mult: 1.0,   origin: 2300, div: 20.0 },
];

pub(crate) fn rating_glory(peak_rating: i32) -> u32 {
  for range in &RATING_GLORY {
    if range.lo <= peak_rating && peak_rating <= range.hi {
      let value = 10.0
        * (range.base
          + range.mult * f64::from(peak_rating - range.origin) / range.div);
      return value.floor() as u32;
    }
  }
  // ratings are non-negative, so the table is exhaustive
  0
}
