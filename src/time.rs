/// Musical time expressions - transport positions and note values
///
/// Supported notations:
/// - `"bars:quarters:sixteenths"` transport time, e.g. `"0:1"` or `"1:3:2"`
/// - note values `"4n"`, `"8n"`, dotted `"4n."`, triplets `"8t"`
/// - measures `"2m"`, raw ticks `"96i"`
/// - plain numbers, read as seconds
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Ticks per quarter note
pub const PPQ: f64 = 192.0;

/// Quarter notes per measure (always 4/4)
pub const BEATS_PER_MEASURE: f64 = 4.0;

const TICKS_PER_MEASURE: f64 = PPQ * BEATS_PER_MEASURE;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimeError {
    #[error("empty time expression")]
    Empty,

    #[error("invalid time expression: {0:?}")]
    Invalid(String),

    #[error("time expression must be a finite, non-negative value: {0:?}")]
    OutOfRange(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeExpr {
    /// Wall-clock seconds; the tick position depends on tempo
    Seconds(f64),
    /// Musical ticks at `PPQ` resolution
    Ticks(f64),
}

impl TimeExpr {
    pub fn measures(count: f64) -> Self {
        TimeExpr::Ticks(count * TICKS_PER_MEASURE)
    }

    pub fn ticks(ticks: f64) -> Self {
        TimeExpr::Ticks(ticks)
    }

    /// Position in ticks at the given tempo
    pub fn to_ticks(&self, bpm: f64) -> f64 {
        match *self {
            TimeExpr::Seconds(secs) => secs * bpm / 60.0 * PPQ,
            TimeExpr::Ticks(ticks) => ticks,
        }
    }

    /// Length in seconds at the given tempo
    pub fn to_seconds(&self, bpm: f64) -> f64 {
        match *self {
            TimeExpr::Seconds(secs) => secs,
            TimeExpr::Ticks(ticks) => ticks / PPQ * 60.0 / bpm,
        }
    }
}

impl From<f64> for TimeExpr {
    fn from(secs: f64) -> Self {
        TimeExpr::Seconds(secs)
    }
}

impl fmt::Display for TimeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeExpr::Seconds(secs) => write!(f, "{}", secs),
            TimeExpr::Ticks(ticks) => write!(f, "{}i", ticks),
        }
    }
}

impl FromStr for TimeExpr {
    type Err = TimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(TimeError::Empty);
        }

        if s.contains(':') {
            return parse_transport_time(s);
        }

        if let Ok(secs) = s.parse::<f64>() {
            return Ok(TimeExpr::Seconds(non_negative(secs, s)?));
        }

        let (body, dotted) = match s.strip_suffix('.') {
            Some(body) => (body, true),
            None => (s, false),
        };

        let unit = body
            .chars()
            .last()
            .ok_or_else(|| TimeError::Invalid(s.to_string()))?;
        let value: f64 = body[..body.len() - unit.len_utf8()]
            .parse()
            .map_err(|_| TimeError::Invalid(s.to_string()))?;
        let value = non_negative(value, s)?;

        let ticks = match unit {
            'n' | 't' if value == 0.0 => return Err(TimeError::OutOfRange(s.to_string())),
            'n' => TICKS_PER_MEASURE / value,
            't' => TICKS_PER_MEASURE / value * 2.0 / 3.0,
            'm' if !dotted => value * TICKS_PER_MEASURE,
            'i' if !dotted => value,
            _ => return Err(TimeError::Invalid(s.to_string())),
        };

        Ok(TimeExpr::Ticks(if dotted { ticks * 1.5 } else { ticks }))
    }
}

fn parse_transport_time(s: &str) -> Result<TimeExpr, TimeError> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() > 3 {
        return Err(TimeError::Invalid(s.to_string()));
    }

    let weights = [TICKS_PER_MEASURE, PPQ, PPQ / 4.0];
    let mut ticks = 0.0;
    for (part, weight) in parts.iter().zip(weights) {
        let value: f64 = part
            .trim()
            .parse()
            .map_err(|_| TimeError::Invalid(s.to_string()))?;
        ticks += non_negative(value, s)? * weight;
    }

    Ok(TimeExpr::Ticks(ticks))
}

fn non_negative(value: f64, source: &str) -> Result<f64, TimeError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(TimeError::OutOfRange(source.to_string()))
    }
}
