use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Compliance outcome for one (record, parameter) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "NOK")]
    Nok,
    /// Parameter or its prerequisite dependency was absent.
    #[serde(rename = "NA")]
    Na,
}

impl Verdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Ok => "OK",
            Verdict::Nok => "NOK",
            Verdict::Na => "NA",
        }
    }

    /// `Ok` when the predicate holds, `Nok` otherwise.
    pub fn from_match(matched: bool) -> Self {
        if matched { Verdict::Ok } else { Verdict::Nok }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verdict {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OK" => Ok(Verdict::Ok),
            "NOK" => Ok(Verdict::Nok),
            "NA" => Ok(Verdict::Na),
            other => Err(format!("unknown verdict `{other}`")),
        }
    }
}

/// OK/NOK/NA counts over a verdict column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerdictTally {
    #[serde(rename = "OK")]
    pub ok: usize,
    #[serde(rename = "NOK")]
    pub nok: usize,
    #[serde(rename = "NA")]
    pub na: usize,
}

impl VerdictTally {
    /// Tally where anything that is neither OK nor NOK counts as NA.
    pub fn from_counts(total: usize, ok: usize, nok: usize) -> Self {
        Self {
            ok,
            nok,
            na: total.saturating_sub(ok + nok),
        }
    }

    pub fn record(&mut self, verdict: Verdict) {
        match verdict {
            Verdict::Ok => self.ok += 1,
            Verdict::Nok => self.nok += 1,
            Verdict::Na => self.na += 1,
        }
    }

    pub fn merge(&mut self, other: VerdictTally) {
        self.ok += other.ok;
        self.nok += other.nok;
        self.na += other.na;
    }

    pub fn total(&self) -> usize {
        self.ok + self.nok + self.na
    }

    /// Share of OK among OK and NOK, `None` when nothing was evaluated.
    pub fn compliance(&self) -> Option<f64> {
        let evaluated = self.ok + self.nok;
        if evaluated == 0 {
            None
        } else {
            Some(self.ok as f64 / evaluated as f64)
        }
    }
}

impl FromIterator<Verdict> for VerdictTally {
    fn from_iter<I: IntoIterator<Item = Verdict>>(iter: I) -> Self {
        let mut tally = VerdictTally::default();
        for verdict in iter {
            tally.record(verdict);
        }
        tally
    }
}
