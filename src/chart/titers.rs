use crate::importer::{ScalarKind, ScalarValue, ValueError};
use crate::json::JsonEvent;
use std::fmt;
use std::str::FromStr;

/// A serological measurement between an antigen and a serum.
///
/// ```
/// use acechart::Titer;
///
/// let titer: Titer = "<40".parse().unwrap();
/// assert_eq!(titer, Titer::LessThan(40));
/// assert_eq!(titer.similarity(), Some(1.0));
/// assert_eq!(titer.to_string(), "<40");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Titer {
    /// `*`: no measurement
    #[default]
    DontCare,

    Regular(u32),

    /// `~`: a regular value that is not fully trusted
    Dodgy(u32),

    /// `<`: below the given dilution
    LessThan(u32),

    /// `>`: above the given dilution
    MoreThan(u32),
}

impl Titer {
    /// The dilution without its qualifier, none for don't care
    pub fn value(&self) -> Option<u32> {
        match *self {
            Titer::DontCare => None,
            Titer::Regular(x) | Titer::Dodgy(x) | Titer::LessThan(x) | Titer::MoreThan(x) => {
                Some(x)
            }
        }
    }

    pub fn is_dont_care(&self) -> bool {
        matches!(self, Titer::DontCare)
    }

    pub fn is_regular(&self) -> bool {
        matches!(self, Titer::Regular(_))
    }

    pub fn is_dodgy(&self) -> bool {
        matches!(self, Titer::Dodgy(_))
    }

    pub fn is_less_than(&self) -> bool {
        matches!(self, Titer::LessThan(_))
    }

    pub fn is_more_than(&self) -> bool {
        matches!(self, Titer::MoreThan(_))
    }

    /// `log2(value / 10)`, shifted down by one for `<` and up by one for `>`
    pub fn similarity(&self) -> Option<f64> {
        let log = |x: u32| (f64::from(x) / 10.0).log2();
        match *self {
            Titer::DontCare => None,
            Titer::Regular(x) | Titer::Dodgy(x) => Some(log(x)),
            Titer::LessThan(x) => Some(log(x) - 1.0),
            Titer::MoreThan(x) => Some(log(x) + 1.0),
        }
    }

    /// Orders titers by value, with `<40` just below `40` and `>40` just above
    pub fn sort_key(&self) -> i64 {
        match *self {
            Titer::DontCare => 0,
            Titer::Regular(x) | Titer::Dodgy(x) => i64::from(x),
            Titer::LessThan(x) => i64::from(x) - 1,
            Titer::MoreThan(x) => i64::from(x) + 1,
        }
    }
}

/// An error that can occur when parsing a titer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TiterError(String);

impl fmt::Display for TiterError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "invalid titer: \"{}\"", self.0)
    }
}

impl std::error::Error for TiterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

impl FromStr for Titer {
    type Err = TiterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "*" {
            return Ok(Titer::DontCare);
        }

        let prefix = s.as_bytes().first().copied();
        let digits = match prefix {
            Some(b'<' | b'>' | b'~') => &s[1..],
            _ => s,
        };

        if digits.is_empty() || !digits.bytes().all(|x| x.is_ascii_digit()) {
            return Err(TiterError(s.to_string()));
        }

        let value = match digits.parse::<u32>() {
            Ok(x) if x > 0 => x,
            _ => return Err(TiterError(s.to_string())),
        };

        match prefix {
            Some(b'<') => Ok(Titer::LessThan(value)),
            Some(b'>') => Ok(Titer::MoreThan(value)),
            Some(b'~') => Ok(Titer::Dodgy(value)),
            _ => Ok(Titer::Regular(value)),
        }
    }
}

impl fmt::Display for Titer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Titer::DontCare => f.write_str("*"),
            Titer::Regular(x) => write!(f, "{}", x),
            Titer::Dodgy(x) => write!(f, "~{}", x),
            Titer::LessThan(x) => write!(f, "<{}", x),
            Titer::MoreThan(x) => write!(f, ">{}", x),
        }
    }
}

impl ScalarValue for Titer {
    const KIND: ScalarKind = ScalarKind::Text;

    fn from_event(event: &JsonEvent) -> Result<Self, ValueError> {
        match event {
            JsonEvent::String(x) => x.parse().map_err(|e: TiterError| ValueError::Invalid(e.to_string())),
            x => Err(ValueError::Kind(x.kind_name())),
        }
    }
}

/// Rows of `(serum index, titer)` pairs, one row per antigen
pub type SparseTiters = Vec<Vec<(usize, Titer)>>;

/// The titer table of a chart, stored either dense or sparse, plus the
/// tables of the sources it was merged from
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartTiters {
    pub list: Vec<Vec<Titer>>,
    pub dict: SparseTiters,
    pub layers: Vec<SparseTiters>,
}

impl ChartTiters {
    /// True if the table is stored as sparse rows
    pub fn is_sparse(&self) -> bool {
        self.list.is_empty() && !self.dict.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty() && self.dict.is_empty() && self.layers.is_empty()
    }

    /// Number of rows in whichever representation is present
    pub fn number_of_antigens(&self) -> usize {
        if self.list.is_empty() {
            self.dict.len()
        } else {
            self.list.len()
        }
    }

    pub fn number_of_layers(&self) -> usize {
        self.layers.len()
    }

    /// Missing cells are don't care
    pub fn titer(&self, antigen: usize, serum: usize) -> Titer {
        if !self.list.is_empty() {
            return self
                .list
                .get(antigen)
                .and_then(|row| row.get(serum))
                .copied()
                .unwrap_or_default();
        }

        self.dict
            .get(antigen)
            .and_then(|row| sparse_lookup(row, serum))
            .unwrap_or_default()
    }

    /// The titer of a cell in one source layer
    pub fn titer_of_layer(&self, layer: usize, antigen: usize, serum: usize) -> Titer {
        self.layers
            .get(layer)
            .and_then(|x| x.get(antigen))
            .and_then(|row| sparse_lookup(row, serum))
            .unwrap_or_default()
    }
}

fn sparse_lookup(row: &[(usize, Titer)], serum: usize) -> Option<Titer> {
    row.iter().find(|(sr, _)| *sr == serum).map(|(_, titer)| *titer)
}
