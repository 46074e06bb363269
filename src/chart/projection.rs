use crate::importer::{Sequence, SetError};
use once_cell::unsync::OnceCell;
use std::fmt;

/// Lower bound applied to column bases, written as `none`, `auto` or a
/// dilution such as `1280`.
///
/// The numeric value is computed on first use and cached until the value is
/// reassigned.
///
/// ```
/// use acechart::MinimumColumnBasis;
///
/// let mut basis = MinimumColumnBasis::default();
/// assert_eq!(basis.as_str(), "none");
/// assert_eq!(basis.value(), 0.0);
///
/// basis.set("1280").unwrap();
/// assert_eq!(basis.value(), 7.0);
/// assert!(basis.set("12x").is_err());
/// assert_eq!(basis.as_str(), "1280");
/// ```
#[derive(Clone)]
pub struct MinimumColumnBasis {
    text: String,
    cached: OnceCell<f64>,
}

impl MinimumColumnBasis {
    pub fn new(text: &str) -> Result<Self, SetError> {
        let mut result = MinimumColumnBasis::default();
        result.set(text)?;
        Ok(result)
    }

    /// Replaces the value, an unrecognized token leaves it unchanged
    pub fn set(&mut self, text: &str) -> Result<(), SetError> {
        parse_minimum_column_basis(text)?;
        self.text = text.to_string();
        self.cached = OnceCell::new();
        Ok(())
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// True for `none` and `auto`
    pub fn is_none(&self) -> bool {
        self.value() == 0.0
    }

    /// `log2(dilution / 10)`, 0 for `none` and `auto`
    pub fn value(&self) -> f64 {
        *self
            .cached
            .get_or_init(|| parse_minimum_column_basis(&self.text).unwrap_or(0.0))
    }
}

fn parse_minimum_column_basis(text: &str) -> Result<f64, SetError> {
    match text {
        "none" | "auto" => Ok(0.0),
        _ => match text.parse::<u32>() {
            Ok(x) if x > 0 && text.bytes().all(|b| b.is_ascii_digit()) => {
                Ok((f64::from(x) / 10.0).log2())
            }
            _ => Err(SetError::Value(format!(
                "unrecognized minimum column basis: \"{}\"",
                text
            ))),
        },
    }
}

impl Default for MinimumColumnBasis {
    fn default() -> Self {
        MinimumColumnBasis {
            text: String::from("none"),
            cached: OnceCell::new(),
        }
    }
}

impl PartialEq for MinimumColumnBasis {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl fmt::Debug for MinimumColumnBasis {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("MinimumColumnBasis").field(&self.text).finish()
    }
}

impl fmt::Display for MinimumColumnBasis {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// 2x2 matrix `[a, b, c, d]` mapping `(x, y)` to `(a*x + c*y, b*x + d*y)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transformation(pub [f64; 4]);

impl Transformation {
    pub const IDENTITY: Transformation = Transformation([1.0, 0.0, 0.0, 1.0]);

    pub fn is_identity(&self) -> bool {
        *self == Transformation::IDENTITY
    }

    pub fn transform(&self, x: f64, y: f64) -> (f64, f64) {
        let [a, b, c, d] = self.0;
        (a * x + c * y, b * x + d * y)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

impl Default for Transformation {
    fn default() -> Self {
        Transformation::IDENTITY
    }
}

impl Sequence for Transformation {
    type Item = f64;

    fn replace(&mut self, items: Vec<f64>) -> Result<(), SetError> {
        match <[f64; 4]>::try_from(items) {
            Ok(values) => {
                self.0 = values;
                Ok(())
            }
            Err(items) => Err(SetError::Value(format!(
                "transformation requires 4 values, found {}",
                items.len()
            ))),
        }
    }
}

/// Coordinates of every point. A point without coordinates is disconnected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layout(Vec<Vec<f64>>);

impl Layout {
    pub fn new(points: Vec<Vec<f64>>) -> Self {
        Layout(points)
    }

    pub fn number_of_points(&self) -> usize {
        self.0.len()
    }

    /// The longest coordinate tuple
    pub fn number_of_dimensions(&self) -> usize {
        self.0.iter().map(|x| x.len()).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Coordinates of a point, none if it is disconnected or out of range
    pub fn point(&self, index: usize) -> Option<&[f64]> {
        self.0
            .get(index)
            .filter(|x| !x.is_empty())
            .map(|x| x.as_slice())
    }

    pub fn is_disconnected(&self, index: usize) -> bool {
        self.point(index).is_none()
    }

    /// Euclidean distance between two connected points
    pub fn distance(&self, first: usize, second: usize) -> Option<f64> {
        let a = self.point(first)?;
        let b = self.point(second)?;
        let sum: f64 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
        Some(sum.sqrt())
    }

    /// Applies the transformation to the first two coordinates of every
    /// connected point
    pub fn transform(&mut self, transformation: &Transformation) {
        for point in self.0.iter_mut().filter(|x| x.len() >= 2) {
            let (x, y) = transformation.transform(point[0], point[1]);
            point[0] = x;
            point[1] = y;
        }
    }

    pub fn points(&self) -> &[Vec<f64>] {
        &self.0
    }

    pub fn points_mut(&mut self) -> &mut Vec<Vec<f64>> {
        &mut self.0
    }
}

/// One multidimensional scaling solution
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub comment: String,
    pub layout: Layout,

    /// -1 until computed. Non-finite values are not encoded.
    pub stress: f64,
    pub minimum_column_basis: MinimumColumnBasis,
    pub column_bases: Vec<f64>,
    pub transformation: Transformation,
    pub gradient_multipliers: Vec<f64>,
    pub titer_multipliers: Vec<f64>,
    pub dodgy_titer_is_regular: bool,
    pub stress_diff_to_stop: f64,
    pub unmovable: Vec<usize>,
    pub disconnected: Vec<usize>,
    pub unmovable_in_last_dimension: Vec<usize>,
}

impl Projection {
    /// Stress is negative until it has been computed
    pub fn has_stress(&self) -> bool {
        self.stress >= 0.0
    }

    pub fn number_of_dimensions(&self) -> usize {
        self.layout.number_of_dimensions()
    }

    /// Layout with the transformation applied
    pub fn transformed_layout(&self) -> Layout {
        let mut result = self.layout.clone();
        result.transform(&self.transformation);
        result
    }
}

impl Default for Projection {
    fn default() -> Self {
        Projection {
            comment: String::new(),
            layout: Layout::default(),
            stress: -1.0,
            minimum_column_basis: MinimumColumnBasis::default(),
            column_bases: Vec::new(),
            transformation: Transformation::IDENTITY,
            gradient_multipliers: Vec::new(),
            titer_multipliers: Vec::new(),
            dodgy_titer_is_regular: false,
            stress_diff_to_stop: 1e-10,
            unmovable: Vec::new(),
            disconnected: Vec::new(),
            unmovable_in_last_dimension: Vec::new(),
        }
    }
}
