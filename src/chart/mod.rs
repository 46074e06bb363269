//! In memory model of an antigenic cartography chart
//!
//! A [`Chart`] holds a serological table (antigens, sera and the titers
//! between them) and any number of [`Projection`], the multidimensional
//! scaling solutions placing every antigen and serum on a map.

mod antigen;
mod info;
mod plot_spec;
mod projection;
mod titers;

pub use self::antigen::{Annotations, Antigen, AntigenSerum, HomologousAntigens, Serum};
pub use self::info::{ChartInfo, TableType};
pub use self::plot_spec::PlotSpec;
pub use self::projection::{Layout, MinimumColumnBasis, Projection, Transformation};
pub use self::titers::{ChartTiters, SparseTiters, Titer, TiterError};

use crate::{Error, ErrorKind};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chart {
    pub info: ChartInfo,
    pub antigens: Vec<Antigen>,
    pub sera: Vec<Serum>,
    pub titers: ChartTiters,

    /// Explicit column bases, one per serum, overriding computed ones
    pub column_bases: Vec<f64>,
    pub projections: Vec<Projection>,
    pub plot_spec: PlotSpec,
}

impl Chart {
    pub fn number_of_antigens(&self) -> usize {
        self.antigens.len()
    }

    pub fn number_of_sera(&self) -> usize {
        self.sera.len()
    }

    /// Antigens come first, then sera
    pub fn number_of_points(&self) -> usize {
        self.number_of_antigens() + self.number_of_sera()
    }

    pub fn number_of_projections(&self) -> usize {
        self.projections.len()
    }

    /// Antigens with exactly this name
    pub fn find_antigens(&self, name: &str) -> Vec<usize> {
        find_by(&self.antigens, |x| x.name == name)
    }

    /// Antigens whose full name contains the fragment
    pub fn find_antigens_containing(&self, fragment: &str) -> Vec<usize> {
        find_by(&self.antigens, |x| x.full_name().contains(fragment))
    }

    /// Sera with exactly this name
    pub fn find_sera(&self, name: &str) -> Vec<usize> {
        find_by(&self.sera, |x| x.name == name)
    }

    /// Sera whose full name contains the fragment
    pub fn find_sera_containing(&self, fragment: &str) -> Vec<usize> {
        find_by(&self.sera, |x| x.full_name().contains(fragment))
    }

    pub fn antigen_index_by_full_name(&self, full_name: &str) -> Option<usize> {
        self.antigens.iter().position(|x| x.full_name() == full_name)
    }

    pub fn serum_index_by_full_name(&self, full_name: &str) -> Option<usize> {
        self.sera.iter().position(|x| x.full_name() == full_name)
    }

    pub fn reference_antigen_indices(&self) -> Vec<usize> {
        find_by(&self.antigens, |x| x.reference())
    }

    pub fn test_antigen_indices(&self) -> Vec<usize> {
        find_by(&self.antigens, |x| !x.reference())
    }

    pub fn egg_antigen_indices(&self) -> Vec<usize> {
        find_by(&self.antigens, |x| x.is_egg())
    }

    pub fn cell_antigen_indices(&self) -> Vec<usize> {
        find_by(&self.antigens, |x| !x.is_egg())
    }

    pub fn reassortant_antigen_indices(&self) -> Vec<usize> {
        find_by(&self.antigens, |x| x.is_reassortant())
    }

    /// Antigens isolated between the two ISO dates (inclusive). An empty
    /// bound is open. Antigens without a date are never selected.
    pub fn antigen_indices_by_date(&self, first: &str, last: &str) -> Vec<usize> {
        find_by(&self.antigens, |x| {
            !x.date.is_empty()
                && (first.is_empty() || x.date.as_str() >= first)
                && (last.is_empty() || x.date.as_str() <= last)
        })
    }

    /// Point indices of the sera
    pub fn serum_indices(&self) -> std::ops::Range<usize> {
        self.number_of_antigens()..self.number_of_points()
    }

    pub fn titer(&self, antigen: usize, serum: usize) -> Titer {
        self.titers.titer(antigen, serum)
    }

    /// The explicit column basis of a serum: the projection's when present,
    /// otherwise the chart's
    pub fn column_basis(&self, serum: usize, projection: usize) -> Option<f64> {
        let from_projection = self
            .projections
            .get(projection)
            .filter(|x| !x.column_bases.is_empty())
            .map(|x| &x.column_bases);

        match from_projection {
            Some(bases) => bases.get(serum).copied(),
            None => self.column_bases.get(serum).copied(),
        }
    }

    /// The lineage of the antigens, if they agree on one
    pub fn lineage(&self) -> Option<&str> {
        let mut lineages = self
            .antigens
            .iter()
            .map(|x| x.lineage.as_str())
            .filter(|x| !x.is_empty());

        let first = lineages.next()?;
        if lineages.all(|x| x == first) {
            Some(first)
        } else {
            None
        }
    }

    /// Verifies that every per point vector is sized to the table
    pub fn check(&self) -> Result<(), Error> {
        let antigens = self.number_of_antigens();
        let sera = self.number_of_sera();
        let points = self.number_of_points();

        let rows = self.titers.number_of_antigens();
        if rows != 0 && rows != antigens {
            return Err(inconsistent(format!(
                "titer table has {} rows for {} antigens",
                rows, antigens
            )));
        }

        if let Some(i) = self.titers.list.iter().position(|x| x.len() != sera) {
            return Err(inconsistent(format!(
                "titer row {} has {} columns for {} sera",
                i,
                self.titers.list[i].len(),
                sera
            )));
        }

        if let Some((row, _)) = self
            .titers
            .dict
            .iter()
            .enumerate()
            .find(|(_, row)| row.iter().any(|(sr, _)| *sr >= sera))
        {
            return Err(inconsistent(format!(
                "titer row {} refers to a serum beyond {} sera",
                row, sera
            )));
        }

        if !self.column_bases.is_empty() && self.column_bases.len() != sera {
            return Err(inconsistent(format!(
                "{} column bases for {} sera",
                self.column_bases.len(),
                sera
            )));
        }

        for (i, serum) in self.sera.iter().enumerate() {
            if let Some(ag) = serum.homologous.as_slice().iter().find(|&&x| x >= antigens) {
                return Err(inconsistent(format!(
                    "serum {} is homologous to antigen {} of {}",
                    i, ag, antigens
                )));
            }
        }

        for (i, projection) in self.projections.iter().enumerate() {
            let layout = projection.layout.number_of_points();
            if layout != 0 && layout != points {
                return Err(inconsistent(format!(
                    "projection {} layout has {} points for {} points",
                    i, layout, points
                )));
            }

            if !projection.column_bases.is_empty() && projection.column_bases.len() != sera {
                return Err(inconsistent(format!(
                    "projection {} has {} column bases for {} sera",
                    i,
                    projection.column_bases.len(),
                    sera
                )));
            }

            let per_point = [
                ("gradient multipliers", projection.gradient_multipliers.len()),
                ("titer multipliers", projection.titer_multipliers.len()),
            ];
            for (name, len) in per_point {
                if len != 0 && len != points {
                    return Err(inconsistent(format!(
                        "projection {} has {} {} for {} points",
                        i, len, name, points
                    )));
                }
            }

            let indices = projection
                .unmovable
                .iter()
                .chain(&projection.disconnected)
                .chain(&projection.unmovable_in_last_dimension);
            if let Some(x) = indices.copied().find(|&x| x >= points) {
                return Err(inconsistent(format!(
                    "projection {} refers to point {} of {}",
                    i, x, points
                )));
            }
        }

        Ok(())
    }
}

fn find_by<T>(items: &[T], predicate: impl Fn(&T) -> bool) -> Vec<usize> {
    items
        .iter()
        .enumerate()
        .filter(|(_, x)| predicate(x))
        .map(|(i, _)| i)
        .collect()
}

fn inconsistent(msg: String) -> Error {
    Error::new(ErrorKind::Inconsistent(msg))
}
