use crate::importer::SetError;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableType {
    #[default]
    Antigenic,
    Genetic,
}

impl TableType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableType::Antigenic => "A",
            TableType::Genetic => "G",
        }
    }
}

impl FromStr for TableType {
    type Err = SetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(TableType::Antigenic),
            "G" => Ok(TableType::Genetic),
            _ => Err(SetError::Value(format!("unrecognized table type: \"{}\"", s))),
        }
    }
}

impl fmt::Display for TableType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Description of the table a chart was built from. A merged table lists the
/// tables it was built from as sources.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartInfo {
    pub virus: String,
    pub virus_type: String,
    pub assay: String,
    pub date: String,
    pub name: String,
    pub lab: String,
    pub rbc_species: String,
    pub subset: String,
    pub table_type: TableType,
    pub sources: Vec<ChartInfo>,
}

impl ChartInfo {
    /// The table date, or the range of the source dates for a merged table
    pub fn date_range(&self) -> String {
        if !self.date.is_empty() || self.sources.is_empty() {
            return self.date.clone();
        }

        let mut dates = self
            .sources
            .iter()
            .map(|x| x.date.as_str())
            .filter(|x| !x.is_empty());

        let first = match dates.next() {
            Some(x) => x,
            None => return String::new(),
        };

        let (min, max) = dates.fold((first, first), |(min, max), x| (min.min(x), max.max(x)));
        if min == max {
            min.to_string()
        } else {
            format!("{}-{}", min, max)
        }
    }

    /// Human readable table name
    ///
    /// ```
    /// use acechart::ChartInfo;
    ///
    /// let info = ChartInfo {
    ///     lab: String::from("CDC"),
    ///     virus_type: String::from("A(H3N2)"),
    ///     assay: String::from("HI"),
    ///     rbc_species: String::from("turkey"),
    ///     date: String::from("20170101"),
    ///     ..ChartInfo::default()
    /// };
    /// assert_eq!(info.make_name(), "CDC A(H3N2) HI turkey 20170101");
    /// ```
    pub fn make_name(&self) -> String {
        let date = self.date_range();
        let parts = [
            self.lab.as_str(),
            self.virus_type.as_str(),
            self.assay.as_str(),
            self.rbc_species.as_str(),
            self.name.as_str(),
            date.as_str(),
        ];

        parts
            .iter()
            .filter(|x| !x.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn number_of_sources(&self) -> usize {
        self.sources.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(date: &str) -> ChartInfo {
        ChartInfo {
            date: date.to_string(),
            ..ChartInfo::default()
        }
    }

    #[test]
    fn test_date_range_of_sources() {
        let info = ChartInfo {
            lab: String::from("NIMR"),
            sources: vec![source("20160310"), source(""), source("20151102"), source("20160101")],
            ..ChartInfo::default()
        };
        assert_eq!(info.date_range(), "20151102-20160310");
        assert_eq!(info.make_name(), "NIMR 20151102-20160310");
    }

    #[test]
    fn test_single_source_date() {
        let info = ChartInfo {
            sources: vec![source("20160310")],
            ..ChartInfo::default()
        };
        assert_eq!(info.date_range(), "20160310");
    }

    #[test]
    fn test_table_type() {
        assert_eq!(TableType::default(), TableType::Antigenic);
        assert_eq!("G".parse::<TableType>(), Ok(TableType::Genetic));
        assert!("X".parse::<TableType>().is_err());
    }
}
