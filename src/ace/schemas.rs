//! Field tables binding the keys of the ACE format to the chart model
//!
//! The tables are built on first use and shared afterwards. They can be
//! handed to an [`Importer`](crate::importer::Importer) to decode a fragment
//! of a chart on its own:
//!
//! ```
//! use acechart::ace::schemas;
//! use acechart::importer;
//!
//! let antigen = importer::import(br#"{"N": "B/X/2/2021", "a": ["DISTINCT"]}"#, schemas::antigen())?;
//! assert!(antigen.annotations.distinct());
//! # Ok::<(), acechart::Error>(())
//! ```

use super::{Envelope, ACE_VERSION};
use crate::chart::{
    Antigen, Chart, ChartInfo, ChartTiters, Projection, Serum, SparseTiters, TableType, Titer,
};
use crate::importer::{
    downcast, CustomFrame, Field, Frame, FrameError, PathSegment, ScalarValue, Schema, SetError,
    Step,
};
use crate::json::JsonEvent;
use once_cell::sync::Lazy;

static ENVELOPE: Lazy<Schema<Envelope>> = Lazy::new(|| {
    Schema::new("Envelope")
        .field(Field::setter("_", |x: &mut Envelope, v: String| {
            x.indentation = v
        }))
        .field(Field::try_setter("  version", |x: &mut Envelope, v: String| {
            if v == ACE_VERSION {
                x.version = Some(v);
                Ok(())
            } else {
                Err(SetError::Version(Some(v)))
            }
        }))
        .field(Field::object("c", |x: &mut Envelope| &mut x.chart, chart).requires(
            |x: &Envelope| match x.version {
                Some(_) => Ok(()),
                None => Err(SetError::Version(None)),
            },
        ))
});

static CHART: Lazy<Schema<Chart>> = Lazy::new(|| {
    Schema::new("Chart")
        .field(Field::object("i", |x: &mut Chart| &mut x.info, chart_info))
        .field(Field::array_of_objects("a", |x: &mut Chart| &mut x.antigens, antigen))
        .field(Field::array_of_objects("s", |x: &mut Chart| &mut x.sera, serum))
        .field(Field::object("t", |x: &mut Chart| &mut x.titers, titers))
        .field(Field::array("C", |x: &mut Chart| &mut x.column_bases))
        .field(Field::array_of_objects("P", |x: &mut Chart| &mut x.projections, projection))
        .field(Field::passthrough("p", |x: &mut Chart| &mut x.plot_spec))
});

static CHART_INFO: Lazy<Schema<ChartInfo>> = Lazy::new(|| {
    Schema::new("ChartInfo")
        .field(Field::setter("v", |x: &mut ChartInfo, v: String| x.virus = v))
        .field(Field::setter("V", |x: &mut ChartInfo, v: String| x.virus_type = v))
        .field(Field::setter("A", |x: &mut ChartInfo, v: String| x.assay = v))
        .field(Field::setter("D", |x: &mut ChartInfo, v: String| x.date = v))
        .field(Field::setter("N", |x: &mut ChartInfo, v: String| x.name = v))
        .field(Field::setter("l", |x: &mut ChartInfo, v: String| x.lab = v))
        .field(Field::setter("r", |x: &mut ChartInfo, v: String| x.rbc_species = v))
        .field(Field::setter("s", |x: &mut ChartInfo, v: String| x.subset = v))
        .field(Field::try_setter("T", |x: &mut ChartInfo, v: String| {
            x.table_type = v.parse::<TableType>()?;
            Ok(())
        }))
        .field(Field::array_of_objects("S", |x: &mut ChartInfo| &mut x.sources, chart_info))
});

static TITERS: Lazy<Schema<ChartTiters>> = Lazy::new(|| {
    Schema::new("ChartTiters")
        .field(Field::array_of_arrays("l", |x: &mut ChartTiters| &mut x.list))
        .field(Field::custom::<TiterDictFrame>("d", |x: &mut ChartTiters| &mut x.dict))
        .field(Field::custom::<TiterLayersFrame>("L", |x: &mut ChartTiters| &mut x.layers))
});

static ANTIGEN: Lazy<Schema<Antigen>> = Lazy::new(|| {
    Schema::new("Antigen")
        .field(Field::setter("N", |x: &mut Antigen, v: String| x.name = v))
        .field(Field::setter("D", |x: &mut Antigen, v: String| x.date = v))
        .field(Field::setter("L", |x: &mut Antigen, v: String| x.lineage = v))
        .field(Field::setter("P", |x: &mut Antigen, v: String| x.passage = v))
        .field(Field::setter("R", |x: &mut Antigen, v: String| x.reassortant = v))
        .field(Field::array("l", |x: &mut Antigen| &mut x.lab_ids))
        .field(Field::setter("S", |x: &mut Antigen, v: String| x.semantic = v))
        .field(Field::array("a", |x: &mut Antigen| &mut x.annotations))
        .field(Field::array("c", |x: &mut Antigen| &mut x.clades))
});

static SERUM: Lazy<Schema<Serum>> = Lazy::new(|| {
    Schema::new("Serum")
        .field(Field::setter("N", |x: &mut Serum, v: String| x.name = v))
        .field(Field::setter("L", |x: &mut Serum, v: String| x.lineage = v))
        .field(Field::setter("P", |x: &mut Serum, v: String| x.passage = v))
        .field(Field::setter("R", |x: &mut Serum, v: String| x.reassortant = v))
        .field(Field::setter("I", |x: &mut Serum, v: String| x.serum_id = v))
        .field(Field::setter("S", |x: &mut Serum, v: String| x.semantic = v))
        .field(Field::array("h", |x: &mut Serum| &mut x.homologous))
        .field(Field::array("a", |x: &mut Serum| &mut x.annotations))
        .field(Field::setter("s", |x: &mut Serum, v: String| x.serum_species = v))
});

static PROJECTION: Lazy<Schema<Projection>> = Lazy::new(|| {
    Schema::new("Projection")
        .field(Field::setter("c", |x: &mut Projection, v: String| x.comment = v))
        .field(Field::array_of_arrays("l", |x: &mut Projection| x.layout.points_mut()))
        .field(Field::setter("s", |x: &mut Projection, v: f64| x.stress = v))
        .field(Field::try_setter("m", |x: &mut Projection, v: String| {
            x.minimum_column_basis.set(&v)
        }))
        .field(Field::array("C", |x: &mut Projection| &mut x.column_bases))
        .field(Field::array("t", |x: &mut Projection| &mut x.transformation))
        .field(Field::array("g", |x: &mut Projection| &mut x.gradient_multipliers))
        .field(Field::array("f", |x: &mut Projection| &mut x.titer_multipliers))
        .field(Field::setter("d", |x: &mut Projection, v: bool| {
            x.dodgy_titer_is_regular = v
        }))
        .field(Field::setter("e", |x: &mut Projection, v: f64| {
            x.stress_diff_to_stop = v
        }))
        .field(Field::array("U", |x: &mut Projection| &mut x.unmovable))
        .field(Field::array("D", |x: &mut Projection| &mut x.disconnected))
        .field(Field::array("u", |x: &mut Projection| {
            &mut x.unmovable_in_last_dimension
        }))
});

pub fn envelope() -> &'static Schema<Envelope> {
    &ENVELOPE
}

pub fn chart() -> &'static Schema<Chart> {
    &CHART
}

pub fn chart_info() -> &'static Schema<ChartInfo> {
    &CHART_INFO
}

pub fn titers() -> &'static Schema<ChartTiters> {
    &TITERS
}

pub fn antigen() -> &'static Schema<Antigen> {
    &ANTIGEN
}

pub fn serum() -> &'static Schema<Serum> {
    &SERUM
}

pub fn projection() -> &'static Schema<Projection> {
    &PROJECTION
}

/// Decodes sparse titer rows: an array of `{"<serum index>": "<titer>"}`
/// objects, one per antigen
#[derive(Debug, Default)]
pub struct TiterDictFrame {
    rows: SparseTiters,
    started: bool,
    row: Option<Vec<(usize, Titer)>>,
    serum: Option<usize>,
}

impl TiterDictFrame {
    fn started() -> Self {
        TiterDictFrame {
            started: true,
            ..TiterDictFrame::default()
        }
    }
}

impl Frame for TiterDictFrame {
    fn name(&self) -> &'static str {
        "sparse titers"
    }

    fn event(&mut self, event: &JsonEvent) -> Result<Step, FrameError> {
        if !self.started {
            return match event {
                JsonEvent::StartArray => {
                    self.started = true;
                    Ok(Step::Continue)
                }
                _ => Err(FrameError::Unexpected),
            };
        }

        let row = match self.row.as_mut() {
            Some(row) => row,
            None => {
                return match event {
                    JsonEvent::StartObject => {
                        self.row = Some(Vec::new());
                        Ok(Step::Continue)
                    }
                    JsonEvent::EndArray => Ok(Step::Complete),
                    _ => Err(FrameError::Unexpected),
                }
            }
        };

        match (self.serum.take(), event) {
            (None, JsonEvent::Key(key)) => {
                let serum = key.parse::<usize>().map_err(|_| {
                    FrameError::Invalid(format!("serum index expected, found \"{}\"", key))
                })?;
                self.serum = Some(serum);
                Ok(Step::Continue)
            }
            (None, JsonEvent::EndObject) => {
                let row = std::mem::take(row);
                self.rows.push(row);
                self.row = None;
                Ok(Step::Continue)
            }
            (None, _) => Err(FrameError::Unexpected),
            (Some(serum), event) => {
                let titer = Titer::from_event(event).map_err(FrameError::from_value::<Titer>)?;
                match row.iter_mut().find(|(sr, _)| *sr == serum) {
                    Some(entry) => entry.1 = titer,
                    None => row.push((serum, titer)),
                }
                Ok(Step::Continue)
            }
        }
    }
}

impl CustomFrame for TiterDictFrame {
    type Target = SparseTiters;

    fn open(mut target: SparseTiters) -> Self {
        target.clear();
        TiterDictFrame {
            rows: target,
            ..TiterDictFrame::default()
        }
    }

    fn close(self) -> SparseTiters {
        self.rows
    }
}

/// Decodes the sparse titer tables of every source of a merged chart
#[derive(Debug, Default)]
pub struct TiterLayersFrame {
    layers: Vec<SparseTiters>,
    started: bool,
}

impl Frame for TiterLayersFrame {
    fn name(&self) -> &'static str {
        "titer layers"
    }

    fn event(&mut self, event: &JsonEvent) -> Result<Step, FrameError> {
        match (self.started, event) {
            (false, JsonEvent::StartArray) => {
                self.started = true;
                Ok(Step::Continue)
            }
            (true, JsonEvent::StartArray) => {
                let segment = PathSegment::Index(self.layers.len());
                Ok(Step::Push(Box::new(TiterDictFrame::started()), segment))
            }
            (true, JsonEvent::EndArray) => Ok(Step::Complete),
            _ => Err(FrameError::Unexpected),
        }
    }

    fn resume(&mut self, child: Box<dyn Frame>) -> Result<(), FrameError> {
        let layer = downcast::<TiterDictFrame>(child)?;
        self.layers.push(layer.close());
        Ok(())
    }
}

impl CustomFrame for TiterLayersFrame {
    type Target = Vec<SparseTiters>;

    fn open(mut target: Vec<SparseTiters>) -> Self {
        target.clear();
        TiterLayersFrame {
            layers: target,
            started: false,
        }
    }

    fn close(self) -> Vec<SparseTiters> {
        self.layers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::{FieldKind, Importer, ScalarKind};

    fn keys<T>(schema: &Schema<T>) -> String {
        schema.keys().collect::<Vec<_>>().join(",")
    }

    #[test]
    fn test_schema_keys() {
        assert_eq!(keys(envelope()), "_,  version,c");
        assert_eq!(keys(chart()), "i,a,s,t,C,P,p");
        assert_eq!(keys(chart_info()), "v,V,A,D,N,l,r,s,T,S");
        assert_eq!(keys(titers()), "l,d,L");
    }

    #[test]
    fn test_antigen_and_serum_keys() {
        let mut antigen_keys: Vec<_> = antigen().keys().collect();
        antigen_keys.sort_unstable();
        assert_eq!(antigen_keys, vec!["D", "L", "N", "P", "R", "S", "a", "c", "l"]);

        let mut serum_keys: Vec<_> = serum().keys().collect();
        serum_keys.sort_unstable();
        assert_eq!(serum_keys, vec!["I", "L", "N", "P", "R", "S", "a", "h", "s"]);
    }

    #[test]
    fn test_projection_field_kinds() {
        let kind = |key: &str| projection().find(key).map(|(_, x)| x.kind());
        assert_eq!(kind("s"), Some(FieldKind::Scalar(ScalarKind::Double)));
        assert_eq!(kind("d"), Some(FieldKind::Scalar(ScalarKind::Bool)));
        assert_eq!(kind("l"), Some(FieldKind::ArrayOfArrays(ScalarKind::Double)));
        assert_eq!(kind("U"), Some(FieldKind::ScalarArray(ScalarKind::Unsigned)));
        assert_eq!(kind("t"), Some(FieldKind::ScalarArray(ScalarKind::Double)));
        assert_eq!(projection().len(), 13);
    }

    #[test]
    fn test_sparse_titers() {
        let data = br#"{"d": [{"0": "40", "2": "<10"}, {}, {"1": "~80"}]}"#;
        let titers = Importer::new().import(data, titers()).unwrap();
        assert_eq!(
            titers.dict,
            vec![
                vec![(0, Titer::Regular(40)), (2, Titer::LessThan(10))],
                vec![],
                vec![(1, Titer::Dodgy(80))],
            ]
        );
    }

    #[test]
    fn test_sparse_titers_repeated_serum() {
        let data = br#"{"d": [{"0": "40", "1": "*", "0": "80"}], "L": [[{"2": "<10", "2": "20"}]]}"#;
        let titers = Importer::new().import(data, titers()).unwrap();
        assert_eq!(
            titers.dict,
            vec![vec![(0, Titer::Regular(80)), (1, Titer::DontCare)]]
        );
        assert_eq!(titers.layers[0][0], vec![(2, Titer::Regular(20))]);
        assert_eq!(titers.titer_of_layer(0, 0, 2), Titer::Regular(20));
    }

    #[test]
    fn test_titer_layers() {
        let data = br#"{"L": [[{"0": "40"}], [{"0": ">1280"}, {"1": "*"}]]}"#;
        let titers = Importer::new().import(data, titers()).unwrap();
        assert_eq!(titers.number_of_layers(), 2);
        assert_eq!(titers.titer_of_layer(1, 0, 0), Titer::MoreThan(1280));
        assert_eq!(titers.layers[1][1], vec![(1, Titer::DontCare)]);
    }

    #[test]
    fn test_sparse_titer_errors() {
        let err = Importer::new()
            .import(br#"{"d": [{"x": "40"}]}"#, titers())
            .unwrap_err();
        assert_eq!(err.path(), Some("d"));

        let err = Importer::new()
            .import(br#"{"d": [{"0": 40}]}"#, titers())
            .unwrap_err();
        assert!(matches!(
            err.kind(),
            crate::ErrorKind::ValueKind {
                expected: ScalarKind::Text,
                found: "Uint",
                ..
            }
        ));

        let err = Importer::new()
            .import(br#"{"L": [[{"0": "4x"}]]}"#, titers())
            .unwrap_err();
        assert_eq!(err.path(), Some("L[0]"));
    }
}
