use super::{ACE_VERSION, INDENTATION_HINT};
use crate::chart::{
    Antigen, Chart, ChartInfo, ChartTiters, Projection, Serum, SparseTiters, TableType, Titer,
};
use crate::Error;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::path::Path;
use tracing::debug;

/// Codec applied to encoded output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    /// Plain JSON
    #[default]
    None,

    #[cfg(feature = "gzip")]
    Gzip,

    /// The codec acmacs tools write `.ace` files with
    #[cfg(feature = "xz")]
    Xz,
}

/// Customizes how charts are encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncodeOptions {
    /// Controls if the JSON should be pretty printed
    pretty: bool,

    /// Codec for the output
    compression: Compression,
}

impl EncodeOptions {
    /// Creates the structure with default options
    pub fn new() -> Self {
        EncodeOptions::default()
    }

    /// Sets if the JSON should be pretty printed or minified
    pub fn with_prettyprint(mut self, pretty: bool) -> EncodeOptions {
        self.pretty = pretty;
        self
    }

    /// Sets the codec the output is compressed with
    pub fn with_compression(mut self, compression: Compression) -> EncodeOptions {
        self.compression = compression;
        self
    }

    /// Returns the factor to multiply the number of points for a size
    /// estimate
    fn output_len_factor(&self) -> usize {
        if self.pretty {
            400
        } else {
            150
        }
    }
}

/// Encodes a chart as an ACE document
///
/// ```
/// use acechart::{ace, Antigen, Chart};
///
/// let chart = Chart {
///     antigens: vec![Antigen::new("A/X/1/2020")],
///     ..Chart::default()
/// };
/// let data = ace::write_chart(&chart, &ace::EncodeOptions::new())?;
/// assert_eq!(ace::read_chart(&data)?, chart);
/// # Ok::<(), acechart::Error>(())
/// ```
pub fn write_chart(chart: &Chart, options: &EncodeOptions) -> Result<Vec<u8>, Error> {
    let capacity = (chart.number_of_points() + 1) * options.output_len_factor();
    let out = encode_json(&AceEnvelope(chart), options, capacity)?;
    debug!(bytes = out.len(), compression = ?options.compression, "encoded chart");
    Ok(out)
}

fn encode_json<S: Serialize>(
    ser: S,
    options: &EncodeOptions,
    capacity: usize,
) -> Result<Vec<u8>, Error> {
    match options.compression {
        Compression::None => {
            let mut out = Vec::with_capacity(capacity);
            writer_json(&mut out, options.pretty, ser)?;
            Ok(out)
        }
        #[cfg(feature = "gzip")]
        Compression::Gzip => {
            let out = Vec::with_capacity(capacity / 4);
            let mut encoder = flate2::write::GzEncoder::new(out, flate2::Compression::default());
            writer_json(&mut encoder, options.pretty, ser)?;
            Ok(encoder.finish()?)
        }
        #[cfg(feature = "xz")]
        Compression::Xz => {
            let mut encoder = xz2::write::XzEncoder::new(Vec::with_capacity(capacity / 8), 6);
            writer_json(&mut encoder, options.pretty, ser)?;
            Ok(encoder.finish()?)
        }
    }
}

/// Encodes a chart into a file, replacing it if it exists
pub fn export_chart<P: AsRef<Path>>(
    path: P,
    chart: &Chart,
    options: &EncodeOptions,
) -> Result<(), Error> {
    let data = write_chart(chart, options)?;
    std::fs::write(path, data)?;
    Ok(())
}

fn writer_json<W, S>(writer: W, pretty: bool, ser: S) -> Result<(), std::io::Error>
where
    W: std::io::Write,
    S: serde::Serialize,
{
    let result = if pretty {
        serde_json::to_writer_pretty(writer, &ser)
    } else {
        serde_json::to_writer(writer, &ser)
    };

    result.map_err(|e| e.into())
}

struct AceEnvelope<'a>(&'a Chart);

impl<'a> Serialize for AceEnvelope<'a> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("_", INDENTATION_HINT)?;
        map.serialize_entry("  version", ACE_VERSION)?;
        map.serialize_entry("c", &Ace(self.0))?;
        map.end()
    }
}

/// ACE representation of a model type
struct Ace<'a, T>(&'a T);

/// ACE representation of a list of model types
struct AceSeq<'a, T>(&'a [T]);

impl<'a, T> Serialize for AceSeq<'a, T>
where
    Ace<'a, T>: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(self.0.iter().map(Ace))
    }
}

/// Writes `key` only when the text is not empty
fn text_entry<M: SerializeMap>(map: &mut M, key: &str, value: &str) -> Result<(), M::Error> {
    if value.is_empty() {
        Ok(())
    } else {
        map.serialize_entry(key, value)
    }
}

/// Writes `key` only when the list is not empty
fn list_entry<M, V>(map: &mut M, key: &str, values: &[V]) -> Result<(), M::Error>
where
    M: SerializeMap,
    V: Serialize,
{
    if values.is_empty() {
        Ok(())
    } else {
        map.serialize_entry(key, values)
    }
}

impl<'a> Serialize for Ace<'a, Chart> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let chart = self.0;
        let mut map = serializer.serialize_map(None)?;
        if chart.info != ChartInfo::default() {
            map.serialize_entry("i", &Ace(&chart.info))?;
        }

        if !chart.antigens.is_empty() {
            map.serialize_entry("a", &AceSeq(&chart.antigens))?;
        }

        if !chart.sera.is_empty() {
            map.serialize_entry("s", &AceSeq(&chart.sera))?;
        }

        if !chart.titers.is_empty() {
            map.serialize_entry("t", &Ace(&chart.titers))?;
        }

        list_entry(&mut map, "C", &chart.column_bases)?;
        if !chart.projections.is_empty() {
            map.serialize_entry("P", &AceSeq(&chart.projections))?;
        }

        if !chart.plot_spec.is_empty() {
            map.serialize_entry("p", chart.plot_spec.as_value())?;
        }

        map.end()
    }
}

impl<'a> Serialize for Ace<'a, ChartInfo> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let info = self.0;
        let mut map = serializer.serialize_map(None)?;
        text_entry(&mut map, "v", &info.virus)?;
        text_entry(&mut map, "V", &info.virus_type)?;
        text_entry(&mut map, "A", &info.assay)?;
        text_entry(&mut map, "D", &info.date)?;
        text_entry(&mut map, "N", &info.name)?;
        text_entry(&mut map, "l", &info.lab)?;
        text_entry(&mut map, "r", &info.rbc_species)?;
        text_entry(&mut map, "s", &info.subset)?;
        if info.table_type != TableType::default() {
            map.serialize_entry("T", info.table_type.as_str())?;
        }

        if !info.sources.is_empty() {
            map.serialize_entry("S", &AceSeq(&info.sources))?;
        }

        map.end()
    }
}

impl<'a> Serialize for Ace<'a, Antigen> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let antigen = self.0;
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("N", &antigen.name)?;
        text_entry(&mut map, "D", &antigen.date)?;
        text_entry(&mut map, "L", &antigen.lineage)?;
        text_entry(&mut map, "P", &antigen.passage)?;
        text_entry(&mut map, "R", &antigen.reassortant)?;
        list_entry(&mut map, "l", &antigen.lab_ids)?;
        text_entry(&mut map, "S", &antigen.semantic)?;
        list_entry(&mut map, "a", antigen.annotations.as_slice())?;
        list_entry(&mut map, "c", &antigen.clades)?;
        map.end()
    }
}

impl<'a> Serialize for Ace<'a, Serum> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let serum = self.0;
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("N", &serum.name)?;
        text_entry(&mut map, "L", &serum.lineage)?;
        text_entry(&mut map, "P", &serum.passage)?;
        text_entry(&mut map, "R", &serum.reassortant)?;
        text_entry(&mut map, "I", &serum.serum_id)?;
        text_entry(&mut map, "S", &serum.semantic)?;
        list_entry(&mut map, "h", serum.homologous.as_slice())?;
        list_entry(&mut map, "a", serum.annotations.as_slice())?;
        text_entry(&mut map, "s", &serum.serum_species)?;
        map.end()
    }
}

impl<'a> Serialize for Ace<'a, Projection> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let projection = self.0;
        let defaults = Projection::default();
        let mut map = serializer.serialize_map(None)?;
        text_entry(&mut map, "c", &projection.comment)?;
        list_entry(&mut map, "l", projection.layout.points())?;
        // JSON has no NaN or infinity, those are written as "not computed"
        if projection.stress != defaults.stress && projection.stress.is_finite() {
            map.serialize_entry("s", &projection.stress)?;
        }

        if projection.minimum_column_basis != defaults.minimum_column_basis {
            map.serialize_entry("m", projection.minimum_column_basis.as_str())?;
        }

        list_entry(&mut map, "C", &projection.column_bases)?;
        if !projection.transformation.is_identity() {
            map.serialize_entry("t", projection.transformation.as_slice())?;
        }

        list_entry(&mut map, "g", &projection.gradient_multipliers)?;
        list_entry(&mut map, "f", &projection.titer_multipliers)?;
        if projection.dodgy_titer_is_regular {
            map.serialize_entry("d", &true)?;
        }

        if projection.stress_diff_to_stop != defaults.stress_diff_to_stop {
            map.serialize_entry("e", &projection.stress_diff_to_stop)?;
        }

        list_entry(&mut map, "U", &projection.unmovable)?;
        list_entry(&mut map, "D", &projection.disconnected)?;
        list_entry(&mut map, "u", &projection.unmovable_in_last_dimension)?;
        map.end()
    }
}

impl<'a> Serialize for Ace<'a, ChartTiters> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let titers = self.0;
        let mut map = serializer.serialize_map(None)?;
        if !titers.list.is_empty() {
            map.serialize_entry("l", &DenseRows(&titers.list))?;
        }

        if !titers.dict.is_empty() {
            map.serialize_entry("d", &SparseRows(&titers.dict))?;
        }

        if !titers.layers.is_empty() {
            map.serialize_entry("L", &Layers(&titers.layers))?;
        }

        map.end()
    }
}

/// Dense titer rows, one per antigen
struct DenseRows<'a>(&'a [Vec<Titer>]);

impl<'a> Serialize for DenseRows<'a> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(self.0.iter().map(|row| TiterRow(row)))
    }
}

struct TiterRow<'a>(&'a [Titer]);

impl<'a> Serialize for TiterRow<'a> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(self.0.iter().map(AceTiter))
    }
}

struct Layers<'a>(&'a [SparseTiters]);

impl<'a> Serialize for Layers<'a> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(self.0.iter().map(|layer| SparseRows(layer)))
    }
}

struct AceTiter<'a>(&'a Titer);

impl<'a> Serialize for AceTiter<'a> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self.0)
    }
}

/// Sparse titer rows, each an object keyed by serum index
struct SparseRows<'a>(&'a [Vec<(usize, Titer)>]);

impl<'a> Serialize for SparseRows<'a> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(self.0.iter().map(|row| SparseRow(row)))
    }
}

struct SparseRow<'a>(&'a [(usize, Titer)]);

impl<'a> Serialize for SparseRow<'a> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;

        #[cfg(feature = "faster_writer")]
        let mut buffer = itoa::Buffer::new();

        for (serum, titer) in self.0 {
            #[cfg(feature = "faster_writer")]
            let key = buffer.format(*serum);

            #[cfg(not(feature = "faster_writer"))]
            let key = serum.to_string();

            map.serialize_entry(&key, &AceTiter(titer))?;
        }

        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{Annotations, HomologousAntigens, Layout, MinimumColumnBasis};
    use rstest::*;
    use serde_json::{json, Value};

    fn encode(chart: &Chart) -> Value {
        let data = write_chart(chart, &EncodeOptions::new()).unwrap();
        serde_json::from_slice(&data).unwrap()
    }

    #[test]
    fn test_envelope_order() {
        let data = write_chart(&Chart::default(), &EncodeOptions::new()).unwrap();
        assert_eq!(
            std::str::from_utf8(&data).unwrap(),
            r#"{"_":"-*- js-indent-level: 1 -*-","  version":"acmacs-ace-v1","c":{}}"#
        );
    }

    #[test]
    fn test_empty_fields_are_omitted() {
        let chart = Chart {
            antigens: vec![Antigen::new("A/X/1/2020")],
            sera: vec![Serum {
                serum_id: String::from("F1"),
                homologous: HomologousAntigens::from(vec![0]),
                annotations: Annotations::from(vec!["CONC"]),
                ..Serum::new("A/X/1/2020")
            }],
            projections: vec![Projection::default()],
            ..Chart::default()
        };

        assert_eq!(
            encode(&chart)["c"],
            json!({
                "a": [{"N": "A/X/1/2020"}],
                "s": [{"N": "A/X/1/2020", "I": "F1", "h": [0], "a": ["CONC"]}],
                "P": [{}],
            })
        );
    }

    #[test]
    fn test_projection_fields() {
        let projection = Projection {
            layout: Layout::new(vec![vec![1.0, 2.0], vec![]]),
            stress: 3.5,
            minimum_column_basis: MinimumColumnBasis::new("1280").unwrap(),
            dodgy_titer_is_regular: true,
            disconnected: vec![1],
            ..Projection::default()
        };
        let chart = Chart {
            projections: vec![projection],
            ..Chart::default()
        };

        assert_eq!(
            encode(&chart)["c"]["P"][0],
            json!({"l": [[1.0, 2.0], []], "s": 3.5, "m": "1280", "d": true, "D": [1]})
        );
    }

    #[rstest]
    #[case(-1.0, None)]
    #[case(-2.5, Some(-2.5))]
    #[case(0.0, Some(0.0))]
    #[case(f64::NAN, None)]
    #[case(f64::INFINITY, None)]
    fn test_stress(#[case] stress: f64, #[case] expected: Option<f64>) {
        let chart = Chart {
            projections: vec![Projection {
                stress,
                ..Projection::default()
            }],
            ..Chart::default()
        };

        let written = encode(&chart)["c"]["P"][0].get("s").and_then(Value::as_f64);
        assert_eq!(written, expected);

        let data = write_chart(&chart, &EncodeOptions::new()).unwrap();
        let decoded = crate::ace::read_chart(&data).unwrap();
        assert_eq!(decoded.projections[0].stress, expected.unwrap_or(-1.0));
    }

    #[test]
    fn test_titers() {
        let chart = Chart {
            titers: ChartTiters {
                list: vec![vec![Titer::Regular(40), Titer::DontCare]],
                dict: vec![vec![(3, Titer::LessThan(10))], vec![]],
                layers: vec![vec![vec![(12, Titer::Dodgy(80))]]],
            },
            ..Chart::default()
        };

        assert_eq!(
            encode(&chart)["c"]["t"],
            json!({
                "l": [["40", "*"]],
                "d": [{"3": "<10"}, {}],
                "L": [[{"12": "~80"}]],
            })
        );
    }

    #[test]
    fn test_pretty() {
        let options = EncodeOptions::new().with_prettyprint(true);
        let data = write_chart(&Chart::default(), &options).unwrap();
        assert!(data.contains(&b'\n'));
    }
}
