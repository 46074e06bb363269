use acechart::ace::{self, schemas, DecodeOptions, Envelope};
use acechart::importer::{self, ScalarKind};
use acechart::{Annotations, Antigen, AntigenSerum, ErrorKind, Titer};

const CHART: &str = r#"{
 "_": "-*- js-indent-level: 1 -*-",
 "  version": "acmacs-ace-v1",
 "c": {
  "i": {"v": "INFLUENZA", "V": "B", "A": "HI", "D": "20170315", "l": "CDC", "r": "turkey"},
  "a": [
   {"N": "B/BRISBANE/60/2008", "P": "E4", "D": "2008-08-04", "L": "VICTORIA", "S": "R", "l": ["CDC#2008703517"]},
   {"N": "B/TEXAS/2/2017", "P": "MDCK1", "D": "2017-01-22", "L": "VICTORIA", "c": ["1A", "V1A"]},
   {"N": "B/TEXAS/2/2017", "R": "NYMC BX-35", "a": ["DISTINCT"]}
  ],
  "s": [
   {"N": "B/BRISBANE/60/2008", "P": "E4", "I": "F1", "L": "VICTORIA", "h": [0], "s": "FERRET"},
   {"N": "B/TEXAS/2/2017", "I": "F2", "h": [1, 2, 1]}
  ],
  "t": {"l": [["1280", "<10"], ["~160", ">2560"], ["*", "40"]]},
  "C": [7.0, 8],
  "P": [
   {
    "c": "best",
    "s": 12.5,
    "m": "1280",
    "l": [[0.0, 1.0], [1.5, -2.25], [], [3.0, 3.0], [0, 1]],
    "t": [0, 1, -1, 0],
    "D": [2],
    "d": true
   }
  ],
  "p": {"d": [1, 2, 3], "P": [{"c": "red"}]}
 }
}"#;

#[test]
fn decode_full_chart() {
    let chart = ace::read_chart(CHART.as_bytes()).unwrap();
    assert_eq!(chart.number_of_antigens(), 3);
    assert_eq!(chart.number_of_sera(), 2);
    assert_eq!(chart.number_of_points(), 5);

    assert_eq!(chart.info.make_name(), "CDC B HI turkey 20170315");
    assert_eq!(chart.antigens[0].full_name(), "B/BRISBANE/60/2008 E4");
    assert!(chart.antigens[0].has_lab_id("CDC#2008703517"));
    assert_eq!(chart.antigens[1].clades, vec!["1A", "V1A"]);
    assert!(chart.antigens[2].distinct());
    assert_eq!(chart.sera[0].serum_species, "FERRET");
    assert_eq!(chart.sera[1].homologous.as_slice(), &[1, 2]);

    assert_eq!(chart.titer(0, 1), Titer::LessThan(10));
    assert_eq!(chart.titer(1, 0), Titer::Dodgy(160));
    assert_eq!(chart.titer(2, 0), Titer::DontCare);
    assert_eq!(chart.column_bases, vec![7.0, 8.0]);
    assert_eq!(chart.column_basis(1, 0), Some(8.0));

    let projection = &chart.projections[0];
    assert_eq!(projection.comment, "best");
    assert_eq!(projection.stress, 12.5);
    assert_eq!(projection.minimum_column_basis.value(), 7.0);
    assert_eq!(projection.layout.number_of_points(), chart.number_of_points());
    assert!(projection.layout.is_disconnected(2));
    assert_eq!(projection.disconnected, vec![2]);
    assert!(projection.dodgy_titer_is_regular);
    assert_eq!(projection.transformation.transform(1.0, 0.0), (0.0, 1.0));
    assert_eq!(projection.stress_diff_to_stop, 1e-10);

    assert_eq!(chart.plot_spec.as_value()["P"][0]["c"], "red");
    assert_eq!(chart.lineage(), Some("VICTORIA"));
}

#[test]
fn decode_queries() {
    let chart = ace::read_chart(CHART.as_bytes()).unwrap();
    assert_eq!(chart.reference_antigen_indices(), vec![0]);
    assert_eq!(chart.egg_antigen_indices(), vec![0, 2]);
    assert_eq!(chart.reassortant_antigen_indices(), vec![2]);
    assert_eq!(chart.find_antigens("B/TEXAS/2/2017"), vec![1, 2]);
    assert_eq!(chart.find_sera_containing("F2"), vec![1]);
    assert_eq!(chart.antigen_indices_by_date("2010-01-01", ""), vec![1]);
    assert_eq!(chart.serum_indices(), 3..5);
}

#[test]
fn decode_unrecognized_version() {
    let data = br#"{"_":"","  version":"bogus","c":{"a":[{"N":"A/X/1/2020"}],"s":[{"N":"B"}]}}"#;
    let err = ace::read_chart(data).unwrap_err();
    match err.kind() {
        ErrorKind::VersionMismatch { found } => assert_eq!(found.as_deref(), Some("bogus")),
        x => panic!("unexpected error: {:?}", x),
    }

    let mut envelope = Envelope::default();
    let err = importer::import_into(data, &mut envelope, schemas::envelope()).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::VersionMismatch { .. }));
    assert_eq!(envelope.version, None);
    assert!(envelope.chart.antigens.is_empty());
    assert!(envelope.chart.sera.is_empty());
}

#[test]
fn decode_chart_before_version() {
    let data = br#"{"_":"","c":{"a":[{"N":"A/X/1/2020"}]},"  version":"acmacs-ace-v1"}"#;
    let err = ace::read_chart(data).unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::VersionMismatch { found: None }
    ));
}

#[test]
fn decode_single_antigen_defaults() {
    let data = br#"{"_":"","  version":"acmacs-ace-v1","c":{"a":[{"N":"A/X/1/2020"}]}}"#;
    let chart = ace::read_chart(data).unwrap();
    assert_eq!(chart.antigens, vec![Antigen::new("A/X/1/2020")]);
    assert_eq!(chart.number_of_sera(), 0);
    assert_eq!(chart.number_of_points(), 1);
}

#[test]
fn decode_wrong_value_kind() {
    let data = br#"{"  version":"acmacs-ace-v1","c":{"a":[{"N":"A/X/1/2020"},{"N":[]}]}}"#;
    let err = ace::read_chart(data).unwrap_err();
    match err.kind() {
        ErrorKind::ValueKind {
            path,
            expected,
            found,
            ..
        } => {
            assert_eq!(path, "c.a[1].N");
            assert_eq!(*expected, ScalarKind::Text);
            assert_eq!(*found, "StartArray");
        }
        x => panic!("unexpected error: {:?}", x),
    }
}

#[test]
fn decode_unknown_key() {
    let data = br#"{"  version":"acmacs-ace-v1","c":{"P":[{"s":1.0,"zz":2}]}}"#;
    let err = ace::read_chart(data).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::Structural { .. }));
    assert_eq!(err.path(), Some("c.P[0]"));
    assert!(err.to_string().contains("zz"));
}

#[test]
fn decode_invalid_titer() {
    let data = br#"{"  version":"acmacs-ace-v1","c":{"t":{"l":[["40","<"]]}}}"#;
    let err = ace::read_chart(data).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::InvalidValue { .. }));
    assert_eq!(err.path(), Some("c.t.l[0]"));
}

#[test]
fn decode_transformation_arity() {
    let data = br#"{"  version":"acmacs-ace-v1","c":{"P":[{"t":[1,0,0]}]}}"#;
    let err = ace::read_chart(data).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::InvalidValue { .. }));
}

#[test]
fn decode_not_an_object() {
    let inputs: [&[u8]; 4] = [b"[1, 2]", b"", b"  \n  ", b"acmacs"];
    for data in inputs {
        let err = ace::read_chart(data).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::UnrecognizedFormat));
    }
}

#[test]
fn decode_syntax_error() {
    let data = br#"{"  version":"acmacs-ace-v1","c":{"a":[{"N":"A"}}}"#;
    let err = ace::read_chart(data).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::Syntax(_)));
    assert!(err.offset().is_some());
}

#[test]
fn decode_depth_limit() {
    let data = br#"{"  version":"acmacs-ace-v1","c":{"p":{"x":[[[[[[1]]]]]]}}}"#;
    ace::read_chart(data).unwrap();

    let options = DecodeOptions::new().with_max_depth(2);
    let err = ace::read_chart_with(data, &options).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::Structural { .. }));
}

#[test]
fn decode_inconsistent_layout() {
    let data = br#"{"  version":"acmacs-ace-v1","c":{"a":[{"N":"A"}],"P":[{"l":[[1,2],[3,4]]}]}}"#;
    let err = ace::read_chart(data).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::Inconsistent(_)));

    let options = DecodeOptions::new().with_consistency_check(false);
    let chart = ace::read_chart_with(data, &options).unwrap();
    assert_eq!(chart.projections[0].layout.number_of_points(), 2);
}

#[test]
fn annotations_last_writer_wins() {
    let mut antigen = Antigen::default();
    importer::import_into(br#"{"a": ["DISTINCT", "X"]}"#, &mut antigen, schemas::antigen())
        .unwrap();
    assert_eq!(antigen.annotations, Annotations::from(vec!["DISTINCT", "X"]));

    importer::import_into(br#"{"a": ["Y"]}"#, &mut antigen, schemas::antigen()).unwrap();
    assert_eq!(antigen.annotations.as_slice(), &[String::from("Y")]);

    let antigen = importer::import(br#"{"a": ["DISTINCT", "X"], "a": ["Y"]}"#, schemas::antigen())
        .unwrap();
    assert_eq!(antigen.annotations.as_slice(), &[String::from("Y")]);
}

#[test]
fn annotations_multiset_equality() {
    let first = Annotations::from(vec!["X", "DISTINCT"]);
    let second = Annotations::from(vec!["DISTINCT", "X"]);
    assert_eq!(first, second);
    assert_eq!(first.as_slice()[0], "X");

    assert_ne!(Annotations::from(vec!["X"]), Annotations::from(vec!["X", "X"]));
    assert_ne!(
        Annotations::from(vec!["X", "X", "Y"]),
        Annotations::from(vec!["X", "Y", "Y"])
    );
}

#[test]
fn points_are_antigens_and_sera() {
    let data = br#"{"  version":"acmacs-ace-v1","c":{"a":[{"N":"A"},{"N":"B"}],"s":[{"N":"C"}]}}"#;
    let chart = ace::read_chart(data).unwrap();
    assert_eq!(
        chart.number_of_points(),
        chart.number_of_antigens() + chart.number_of_sera()
    );
}
