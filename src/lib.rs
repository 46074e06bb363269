/*!

A streaming decoder and encoder for antigenic cartography charts stored in the
ACE format, a compact JSON layout produced by the acmacs tool chain.

Decoding never builds an intermediate JSON tree. Tokens flow from a zero copy
tokenizer into a stack of frames, and each frame consults a schema binding
the single letter keys of the format to setters on the chart model.

## Features

- ✔ Streaming: a chart is built token by token, no generic tree in between
- ✔ Strict: wrong value kinds and unknown keys are reported with the field path
- ✔ Compressed: xz and gzip charts are detected and inflated transparently
- ✔ Reusable: the frame engine in [`importer`] decodes any `Default` type

## Quick Start

```rust
use acechart::{ace, AntigenSerum};

let data = br#"{
    "_": "-*- js-indent-level: 1 -*-",
    "  version": "acmacs-ace-v1",
    "c": {
        "a": [{"N": "A/SINGAPORE/INFIMH-16-0019/2016", "P": "E5", "S": "R"}],
        "s": [{"N": "A/SINGAPORE/INFIMH-16-0019/2016", "I": "F3"}],
        "t": {"l": [["1280"]]},
        "P": [{"s": 0.42, "l": [[1.0, 0.5], [-0.3, 2.0]]}]
    }
}"#;

let chart = ace::read_chart(data)?;
assert_eq!(chart.number_of_points(), 2);
assert!(chart.antigens[0].is_egg());
assert_eq!(chart.titer(0, 0).to_string(), "1280");
assert_eq!(chart.projections[0].layout.number_of_dimensions(), 2);
# Ok::<(), acechart::Error>(())
```

## Errors

Every failure aborts the decode. Errors point at the offending field:

```rust
use acechart::{ace, ErrorKind};

let data = br#"{"  version": "acmacs-ace-v1", "c": {"a": [{"N": []}]}}"#;
let err = ace::read_chart(data).unwrap_err();
assert!(matches!(err.kind(), ErrorKind::ValueKind { .. }));
assert_eq!(err.path(), Some("c.a[0].N"));
```

## One Level Lower

The tokenizer is available on its own:

```rust
use acechart::json::{JsonEvent, JsonParser};

let events: Result<Vec<_>, _> = JsonParser::new(br#"{"N": 1}"#).collect();
assert_eq!(
    events.unwrap(),
    vec![
        JsonEvent::StartObject,
        JsonEvent::Key("N".into()),
        JsonEvent::Uint(1),
        JsonEvent::EndObject,
    ]
);
```

*/

pub mod ace;
mod chart;
mod errors;
pub mod importer;
pub mod json;

pub use self::ace::{import_chart, read_chart};
pub use self::chart::*;
pub use self::errors::*;
