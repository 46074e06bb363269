use crate::importer::{Sequence, SetError};

/// Free text tags attached to an antigen or serum (eg: `DISTINCT`).
///
/// Equality ignores order but not multiplicity:
///
/// ```
/// use acechart::Annotations;
///
/// let a = Annotations::from(vec!["X", "DISTINCT"]);
/// assert_eq!(a, Annotations::from(vec!["DISTINCT", "X"]));
/// assert_ne!(Annotations::from(vec!["X"]), Annotations::from(vec!["X", "X"]));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Annotations(Vec<String>);

impl Annotations {
    pub fn new() -> Self {
        Annotations::default()
    }

    pub fn has(&self, annotation: &str) -> bool {
        self.0.iter().any(|x| x == annotation)
    }

    pub fn distinct(&self) -> bool {
        self.has("DISTINCT")
    }

    pub fn push(&mut self, annotation: impl Into<String>) {
        self.0.push(annotation.into());
    }

    pub fn join(&self, separator: &str) -> String {
        self.0.join(separator)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn sorted(&self) -> Vec<&str> {
        let mut result: Vec<&str> = self.0.iter().map(|x| x.as_str()).collect();
        result.sort_unstable();
        result
    }
}

impl PartialEq for Annotations {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.sorted() == other.sorted()
    }
}

impl Eq for Annotations {}

impl<S: Into<String>> From<Vec<S>> for Annotations {
    fn from(values: Vec<S>) -> Self {
        Annotations(values.into_iter().map(Into::into).collect())
    }
}

impl<'a> IntoIterator for &'a Annotations {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Sequence for Annotations {
    type Item = String;

    fn replace(&mut self, items: Vec<String>) -> Result<(), SetError> {
        self.0 = items;
        Ok(())
    }
}

/// Indices of the antigens a serum is homologous to. An index is kept once,
/// at its first position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HomologousAntigens(Vec<usize>);

impl HomologousAntigens {
    pub fn new() -> Self {
        HomologousAntigens::default()
    }

    /// Adds the index unless already present, returns if it was added
    pub fn push(&mut self, antigen: usize) -> bool {
        if self.contains(antigen) {
            false
        } else {
            self.0.push(antigen);
            true
        }
    }

    pub fn contains(&self, antigen: usize) -> bool {
        self.0.contains(&antigen)
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<usize>> for HomologousAntigens {
    fn from(values: Vec<usize>) -> Self {
        let mut result = HomologousAntigens::new();
        for x in values {
            result.push(x);
        }
        result
    }
}

impl Sequence for HomologousAntigens {
    type Item = usize;

    fn replace(&mut self, items: Vec<usize>) -> Result<(), SetError> {
        *self = HomologousAntigens::from(items);
        Ok(())
    }
}

/// Queries shared by antigens and sera
pub trait AntigenSerum {
    fn name(&self) -> &str;
    fn lineage(&self) -> &str;
    fn passage(&self) -> &str;
    fn reassortant(&self) -> &str;
    fn annotations(&self) -> &Annotations;

    /// Single letter flags: `R` reference, `V` current vaccine, `v` previous
    /// vaccine, `S` vaccine surrogate
    fn semantic(&self) -> &str;

    /// Name, reassortant and annotations joined with spaces
    fn full_name_without_passage(&self) -> String {
        let annotations = self.annotations().join(" ");
        join_non_empty(&[self.name(), self.reassortant(), &annotations])
    }

    fn full_name(&self) -> String;

    fn is_reassortant(&self) -> bool {
        !self.reassortant().is_empty()
    }

    fn is_egg(&self) -> bool {
        self.is_reassortant() || is_egg_passage(self.passage())
    }

    fn passage_type(&self) -> &'static str {
        if self.is_egg() {
            "egg"
        } else {
            "cell"
        }
    }

    fn distinct(&self) -> bool {
        self.annotations().distinct()
    }

    fn has_semantic(&self, flag: char) -> bool {
        self.semantic().contains(flag)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Antigen {
    pub name: String,
    pub date: String,
    pub lineage: String,
    pub passage: String,
    pub reassortant: String,
    pub lab_ids: Vec<String>,
    pub semantic: String,
    pub annotations: Annotations,
    pub clades: Vec<String>,
}

impl Antigen {
    pub fn new(name: impl Into<String>) -> Self {
        Antigen {
            name: name.into(),
            ..Antigen::default()
        }
    }

    pub fn reference(&self) -> bool {
        self.has_semantic('R')
    }

    pub fn has_lab_id(&self, lab_id: &str) -> bool {
        self.lab_ids.iter().any(|x| x == lab_id)
    }
}

impl AntigenSerum for Antigen {
    fn name(&self) -> &str {
        &self.name
    }

    fn lineage(&self) -> &str {
        &self.lineage
    }

    fn passage(&self) -> &str {
        &self.passage
    }

    fn reassortant(&self) -> &str {
        &self.reassortant
    }

    fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    fn semantic(&self) -> &str {
        &self.semantic
    }

    fn full_name(&self) -> String {
        join_non_empty(&[&self.full_name_without_passage(), &self.passage])
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Serum {
    pub name: String,
    pub lineage: String,
    pub passage: String,
    pub reassortant: String,
    pub serum_id: String,
    pub serum_species: String,
    pub semantic: String,
    pub homologous: HomologousAntigens,
    pub annotations: Annotations,
}

impl Serum {
    pub fn new(name: impl Into<String>) -> Self {
        Serum {
            name: name.into(),
            ..Serum::default()
        }
    }
}

impl AntigenSerum for Serum {
    fn name(&self) -> &str {
        &self.name
    }

    fn lineage(&self) -> &str {
        &self.lineage
    }

    fn passage(&self) -> &str {
        &self.passage
    }

    fn reassortant(&self) -> &str {
        &self.reassortant
    }

    fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    fn semantic(&self) -> &str {
        &self.semantic
    }

    fn full_name(&self) -> String {
        join_non_empty(&[&self.full_name_without_passage(), &self.serum_id])
    }
}

fn join_non_empty(parts: &[&str]) -> String {
    let mut result = String::new();
    for part in parts.iter().filter(|x| !x.is_empty()) {
        if !result.is_empty() {
            result.push(' ');
        }
        result.push_str(part);
    }
    result
}

/// Egg passages are written as `E<n>`, `E?` or contain `EGG`
fn is_egg_passage(passage: &str) -> bool {
    let data = passage.as_bytes();
    data.windows(2)
        .any(|x| x[0] == b'E' && (x[1].is_ascii_digit() || x[1] == b'?'))
        || passage.contains("EGG")
}
