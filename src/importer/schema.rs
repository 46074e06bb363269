use super::frame::{downcast, ArrayFrame, Frame, FrameError, ObjectFrame, RowsFrame, Storer, ValuesFrame};
use super::passthrough::PassthroughFrame;
use super::scalar::{ScalarKind, ScalarValue, Sequence, SetError};
use std::fmt;

/// Hands out the frame for one field of `T` and applies the finished frame
/// back onto `T`
pub trait Descriptor<T>: Send + Sync {
    /// Summary of what the field accepts
    fn describe(&self) -> FieldKind;

    fn open(&self, target: &mut T) -> Box<dyn Frame>;

    fn close(&self, target: &mut T, child: Box<dyn Frame>) -> Result<(), FrameError>;
}

/// The shape of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Scalar(ScalarKind),
    Object,
    ObjectArray,
    ScalarArray(ScalarKind),
    ArrayOfArrays(ScalarKind),
    Custom,
    Passthrough,
}

/// A frame that decodes a value the generic descriptors can't express
pub trait CustomFrame: Frame + Sized + 'static {
    type Target: Default + 'static;

    /// Creates the frame, handing it the field's previous value
    fn open(target: Self::Target) -> Self;

    fn close(self) -> Self::Target;
}

/// Binds one object key to a descriptor
pub struct Field<T: 'static> {
    key: &'static str,
    descriptor: Box<dyn Descriptor<T>>,
    requires: Option<fn(&T) -> Result<(), SetError>>,
}

impl<T: 'static> Field<T> {
    pub fn new<D>(key: &'static str, descriptor: D) -> Self
    where
        D: Descriptor<T> + 'static,
    {
        Field {
            key,
            descriptor: Box::new(descriptor),
            requires: None,
        }
    }

    /// A scalar field applied with an infallible setter
    pub fn setter<V: ScalarValue>(key: &'static str, set: fn(&mut T, V)) -> Self {
        Field::new(key, Setter(SetFn::Plain(set)))
    }

    /// A scalar field applied with a setter that may refuse the value
    pub fn try_setter<V: ScalarValue>(
        key: &'static str,
        set: fn(&mut T, V) -> Result<(), SetError>,
    ) -> Self {
        Field::new(key, Setter(SetFn::Fallible(set)))
    }

    /// A nested object decoded through its own schema
    pub fn object<U: Default + 'static>(
        key: &'static str,
        access: fn(&mut T) -> &mut U,
        schema: fn() -> &'static Schema<U>,
    ) -> Self {
        Field::new(key, Nested { access, schema })
    }

    /// An array of objects, each decoded through the element schema
    pub fn array_of_objects<U: Default + 'static>(
        key: &'static str,
        access: fn(&mut T) -> &mut Vec<U>,
        schema: fn() -> &'static Schema<U>,
    ) -> Self {
        Field::new(key, ObjectArray { access, schema })
    }

    /// An array of scalars
    pub fn array<S: Sequence>(key: &'static str, access: fn(&mut T) -> &mut S) -> Self {
        Field::new(key, ScalarArray { access })
    }

    /// An array of scalar arrays
    pub fn array_of_arrays<V: ScalarValue>(
        key: &'static str,
        access: fn(&mut T) -> &mut Vec<Vec<V>>,
    ) -> Self {
        Field::new(key, Rows { access })
    }

    /// A field decoded by a hand written frame
    pub fn custom<F: CustomFrame>(key: &'static str, access: fn(&mut T) -> &mut F::Target) -> Self {
        Field::new(key, Custom::<T, F> { access })
    }

    /// Any JSON value, captured as is
    pub fn passthrough<U>(key: &'static str, access: fn(&mut T) -> &mut U) -> Self
    where
        U: From<serde_json::Value> + 'static,
    {
        Field::new(key, Passthrough { access })
    }

    /// A check that must pass before the field is decoded
    pub fn requires(mut self, check: fn(&T) -> Result<(), SetError>) -> Self {
        self.requires = Some(check);
        self
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    pub fn kind(&self) -> FieldKind {
        self.descriptor.describe()
    }

    pub(crate) fn check(&self, target: &T) -> Result<(), SetError> {
        match self.requires {
            Some(check) => check(target),
            None => Ok(()),
        }
    }

    pub(crate) fn open(&self, target: &mut T) -> Box<dyn Frame> {
        self.descriptor.open(target)
    }

    pub(crate) fn close(&self, target: &mut T, child: Box<dyn Frame>) -> Result<(), FrameError> {
        self.descriptor.close(target, child)
    }
}

impl<T: 'static> fmt::Debug for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Field")
            .field("key", &self.key)
            .field("kind", &self.kind())
            .field("requires", &self.requires.is_some())
            .finish()
    }
}

/// Table of the fields of `T`, keyed by their JSON keys.
///
/// Schemas are meant to be built once and kept in a static:
///
/// ```
/// use acechart::importer::{import, Field, Schema};
/// use once_cell::sync::Lazy;
///
/// #[derive(Debug, Default)]
/// struct Point {
///     name: String,
///     coordinates: Vec<f64>,
/// }
///
/// static POINT: Lazy<Schema<Point>> = Lazy::new(|| {
///     Schema::new("Point")
///         .field(Field::setter("N", |x: &mut Point, v: String| x.name = v))
///         .field(Field::array("c", |x: &mut Point| &mut x.coordinates))
/// });
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let point = import(br#"{"N": "A/X/1/2020", "c": [1, -0.5]}"#, &POINT)?;
/// assert_eq!(point.name, "A/X/1/2020");
/// assert_eq!(point.coordinates, vec![1.0, -0.5]);
/// # Ok(())
/// # }
/// ```
pub struct Schema<T: 'static> {
    name: &'static str,
    fields: Vec<Field<T>>,
}

impl<T: 'static> Schema<T> {
    pub fn new(name: &'static str) -> Self {
        Schema {
            name,
            fields: Vec::new(),
        }
    }

    /// Adds a field. A key that is already present is replaced.
    pub fn field(mut self, field: Field<T>) -> Self {
        match self.fields.iter().position(|x| x.key == field.key) {
            Some(i) => self.fields[i] = field,
            None => self.fields.push(field),
        }
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|x| x.key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Looks up the field bound to a key
    pub fn find(&self, key: &str) -> Option<(usize, &Field<T>)> {
        self.fields.iter().enumerate().find(|(_, x)| x.key == key)
    }

    pub(crate) fn field_at(&self, index: usize) -> Option<&Field<T>> {
        self.fields.get(index)
    }
}

impl<T: 'static> fmt::Debug for Schema<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .finish()
    }
}

enum SetFn<T, V> {
    Plain(fn(&mut T, V)),
    Fallible(fn(&mut T, V) -> Result<(), SetError>),
}

struct Setter<T, V>(SetFn<T, V>);

impl<T, V: ScalarValue> Descriptor<T> for Setter<T, V> {
    fn describe(&self) -> FieldKind {
        FieldKind::Scalar(V::KIND)
    }

    fn open(&self, _target: &mut T) -> Box<dyn Frame> {
        Box::new(Storer::<V>::new())
    }

    fn close(&self, target: &mut T, child: Box<dyn Frame>) -> Result<(), FrameError> {
        let value = downcast::<Storer<V>>(child)?
            .into_value()
            .ok_or(FrameError::Unexpected)?;
        match self.0 {
            SetFn::Plain(set) => {
                set(target, value);
                Ok(())
            }
            SetFn::Fallible(set) => set(target, value).map_err(FrameError::from),
        }
    }
}

struct Nested<T, U: 'static> {
    access: fn(&mut T) -> &mut U,
    schema: fn() -> &'static Schema<U>,
}

impl<T, U: Default + 'static> Descriptor<T> for Nested<T, U> {
    fn describe(&self) -> FieldKind {
        FieldKind::Object
    }

    fn open(&self, target: &mut T) -> Box<dyn Frame> {
        let value = std::mem::take((self.access)(target));
        Box::new(ObjectFrame::new(value, (self.schema)()))
    }

    fn close(&self, target: &mut T, child: Box<dyn Frame>) -> Result<(), FrameError> {
        let child = downcast::<ObjectFrame<U>>(child)?;
        *(self.access)(target) = child.into_target();
        Ok(())
    }
}

struct ObjectArray<T, U: 'static> {
    access: fn(&mut T) -> &mut Vec<U>,
    schema: fn() -> &'static Schema<U>,
}

impl<T, U: Default + 'static> Descriptor<T> for ObjectArray<T, U> {
    fn describe(&self) -> FieldKind {
        FieldKind::ObjectArray
    }

    fn open(&self, target: &mut T) -> Box<dyn Frame> {
        let items = std::mem::take((self.access)(target));
        Box::new(ArrayFrame::new(items, (self.schema)()))
    }

    fn close(&self, target: &mut T, child: Box<dyn Frame>) -> Result<(), FrameError> {
        let child = downcast::<ArrayFrame<U>>(child)?;
        *(self.access)(target) = child.into_items();
        Ok(())
    }
}

struct ScalarArray<T, S> {
    access: fn(&mut T) -> &mut S,
}

impl<T, S: Sequence> Descriptor<T> for ScalarArray<T, S> {
    fn describe(&self) -> FieldKind {
        FieldKind::ScalarArray(S::Item::KIND)
    }

    fn open(&self, _target: &mut T) -> Box<dyn Frame> {
        Box::new(ValuesFrame::<S::Item>::new())
    }

    fn close(&self, target: &mut T, child: Box<dyn Frame>) -> Result<(), FrameError> {
        let items = downcast::<ValuesFrame<S::Item>>(child)?.into_items();
        (self.access)(target).replace(items)?;
        Ok(())
    }
}

struct Rows<T, V> {
    access: fn(&mut T) -> &mut Vec<Vec<V>>,
}

impl<T, V: ScalarValue> Descriptor<T> for Rows<T, V> {
    fn describe(&self) -> FieldKind {
        FieldKind::ArrayOfArrays(V::KIND)
    }

    fn open(&self, target: &mut T) -> Box<dyn Frame> {
        let rows = std::mem::take((self.access)(target));
        Box::new(RowsFrame::new(rows))
    }

    fn close(&self, target: &mut T, child: Box<dyn Frame>) -> Result<(), FrameError> {
        *(self.access)(target) = downcast::<RowsFrame<V>>(child)?.into_rows();
        Ok(())
    }
}

struct Custom<T, F: CustomFrame> {
    access: fn(&mut T) -> &mut F::Target,
}

impl<T, F: CustomFrame> Descriptor<T> for Custom<T, F> {
    fn describe(&self) -> FieldKind {
        FieldKind::Custom
    }

    fn open(&self, target: &mut T) -> Box<dyn Frame> {
        let value = std::mem::take((self.access)(target));
        Box::new(F::open(value))
    }

    fn close(&self, target: &mut T, child: Box<dyn Frame>) -> Result<(), FrameError> {
        *(self.access)(target) = downcast::<F>(child)?.close();
        Ok(())
    }
}

struct Passthrough<T, U> {
    access: fn(&mut T) -> &mut U,
}

impl<T, U: From<serde_json::Value> + 'static> Descriptor<T> for Passthrough<T, U> {
    fn describe(&self) -> FieldKind {
        FieldKind::Passthrough
    }

    fn open(&self, _target: &mut T) -> Box<dyn Frame> {
        Box::new(PassthroughFrame::new())
    }

    fn close(&self, target: &mut T, child: Box<dyn Frame>) -> Result<(), FrameError> {
        let value = downcast::<PassthroughFrame>(child)?
            .into_value()
            .ok_or(FrameError::Unexpected)?;
        *(self.access)(target) = U::from(value);
        Ok(())
    }
}
