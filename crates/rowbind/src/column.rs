//! Scalar field types.

use crate::entity::ScalarKind;
use crate::error::OrmResult;
use crate::materialize::decode;
use crate::value::Value;

/// A Rust type stored in a single column.
///
/// `#[derive(Record)]` requires every non-relation field to implement this trait; the
/// associated [`ScalarKind`] selects the decoding rule applied to raw column bytes.
pub trait Column: Sized {
    const KIND: ScalarKind;

    fn to_value(&self) -> Value;

    fn decode(raw: Option<&[u8]>, field: &str) -> OrmResult<Self>;
}

impl Column for String {
    const KIND: ScalarKind = ScalarKind::Text;

    /// Empty strings are written as NULL so that empty string keys fall back to the
    /// column default.
    fn to_value(&self) -> Value {
        if self.is_empty() {
            Value::Null
        } else {
            Value::Text(self.clone())
        }
    }

    fn decode(raw: Option<&[u8]>, field: &str) -> OrmResult<Self> {
        decode::text(raw, field)
    }
}

impl Column for Vec<u8> {
    const KIND: ScalarKind = ScalarKind::Bytes;

    fn to_value(&self) -> Value {
        Value::Bytes(self.clone())
    }

    fn decode(raw: Option<&[u8]>, _field: &str) -> OrmResult<Self> {
        Ok(decode::bytes(raw))
    }
}

impl Column for bool {
    const KIND: ScalarKind = ScalarKind::Bool;

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn decode(raw: Option<&[u8]>, _field: &str) -> OrmResult<Self> {
        Ok(decode::boolean(raw))
    }
}

macro_rules! impl_int_column {
    ($($t:ty),*) => {
        $(
            impl Column for $t {
                const KIND: ScalarKind = ScalarKind::Int;

                fn to_value(&self) -> Value {
                    Value::from(*self)
                }

                fn decode(raw: Option<&[u8]>, field: &str) -> OrmResult<Self> {
                    decode::integer(raw, field)
                }
            }
        )*
    };
}

impl_int_column!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

macro_rules! impl_float_column {
    ($($t:ty),*) => {
        $(
            impl Column for $t {
                const KIND: ScalarKind = ScalarKind::Float;

                fn to_value(&self) -> Value {
                    Value::from(*self)
                }

                fn decode(raw: Option<&[u8]>, field: &str) -> OrmResult<Self> {
                    decode::float(raw, field)
                }
            }
        )*
    };
}

impl_float_column!(f32, f64);

impl<T: Column> Column for Option<T> {
    const KIND: ScalarKind = T::KIND;

    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }

    fn decode(raw: Option<&[u8]>, field: &str) -> OrmResult<Self> {
        match raw {
            None => Ok(None),
            Some(_) => T::decode(raw, field).map(Some),
        }
    }
}
