//! [`Connection`] for `tokio-postgres` clients.
//!
//! Statements are written with `?` markers; they are rewritten to `$1..$n` here. Arguments are
//! encoded against the parameter types the server inferred, and every result column is read
//! back as text so the materializer sees the same raw form for every column type.

use crate::client::{Connection, ExecResult, RawRow};
use crate::error::OrmResult;
use crate::value::Value;
use bytes::{Bytes, BytesMut};
use std::error::Error;
use tokio_postgres::types::{FromSql, IsNull, Kind, ToSql, Type, to_sql_checked};

type BoxError = Box<dyn Error + Sync + Send>;

/// Rewrite `?` markers outside quoted text to numbered `$n` placeholders.
///
/// Only single- and double-quoted text is skipped. A `?` inside a comment or a dollar-quoted
/// body is still rewritten, and so are the jsonb operators `?`, `?|` and `?&`; statements
/// that need them must go through the driver directly.
pub fn numbered_placeholders(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut quote: Option<char> = None;
    let mut n = 0usize;

    for c in sql.chars() {
        match quote {
            Some(q) => {
                // A doubled quote closes and reopens; the state is the same either way.
                if c == q {
                    quote = None;
                }
                out.push(c);
            }
            None => match c {
                '\'' | '"' => {
                    quote = Some(c);
                    out.push(c);
                }
                '?' => {
                    n += 1;
                    out.push('$');
                    out.push_str(&n.to_string());
                }
                _ => out.push(c),
            },
        }
    }
    out
}

/// A [`Value`] encoded for whatever type the server expects at its position.
#[derive(Debug)]
struct Param<'a>(&'a Value);

impl ToSql for Param<'_> {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        match self.0 {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(b) => match *ty {
                Type::BOOL => b.to_sql(ty, out),
                Type::INT2 | Type::INT4 | Type::INT8 => encode_int(i64::from(*b), ty, out),
                _ => encode_text(if *b { "1" } else { "0" }, ty, out),
            },
            Value::Int(i) => encode_int(*i, ty, out),
            Value::Float(f) => match *ty {
                Type::FLOAT4 => (*f as f32).to_sql(ty, out),
                Type::FLOAT8 => f.to_sql(ty, out),
                #[cfg(feature = "rust_decimal")]
                Type::NUMERIC => rust_decimal::Decimal::try_from(*f)?.to_sql(ty, out),
                _ => encode_text(&f.to_string(), ty, out),
            },
            Value::Text(s) => encode_text(s, ty, out),
            Value::Bytes(b) => match *ty {
                Type::BYTEA => b.as_slice().to_sql(ty, out),
                _ => encode_text(std::str::from_utf8(b)?, ty, out),
            },
            Value::Json(v) => match *ty {
                Type::JSON | Type::JSONB => v.to_sql(ty, out),
                _ => encode_text(&v.to_string(), ty, out),
            },
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

fn encode_int(i: i64, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    match *ty {
        Type::INT2 => i16::try_from(i)?.to_sql(ty, out),
        Type::INT4 => i32::try_from(i)?.to_sql(ty, out),
        Type::INT8 => i.to_sql(ty, out),
        Type::OID => u32::try_from(i)?.to_sql(ty, out),
        Type::FLOAT4 => (i as f32).to_sql(ty, out),
        Type::FLOAT8 => (i as f64).to_sql(ty, out),
        Type::BOOL => (i != 0).to_sql(ty, out),
        #[cfg(feature = "rust_decimal")]
        Type::NUMERIC => rust_decimal::Decimal::from(i).to_sql(ty, out),
        _ => encode_text(&i.to_string(), ty, out),
    }
}

/// Parse textual input into the server type.
///
/// Types whose binary format is not plain text must be listed here; anything else is an error.
fn encode_text(s: &str, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    if let Kind::Domain(base) = ty.kind() {
        return encode_text(s, base, out);
    }
    match *ty {
        Type::BOOL => parse_bool(s)?.to_sql(ty, out),
        Type::INT2 | Type::INT4 | Type::INT8 | Type::OID => encode_int(s.trim().parse()?, ty, out),
        Type::FLOAT4 => s.trim().parse::<f32>()?.to_sql(ty, out),
        Type::FLOAT8 => s.trim().parse::<f64>()?.to_sql(ty, out),
        Type::JSON | Type::JSONB => serde_json::from_str::<serde_json::Value>(s)?.to_sql(ty, out),
        Type::UUID => uuid::Uuid::parse_str(s)?.to_sql(ty, out),
        Type::DATE => s.parse::<chrono::NaiveDate>()?.to_sql(ty, out),
        Type::TIME => s.parse::<chrono::NaiveTime>()?.to_sql(ty, out),
        Type::TIMESTAMP => parse_timestamp(s)?.to_sql(ty, out),
        Type::TIMESTAMPTZ => parse_timestamptz(s)?.to_sql(ty, out),
        Type::BYTEA => s.as_bytes().to_sql(ty, out),
        Type::NUMERIC => encode_numeric(s, ty, out),
        _ if is_textual(ty) => {
            out.extend_from_slice(s.as_bytes());
            Ok(IsNull::No)
        }
        _ => Err(format!("cannot encode a value as `{ty}`").into()),
    }
}

/// Types whose binary wire format is the UTF-8 text itself.
fn is_textual(ty: &Type) -> bool {
    matches!(
        *ty,
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN | Type::JSON
    ) || matches!(ty.kind(), Kind::Enum(_))
        || ty.name() == "citext"
}

#[cfg(feature = "rust_decimal")]
fn encode_numeric(s: &str, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    s.trim().parse::<rust_decimal::Decimal>()?.to_sql(ty, out)
}

#[cfg(not(feature = "rust_decimal"))]
fn encode_numeric(_s: &str, _ty: &Type, _out: &mut BytesMut) -> Result<IsNull, BoxError> {
    Err("numeric parameters need the `rust_decimal` feature".into())
}

#[cfg(feature = "rust_decimal")]
fn render_numeric(ty: &Type, raw: &[u8]) -> Result<Bytes, BoxError> {
    Ok(rust_decimal::Decimal::from_sql(ty, raw)?.to_string().into())
}

#[cfg(not(feature = "rust_decimal"))]
fn render_numeric(_ty: &Type, _raw: &[u8]) -> Result<Bytes, BoxError> {
    Err("numeric columns need the `rust_decimal` feature".into())
}

fn parse_bool(s: &str) -> Result<bool, BoxError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "t" | "true" | "y" | "yes" | "on" => Ok(true),
        "0" | "f" | "false" | "n" | "no" | "off" => Ok(false),
        other => Err(format!("invalid boolean literal `{other}`").into()),
    }
}

fn parse_timestamp(s: &str) -> Result<chrono::NaiveDateTime, BoxError> {
    let s = s.trim();
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| s.parse::<chrono::NaiveDateTime>())
        .map_err(Into::into)
}

fn parse_timestamptz(s: &str) -> Result<chrono::DateTime<chrono::Utc>, BoxError> {
    let s = s.trim();
    match chrono::DateTime::parse_from_rfc3339(s) {
        Ok(dt) => Ok(dt.with_timezone(&chrono::Utc)),
        Err(_) => Ok(parse_timestamp(s)?.and_utc()),
    }
}

/// A result column rendered to its textual raw form.
#[derive(Debug)]
struct RawText(Option<Bytes>);

impl<'a> FromSql<'a> for RawText {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, BoxError> {
        if let Kind::Domain(base) = ty.kind() {
            return RawText::from_sql(base, raw);
        }
        let text: Bytes = match *ty {
            Type::BOOL => Bytes::from_static(if bool::from_sql(ty, raw)? { b"1" } else { b"0" }),
            Type::CHAR => i8::from_sql(ty, raw)?.to_string().into(),
            Type::INT2 => i16::from_sql(ty, raw)?.to_string().into(),
            Type::INT4 => i32::from_sql(ty, raw)?.to_string().into(),
            Type::INT8 => i64::from_sql(ty, raw)?.to_string().into(),
            Type::OID => u32::from_sql(ty, raw)?.to_string().into(),
            Type::FLOAT4 => f32::from_sql(ty, raw)?.to_string().into(),
            Type::FLOAT8 => f64::from_sql(ty, raw)?.to_string().into(),
            Type::NUMERIC => render_numeric(ty, raw)?,
            // Binary jsonb carries a one-byte format version ahead of the text.
            Type::JSONB => Bytes::copy_from_slice(raw.get(1..).unwrap_or_default()),
            Type::UUID => uuid::Uuid::from_sql(ty, raw)?.to_string().into(),
            Type::DATE => chrono::NaiveDate::from_sql(ty, raw)?.to_string().into(),
            Type::TIME => chrono::NaiveTime::from_sql(ty, raw)?.to_string().into(),
            Type::TIMESTAMP => chrono::NaiveDateTime::from_sql(ty, raw)?
                .to_string()
                .into(),
            Type::TIMESTAMPTZ => chrono::DateTime::<chrono::Utc>::from_sql(ty, raw)?
                .to_rfc3339()
                .into(),
            Type::BYTEA => Bytes::copy_from_slice(raw),
            _ if is_textual(ty) => Bytes::copy_from_slice(raw),
            _ => return Err(format!("cannot read a `{ty}` column as text").into()),
        };
        Ok(RawText(Some(text)))
    }

    fn from_sql_null(_ty: &Type) -> Result<Self, BoxError> {
        Ok(RawText(None))
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}

fn raw_row(row: &tokio_postgres::Row) -> OrmResult<RawRow> {
    let mut values = Vec::with_capacity(row.len());
    for i in 0..row.len() {
        let RawText(value) = row.try_get(i)?;
        values.push(value);
    }
    Ok(RawRow::new(values))
}

impl Connection for tokio_postgres::Client {
    async fn execute(&self, sql: &str, args: &[Value]) -> OrmResult<ExecResult> {
        let sql = numbered_placeholders(sql);
        let params: Vec<Param<'_>> = args.iter().map(Param).collect();
        let refs: Vec<&(dyn ToSql + Sync)> =
            params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();

        let rows_affected = tokio_postgres::Client::execute(self, sql.as_str(), &refs).await?;
        Ok(ExecResult::new(rows_affected))
    }

    async fn query(&self, sql: &str, args: &[Value]) -> OrmResult<Vec<RawRow>> {
        let sql = numbered_placeholders(sql);
        let params: Vec<Param<'_>> = args.iter().map(Param).collect();
        let refs: Vec<&(dyn ToSql + Sync)> =
            params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();

        let rows = tokio_postgres::Client::query(self, sql.as_str(), &refs).await?;
        rows.iter().map(raw_row).collect()
    }

    async fn batch_execute(&self, sql: &str) -> OrmResult<()> {
        tokio_postgres::Client::batch_execute(self, sql).await?;
        Ok(())
    }
}

#[cfg(feature = "pool")]
impl Connection for deadpool_postgres::Client {
    async fn execute(&self, sql: &str, args: &[Value]) -> OrmResult<ExecResult> {
        let client: &tokio_postgres::Client = self;
        Connection::execute(client, sql, args).await
    }

    async fn query(&self, sql: &str, args: &[Value]) -> OrmResult<Vec<RawRow>> {
        let client: &tokio_postgres::Client = self;
        Connection::query(client, sql, args).await
    }

    async fn batch_execute(&self, sql: &str) -> OrmResult<()> {
        let client: &tokio_postgres::Client = self;
        Connection::batch_execute(client, sql).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_are_numbered_in_order() {
        assert_eq!(
            numbered_placeholders("SELECT * FROM t WHERE a = ? AND b > ? LIMIT 1"),
            "SELECT * FROM t WHERE a = $1 AND b > $2 LIMIT 1"
        );
        assert_eq!(
            numbered_placeholders("INSERT INTO t (a,b,c) VALUES (?,?,?)"),
            "INSERT INTO t (a,b,c) VALUES ($1,$2,$3)"
        );
    }

    #[test]
    fn quoted_markers_are_untouched() {
        assert_eq!(
            numbered_placeholders("SELECT '?', \"w?\" FROM t WHERE a = ? AND b = 'it''s ?'"),
            "SELECT '?', \"w?\" FROM t WHERE a = $1 AND b = 'it''s ?'"
        );
    }

    #[test]
    fn jsonb_operators_and_comments_are_not_skipped() {
        assert_eq!(
            numbered_placeholders("SELECT 1 -- why?\nWHERE doc ? 'k' AND a = ?"),
            "SELECT 1 -- why$1\nWHERE doc $2 'k' AND a = $3"
        );
    }

    #[test]
    fn text_params_follow_server_type() {
        let mut out = BytesMut::new();
        let value = Value::Text("42".into());
        Param(&value).to_sql(&Type::INT4, &mut out).unwrap();
        assert_eq!(&out[..], &42i32.to_be_bytes());

        out.clear();
        Param(&value).to_sql(&Type::TEXT, &mut out).unwrap();
        assert_eq!(&out[..], b"42");

        out.clear();
        let flag = Value::Text("1".into());
        Param(&flag).to_sql(&Type::BOOL, &mut out).unwrap();
        assert_eq!(&out[..], &[1u8]);
    }

    #[test]
    fn null_param_is_null() {
        let mut out = BytesMut::new();
        let is_null = Param(&Value::Null).to_sql(&Type::INT8, &mut out).unwrap();
        assert!(matches!(is_null, IsNull::Yes));
    }

    #[test]
    fn columns_render_as_text() {
        let b = RawText::from_sql(&Type::BOOL, &[1]).unwrap();
        assert_eq!(b.0.as_deref(), Some(&b"1"[..]));

        let n = RawText::from_sql(&Type::INT8, &7i64.to_be_bytes()).unwrap();
        assert_eq!(n.0.as_deref(), Some(&b"7"[..]));

        let j = RawText::from_sql(&Type::JSONB, b"\x01[1,2]").unwrap();
        assert_eq!(j.0.as_deref(), Some(&b"[1,2]"[..]));

        let null = RawText::from_sql_null(&Type::TEXT).unwrap();
        assert!(null.0.is_none());
    }

    #[test]
    fn unknown_binary_columns_are_rejected() {
        let err = RawText::from_sql(&Type::INET, &[2, 32, 0, 4, 127, 0, 0, 1]).unwrap_err();
        assert!(err.to_string().contains("inet"));

        let text = RawText::from_sql(&Type::VARCHAR, b"plain").unwrap();
        assert_eq!(text.0.as_deref(), Some(&b"plain"[..]));
    }

    #[test]
    fn unknown_binary_params_are_rejected() {
        let mut out = BytesMut::new();
        let value = Value::Text("127.0.0.1".into());
        assert!(Param(&value).to_sql(&Type::INET, &mut out).is_err());
    }

    #[cfg(feature = "rust_decimal")]
    mod numeric {
        use super::*;
        use rust_decimal::Decimal;
        use std::str::FromStr;

        fn encoded(value: &Value) -> BytesMut {
            let mut out = BytesMut::new();
            Param(value).to_sql(&Type::NUMERIC, &mut out).unwrap();
            out
        }

        fn wire(decimal: &str) -> BytesMut {
            let mut out = BytesMut::new();
            Decimal::from_str(decimal)
                .unwrap()
                .to_sql(&Type::NUMERIC, &mut out)
                .unwrap();
            out
        }

        #[test]
        fn numeric_columns_render_base_ten() {
            let raw = wire("12.5");
            let text = RawText::from_sql(&Type::NUMERIC, &raw).unwrap();
            let text = text.0.unwrap();
            assert_eq!(&text[..], b"12.5");
            assert_eq!(
                crate::materialize::decode::float::<f64>(Some(&text[..]), "price").unwrap(),
                12.5
            );
        }

        #[test]
        fn numeric_params_use_the_binary_format() {
            assert_eq!(encoded(&Value::Int(10)), wire("10"));
            assert_eq!(encoded(&Value::Text("3.25".into())), wire("3.25"));
            assert_eq!(encoded(&Value::Float(0.5)), wire("0.5"));
        }
    }
}
