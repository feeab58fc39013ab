//! Inline-function builders.
//!
//! An inline function is a pseudo-call in value position whose quoted payload
//! is turned into a typed BSON value:
//!
//! ```text
//! WHERE created_at >= date('2020-12-12')       -> DateTime
//! WHERE _id = ObjectId('5d3937af498831003e9f6f2a') -> ObjectId
//! ```
//!
//! Builders are looked up by exact name in an [`InlineFunctionRegistry`]
//! owned by the translator. `date`, `ObjectId` and `Id` are registered by
//! default and can be overridden or removed.

use std::{collections::HashMap, fmt, sync::Arc};

use bson::{Bson, DateTime, oid::ObjectId};
use time::{
    Date, OffsetDateTime, PrimitiveDateTime, format_description::FormatItem,
    format_description::well_known::Rfc3339, macros::format_description,
};
use tracing::debug;

use crate::error::{Error, Result};

/// Error a builder reports for a payload it cannot convert.
pub type BuilderError = Box<dyn std::error::Error + Send + Sync>;

/// Converts the payload of an inline function into a BSON value.
pub type InlineFunctionBuilder =
    Arc<dyn Fn(&str) -> std::result::Result<Bson, BuilderError> + Send + Sync>;

const DATE_ONLY_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");
const DATE_TIME_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
const DATE_T_TIME_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
const COMPACT_OFFSET_FORMAT: &[FormatItem<'static>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second][offset_hour sign:mandatory][offset_minute]"
);
const COMPACT_OFFSET_FRACTION_FORMAT: &[FormatItem<'static>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond][offset_hour sign:mandatory][offset_minute]"
);

/// Name → builder lookup table used while converting filter values.
#[derive(Clone)]
pub struct InlineFunctionRegistry {
    builders: HashMap<String, InlineFunctionBuilder>,
}

impl InlineFunctionRegistry {
    /// Registry without any builder.
    pub fn empty() -> Self {
        InlineFunctionRegistry {
            builders: HashMap::new(),
        }
    }

    /// Registry holding the `date`, `ObjectId` and `Id` builders.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register("date", build_date);
        registry.register("ObjectId", build_object_id);
        registry.register("Id", build_object_id);
        registry
    }

    /// Registers `builder` under `name`, replacing any builder already
    /// registered under that name.
    pub fn register<F>(&mut self, name: impl Into<String>, builder: F)
    where
        F: Fn(&str) -> std::result::Result<Bson, BuilderError> + Send + Sync + 'static,
    {
        let name = name.into();
        debug!(function = %name, "registering inline function builder");
        self.builders.insert(name, Arc::new(builder));
    }

    /// Removes the builder registered under `name`. Returns whether one was
    /// registered.
    pub fn remove(&mut self, name: &str) -> bool {
        let removed = self.builders.remove(name).is_some();
        debug!(function = %name, removed, "removing inline function builder");
        removed
    }

    pub fn get(&self, name: &str) -> Option<&InlineFunctionBuilder> {
        self.builders.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.builders.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.builders.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Runs the builder registered under `name`.
    ///
    /// Returns `Ok(None)` when no builder has that name.
    pub fn build(&self, name: &str, payload: &str) -> Result<Option<Bson>> {
        let Some(builder) = self.get(name) else {
            return Ok(None);
        };

        builder(payload)
            .map(Some)
            .map_err(|source| Error::InlineFunction {
                name: name.to_string(),
                payload: payload.to_string(),
                source,
            })
    }
}

impl Default for InlineFunctionRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for InlineFunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InlineFunctionRegistry")
            .field("builders", &self.names())
            .finish()
    }
}

/// `date(payload)`: a UTC instant as BSON `DateTime`.
///
/// Accepts RFC 3339, ISO 8601 with a `+HHMM` offset, `YYYY-MM-DD HH:MM:SS`,
/// `YYYY-MM-DDTHH:MM:SS` (read as UTC) and `YYYY-MM-DD` (midnight UTC).
pub fn build_date(payload: &str) -> std::result::Result<Bson, BuilderError> {
    let payload = payload.trim();
    let instant =
        parse_instant(payload).ok_or_else(|| format!("unrecognized date '{}'", payload))?;
    let millis = instant.unix_timestamp_nanos() / 1_000_000;
    let millis = i64::try_from(millis).map_err(|_| format!("date '{}' is out of range", payload))?;
    Ok(Bson::DateTime(DateTime::from_millis(millis)))
}

fn parse_instant(payload: &str) -> Option<OffsetDateTime> {
    if let Ok(instant) = OffsetDateTime::parse(payload, &Rfc3339) {
        return Some(instant);
    }

    for format in [COMPACT_OFFSET_FORMAT, COMPACT_OFFSET_FRACTION_FORMAT] {
        if let Ok(instant) = OffsetDateTime::parse(payload, format) {
            return Some(instant);
        }
    }

    for format in [DATE_TIME_FORMAT, DATE_T_TIME_FORMAT] {
        if let Ok(local) = PrimitiveDateTime::parse(payload, format) {
            return Some(local.assume_utc());
        }
    }

    Date::parse(payload, DATE_ONLY_FORMAT)
        .ok()
        .map(|date| date.midnight().assume_utc())
}

/// `ObjectId(hex)` / `Id(hex)`.
pub fn build_object_id(payload: &str) -> std::result::Result<Bson, BuilderError> {
    let oid = ObjectId::parse_str(payload.trim())?;
    Ok(Bson::ObjectId(oid))
}
