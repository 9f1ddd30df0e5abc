//! Typed parameter metadata.
//!
//! Every node exposes its parameters through [`ParameterInfo`]: an index-based
//! table of [`ParamDescriptor`]s plus getters and setters. The same descriptors
//! serve two purposes:
//!
//! - **Validation**: control-path values are checked with
//!   [`ParamDescriptor::validate`] before anything reaches a live node
//! - **Introspection**: listing commands print name, unit, range and
//!   description straight from the table
//!
//! # Example
//!
//! ```rust
//! use audiokit_core::{ParamDescriptor, ParamUnit, ParamValue, ParameterInfo};
//!
//! struct Trim {
//!     gain_db: f32,
//! }
//!
//! const TRIM_PARAMS: [ParamDescriptor; 1] = [ParamDescriptor::float(
//!     "gain",
//!     "Gain",
//!     "Static gain applied to every channel",
//!     ParamUnit::Decibels,
//!     -24.0,
//!     24.0,
//!     0.0,
//! )];
//!
//! impl ParameterInfo for Trim {
//!     fn param_count(&self) -> usize { 1 }
//!
//!     fn param_info(&self, index: usize) -> Option<ParamDescriptor> {
//!         TRIM_PARAMS.get(index).copied()
//!     }
//!
//!     fn get_param(&self, index: usize) -> f32 {
//!         if index == 0 { self.gain_db } else { 0.0 }
//!     }
//!
//!     fn set_param(&mut self, index: usize, value: f32) {
//!         if index == 0 {
//!             self.gain_db = TRIM_PARAMS[0].clamp(value);
//!         }
//!     }
//! }
//!
//! let trim = Trim { gain_db: 0.0 };
//! let index = trim.find_param("gain").unwrap();
//! let desc = trim.param_info(index).unwrap();
//! assert!(desc.validate(ParamValue::Float(30.0)).is_err());
//! ```

use core::fmt;

use libm::{roundf, truncf};

/// Value type of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// Continuous value.
    Float,
    /// Whole numbers only (channel counts and the like).
    Integer,
}

/// Display unit of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamUnit {
    /// Unitless.
    None,
    /// Frequency in Hz.
    Hertz,
    /// Level or gain in dB.
    Decibels,
    /// Time in milliseconds.
    Milliseconds,
    /// Compression ratio (`n:1`).
    Ratio,
    /// Channel count.
    Channels,
}

impl ParamUnit {
    /// Short suffix used when printing values.
    pub fn suffix(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Hertz => " Hz",
            Self::Decibels => " dB",
            Self::Milliseconds => " ms",
            Self::Ratio => ":1",
            Self::Channels => " ch",
        }
    }
}

/// A parameter value as it arrives from the control path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    /// Floating-point value.
    Float(f32),
    /// Integer value.
    Int(i64),
}

impl ParamValue {
    /// The value as `f32`. Large integers lose precision.
    pub fn as_f32(self) -> f32 {
        match self {
            Self::Float(v) => v,
            Self::Int(v) => v as f32,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
        }
    }
}

impl From<f32> for ParamValue {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        Self::Float(v as f32)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u16> for ParamValue {
    fn from(v: u16) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<usize> for ParamValue {
    fn from(v: usize) -> Self {
        Self::Int(v as i64)
    }
}

/// Why a value was rejected by [`ParamDescriptor::validate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamError {
    /// Value lies outside `[min, max]`.
    OutOfRange {
        /// Offending value.
        value: f32,
        /// Inclusive lower bound.
        min: f32,
        /// Inclusive upper bound.
        max: f32,
    },
    /// Fractional value for an integer parameter.
    NotAnInteger(f32),
    /// NaN or infinity.
    NotFinite,
}

impl fmt::Display for ParamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange { value, min, max } => {
                write!(f, "{value} is outside the range {min}..={max}")
            }
            Self::NotAnInteger(v) => write!(f, "{v} is not a whole number"),
            Self::NotFinite => write!(f, "value is not a finite number"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ParamError {}

/// Metadata for one parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamDescriptor {
    /// Identifier used by the control API (`"cutoff"`).
    pub name: &'static str,
    /// Display label (`"Cutoff"`).
    pub label: &'static str,
    /// One-line human description.
    pub description: &'static str,
    /// Value type.
    pub kind: ParamKind,
    /// Display unit.
    pub unit: ParamUnit,
    /// Inclusive lower bound.
    pub min: f32,
    /// Inclusive upper bound.
    pub max: f32,
    /// Value a freshly constructed node starts with.
    pub default: f32,
}

impl ParamDescriptor {
    /// Continuous parameter.
    pub const fn float(
        name: &'static str,
        label: &'static str,
        description: &'static str,
        unit: ParamUnit,
        min: f32,
        max: f32,
        default: f32,
    ) -> Self {
        Self {
            name,
            label,
            description,
            kind: ParamKind::Float,
            unit,
            min,
            max,
            default,
        }
    }

    /// Whole-number parameter.
    pub const fn integer(
        name: &'static str,
        label: &'static str,
        description: &'static str,
        unit: ParamUnit,
        min: i32,
        max: i32,
        default: i32,
    ) -> Self {
        Self {
            name,
            label,
            description,
            kind: ParamKind::Integer,
            unit,
            min: min as f32,
            max: max as f32,
            default: default as f32,
        }
    }

    /// Returns a copy with a different upper bound.
    ///
    /// Used for limits that depend on the sample rate, such as a cutoff that
    /// may not exceed Nyquist.
    pub const fn with_max(mut self, max: f32) -> Self {
        self.max = max;
        self
    }

    /// Checks type and range, returning the value as stored by the node.
    pub fn validate(&self, value: ParamValue) -> Result<f32, ParamError> {
        let v = match value {
            ParamValue::Float(f) => {
                if !f.is_finite() {
                    return Err(ParamError::NotFinite);
                }
                if self.kind == ParamKind::Integer && truncf(f) != f {
                    return Err(ParamError::NotAnInteger(f));
                }
                f
            }
            ParamValue::Int(i) => i as f32,
        };
        if v < self.min || v > self.max {
            return Err(ParamError::OutOfRange {
                value: v,
                min: self.min,
                max: self.max,
            });
        }
        Ok(v)
    }

    /// Clamps into range, rounding integer parameters.
    pub fn clamp(&self, value: f32) -> f32 {
        let v = value.clamp(self.min, self.max);
        match self.kind {
            ParamKind::Float => v,
            ParamKind::Integer => roundf(v),
        }
    }

    /// Wraps a stored value in the variant matching [`kind`](Self::kind).
    pub fn to_value(&self, value: f32) -> ParamValue {
        match self.kind {
            ParamKind::Float => ParamValue::Float(value),
            ParamKind::Integer => ParamValue::Int(roundf(value) as i64),
        }
    }
}

/// Index-based parameter access shared by every node.
///
/// Valid indices are `0..param_count()`. Out-of-range indices read as `0.0`
/// and writes to them are ignored.
pub trait ParameterInfo {
    /// Number of parameters.
    fn param_count(&self) -> usize;

    /// Descriptor at `index`, or `None` past the end.
    fn param_info(&self, index: usize) -> Option<ParamDescriptor>;

    /// Current value at `index`.
    fn get_param(&self, index: usize) -> f32;

    /// Sets the value at `index`.
    ///
    /// Implementations clamp to the descriptor range; callers that need to
    /// reject bad input validate first.
    fn set_param(&mut self, index: usize, value: f32);

    /// Finds a parameter index by name, ignoring ASCII case.
    fn find_param(&self, name: &str) -> Option<usize> {
        (0..self.param_count()).find(|&i| {
            self.param_info(i)
                .is_some_and(|desc| desc.name.eq_ignore_ascii_case(name))
        })
    }
}
