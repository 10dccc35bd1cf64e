//! Parameter specifications
//!
//! A [`ParamSpec`] is the ordered list of argument slots a command or
//! environment declares once, at registration time. Each slot is either
//! required (`{...}`) or optional (`[...]`), and either interpreted (nested
//! control sequences are expanded) or raw (scanned literally).

use super::RegistryError;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    Optional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgMode {
    Interpreted,
    Raw,
}

/// One argument slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Param {
    pub presence: Presence,
    pub mode: ArgMode,
}

impl Param {
    pub fn is_optional(&self) -> bool {
        self.presence == Presence::Optional
    }

    pub fn is_raw(&self) -> bool {
        self.mode == ArgMode::Raw
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamSpec {
    params: Vec<Param>,
}

impl ParamSpec {
    /// A spec with no slots.
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, presence: Presence, mode: ArgMode) -> Self {
        self.params.push(Param { presence, mode });
        self
    }

    pub fn required(self) -> Self {
        self.push(Presence::Required, ArgMode::Interpreted)
    }

    pub fn optional(self) -> Self {
        self.push(Presence::Optional, ArgMode::Interpreted)
    }

    pub fn raw_required(self) -> Self {
        self.push(Presence::Required, ArgMode::Raw)
    }

    pub fn raw_optional(self) -> Self {
        self.push(Presence::Optional, ArgMode::Raw)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Param> {
        self.params.iter()
    }
}

/// Shorthand notation: `!` required, `?` optional, `x` raw required, `o` raw
/// optional.
impl FromStr for ParamSpec {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.chars().try_fold(ParamSpec::new(), |spec, c| match c {
            '!' => Ok(spec.required()),
            '?' => Ok(spec.optional()),
            'x' => Ok(spec.raw_required()),
            'o' => Ok(spec.raw_optional()),
            other => Err(RegistryError::InvalidParams {
                spec: s.to_string(),
                flag: other,
            }),
        })
    }
}

impl fmt::Display for ParamSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for param in &self.params {
            let flag = match (param.presence, param.mode) {
                (Presence::Required, ArgMode::Interpreted) => "!",
                (Presence::Optional, ArgMode::Interpreted) => "?",
                (Presence::Required, ArgMode::Raw) => "x",
                (Presence::Optional, ArgMode::Raw) => "o",
            };
            f.write_str(flag)?;
        }
        Ok(())
    }
}
