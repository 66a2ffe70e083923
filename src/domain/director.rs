use std::fmt;

use serde::Serialize;

use crate::error::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Director {
    name: String,
}

impl Director {
    pub fn new(name: &str) -> Result<Self, DomainError> {
        Ok(Self { name: super::non_empty(name, "director name")? })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Director {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
