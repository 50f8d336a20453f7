//! Category tables shared with the training pipeline.
//!
//! The codes below are baked into the trained artifact. Changing one silently
//! shifts every prediction, so the tables are `'static` and never mutated.

use crate::error::PredictError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryField {
    Transport,
    Diet,
}

impl CategoryField {
    pub fn key(self) -> &'static str {
        match self {
            Self::Transport => "transport_mode",
            Self::Diet => "diet_type",
        }
    }
}

/// One name → code lookup table. Entries are listed in code order.
#[derive(Debug)]
pub struct CategoryTable {
    pub field: CategoryField,
    pub entries: &'static [(&'static str, u32)],
}

impl CategoryTable {
    pub fn lookup(&self, name: &str) -> Option<u32> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, code)| *code)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|(n, _)| *n).collect()
    }
}

pub static TRANSPORT_CODES: CategoryTable = CategoryTable {
    field: CategoryField::Transport,
    entries: &[("car", 0), ("bus", 1), ("train", 2), ("bike", 3)],
};

pub static DIET_CODES: CategoryTable = CategoryTable {
    field: CategoryField::Diet,
    entries: &[("vegan", 0), ("vegetarian", 1), ("mixed", 2)],
};

/// Resolved codes for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodedCategories {
    pub transport: u32,
    pub diet: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct CategoryEncoder {
    transport: &'static CategoryTable,
    diet: &'static CategoryTable,
}

impl CategoryEncoder {
    pub fn new(transport: &'static CategoryTable, diet: &'static CategoryTable) -> Self {
        Self { transport, diet }
    }

    fn table(&self, field: CategoryField) -> &'static CategoryTable {
        match field {
            CategoryField::Transport => self.transport,
            CategoryField::Diet => self.diet,
        }
    }

    /// Case- and whitespace-insensitive lookup.
    pub fn encode(&self, field: CategoryField, name: &str) -> Result<u32, PredictError> {
        let table = self.table(field);
        let normalized = name.trim().to_lowercase();
        table
            .lookup(&normalized)
            .ok_or_else(|| PredictError::InvalidCategory {
                field: field.key(),
                value: name.to_string(),
                valid: table.names(),
            })
    }

    /// Transport is checked first, so a request with two bad categories
    /// reports the transport one.
    pub fn encode_pair(&self, transport: &str, diet: &str) -> Result<EncodedCategories, PredictError> {
        Ok(EncodedCategories {
            transport: self.encode(CategoryField::Transport, transport)?,
            diet: self.encode(CategoryField::Diet, diet)?,
        })
    }
}

impl Default for CategoryEncoder {
    fn default() -> Self {
        Self::new(&TRANSPORT_CODES, &DIET_CODES)
    }
}
