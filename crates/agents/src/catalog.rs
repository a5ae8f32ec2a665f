// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Read-only product catalog loaded from CSV

use std::{collections::HashMap, path::Path};

use shared_types::CatalogEntry;
use tracing::info;

use crate::error::{AgentError, AgentResult};

/// Catalog listings in file order, indexed by id
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    index: HashMap<u64, usize>,
}

impl Catalog {
    /// Load a catalog from a CSV file with a header row
    ///
    /// Expected columns: `id,title,category,brand,condition,age_months,asking_price,location`.
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> AgentResult<Self> {
        let path = path.as_ref();
        let mut reader = csv::Reader::from_path(path).map_err(|e| {
            AgentError::catalog(format!("Failed to open {}: {e}", path.display()))
        })?;

        let entries = reader
            .deserialize::<CatalogEntry>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| AgentError::catalog(format!("Failed to parse {}: {e}", path.display())))?;

        let catalog = Self::from_entries(entries)?;
        info!(
            "Loaded catalog with {} products from {}",
            catalog.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// Build a catalog from entries
    ///
    /// Rejects duplicate ids and asking prices that are not finite and positive.
    pub fn from_entries(entries: Vec<CatalogEntry>) -> AgentResult<Self> {
        let mut index = HashMap::with_capacity(entries.len());
        for (position, entry) in entries.iter().enumerate() {
            if !(entry.asking_price.is_finite() && entry.asking_price > 0.0) {
                return Err(AgentError::catalog(format!(
                    "Product id {} has invalid asking_price {}",
                    entry.id, entry.asking_price
                )));
            }
            if index.insert(entry.id, position).is_some() {
                return Err(AgentError::catalog(format!(
                    "Duplicate product id {}",
                    entry.id
                )));
            }
        }

        Ok(Self { entries, index })
    }

    /// Look up a listing by id
    pub fn get(&self, id: u64) -> Option<&CatalogEntry> {
        self.index.get(&id).map(|&position| &self.entries[position])
    }

    /// First listing in file order
    pub fn first(&self) -> Option<&CatalogEntry> {
        self.entries.first()
    }

    /// All listings in file order
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Number of listings
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the catalog has no listings
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
