// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Stub models and fixtures for unit tests

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use llm_client::{LanguageModel, LlmError, LlmResult};
use shared_types::{CatalogEntry, Condition, Product};

use crate::journal::{DecisionJournal, MockDecisionJournal};

/// Behaviour of a [`StubModel`]
#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Text(String),
    Unavailable,
    Hang,
}

/// Deterministic model that counts its calls
#[derive(Debug)]
pub(crate) struct StubModel {
    reply: Reply,
    calls: AtomicUsize,
}

impl StubModel {
    pub(crate) fn text(text: &str) -> Arc<Self> {
        Self::with(Reply::Text(text.to_string()))
    }

    pub(crate) fn unavailable() -> Arc<Self> {
        Self::with(Reply::Unavailable)
    }

    pub(crate) fn hanging() -> Arc<Self> {
        Self::with(Reply::Hang)
    }

    fn with(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: AtomicUsize::new(0),
        })
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl LanguageModel for StubModel {
    async fn generate(&self, _prompt: &str) -> LlmResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Unavailable => Err(LlmError::service_unavailable("stub is down")),
            Reply::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(LlmError::timeout(3600))
            }
        }
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

/// Journal mock that accepts any number of records
pub(crate) fn permissive_journal() -> Arc<dyn DecisionJournal> {
    let mut journal = MockDecisionJournal::new();
    journal.expect_record_negotiation().returning(|_| Ok(()));
    journal.expect_record_moderation().returning(|_| Ok(()));
    Arc::new(journal)
}

pub(crate) fn iphone() -> Product {
    Product {
        title: "iPhone 12".to_string(),
        category: "Mobile".to_string(),
        brand: "Apple".to_string(),
        condition: Condition::Good,
        age_months: 24,
        asking_price: Some(35000.0),
        location: "Mumbai".to_string(),
    }
}

pub(crate) fn entry(
    id: u64,
    category: &str,
    brand: &str,
    age_months: u32,
    asking_price: f64,
) -> CatalogEntry {
    CatalogEntry {
        id,
        title: format!("{brand} item {id}"),
        category: category.to_string(),
        brand: brand.to_string(),
        condition: Condition::Good,
        age_months,
        asking_price,
        location: "Mumbai".to_string(),
    }
}
