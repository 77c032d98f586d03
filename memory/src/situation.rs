//! # Situation Memory
//!
//! Stores `(situation, recommendation)` pairs as embeddings and recalls the
//! recommendations of the most similar past situations.
//!
//! ## Adding
//!
//! Each pair is embedded in input order. A pair that fails is retried once with
//! the situation fitted to `token_limit - fallback_margin`; if that fails too the
//! pair is skipped and the batch carries on. The successful pairs are then added
//! in one store call with ids continuing from the current store size.
//!
//! ## Querying
//!
//! The query is embedded through the same client (no fallback: a query that
//! cannot be embedded is an error), the store returns the nearest records, and
//! each distance is mapped to a similarity by the store's metric.

use std::sync::Arc;

use embedding::EmbeddingConfig;
use memory_core::{SituationMatch, StoredSituation, VectorStore};
use tokens::{TokenAccountant, CHUNK_AVERAGED_MARKER};
use tracing::{info, warn};

use crate::client::{EmbeddedText, EmbeddingClient};
use crate::config::{MemoryConfig, OversizePolicy};
use crate::error::{EmbeddingError, MemoryError};

/// Facade-level options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryOptions {
    /// Headroom below the token limit for the per-pair fallback retry.
    pub fallback_margin: usize,
    pub oversize_policy: OversizePolicy,
}

impl Default for MemoryOptions {
    fn default() -> Self {
        Self::from(&MemoryConfig::default())
    }
}

impl From<&MemoryConfig> for MemoryOptions {
    fn from(config: &MemoryConfig) -> Self {
        Self {
            fallback_margin: config.fallback_margin,
            oversize_policy: config.oversize_policy,
        }
    }
}

/// Outcome of [`SituationMemory::add_situations`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddReport {
    pub added: usize,
    pub skipped: usize,
    /// Id assigned to the first added record; `None` when nothing was added.
    pub first_id: Option<usize>,
}

/// Semantic memory over one named collection.
pub struct SituationMemory {
    name: String,
    client: EmbeddingClient,
    accountant: Arc<TokenAccountant>,
    store: Arc<dyn VectorStore>,
    options: MemoryOptions,
}

impl SituationMemory {
    pub fn new(
        name: impl Into<String>,
        client: EmbeddingClient,
        accountant: Arc<TokenAccountant>,
        store: Arc<dyn VectorStore>,
        options: MemoryOptions,
    ) -> Self {
        Self {
            name: name.into(),
            client,
            accountant,
            store,
            options,
        }
    }

    /// Builds the accountant, provider, client and store described by `config`
    /// for the collection `name`.
    pub async fn from_config(name: &str, config: &MemoryConfig) -> Result<Self, MemoryError> {
        config.validate()?;

        let accountant = crate::builder::create_accountant(config)?;
        let service = crate::builder::create_embedding_service(&config.embedding)?;
        let client = EmbeddingClient::new(service, accountant.clone(), config.into())?;
        let store = crate::builder::create_store(name, &config.store, config.metric).await?;

        info!(
            collection = %name,
            model = %client.model(),
            backend = ?config.embedding.backend(),
            token_limit = config.token_limit,
            store = ?config.store,
            "Situation memory created"
        );
        Ok(Self::new(name, client, accountant, store, config.into()))
    }

    pub fn collection_name(&self) -> &str {
        &self.name
    }

    pub fn client(&self) -> &EmbeddingClient {
        &self.client
    }

    /// Number of stored situations.
    pub async fn len(&self) -> Result<usize, MemoryError> {
        Ok(self.store.count().await?)
    }

    pub async fn is_empty(&self) -> Result<bool, MemoryError> {
        Ok(self.len().await? == 0)
    }

    /// Removes every stored situation of the collection.
    pub async fn clear(&self) -> Result<(), MemoryError> {
        self.store.clear().await?;
        info!(collection = %self.name, "Situation memory cleared");
        Ok(())
    }

    /// First embedding of a situation: the chunk path for oversized text when
    /// configured, the direct path otherwise.
    async fn embed_situation(&self, situation: &str) -> Result<EmbeddedText, EmbeddingError> {
        let limit = self.client.token_limit();
        let tokens = self.accountant.count_tokens(situation);

        if self.options.oversize_policy == OversizePolicy::ChunkAverage && tokens > limit {
            let embedding = self.client.get_embedding_chunked(situation).await?;
            let preview = self
                .accountant
                .fit_to_budget_with_marker(situation, limit, CHUNK_AVERAGED_MARKER);
            return Ok(EmbeddedText {
                embedding,
                tokens: self.accountant.count_tokens(&preview),
                text: preview,
                truncated: true,
            });
        }

        self.client.embed_text(situation).await
    }

    /// Embeds and stores each `(situation, recommendation)` pair.
    ///
    /// Pairs that cannot be embedded are skipped (logged) and counted in
    /// [`AddReport::skipped`]. If no pair succeeds the store is not touched.
    ///
    /// # Errors
    ///
    /// Only store failures are returned.
    pub async fn add_situations<S, R>(&self, pairs: &[(S, R)]) -> Result<AddReport, MemoryError>
    where
        S: AsRef<str>,
        R: AsRef<str>,
    {
        let fallback_budget = self
            .client
            .token_limit()
            .saturating_sub(self.options.fallback_margin);

        let mut embedded: Vec<(EmbeddedText, &str)> = Vec::with_capacity(pairs.len());
        let mut skipped = 0usize;

        for (index, (situation, recommendation)) in pairs.iter().enumerate() {
            let situation = situation.as_ref();
            let tokens = self.accountant.count_tokens(situation);

            let outcome = match self.embed_situation(situation).await {
                Ok(result) => Ok(result),
                Err(e) => {
                    warn!(
                        collection = %self.name,
                        index,
                        tokens,
                        error = %e,
                        fallback_budget,
                        "Situation failed to embed, retrying with fallback truncation"
                    );
                    let fallback = self.accountant.fit_to_budget(situation, fallback_budget);
                    let fallback_truncated = fallback != situation;
                    self.client.embed_text(&fallback).await.map(|mut result| {
                        result.truncated |= fallback_truncated;
                        result
                    })
                }
            };

            match outcome {
                Ok(result) => {
                    if result.truncated {
                        info!(
                            collection = %self.name,
                            index,
                            original_tokens = tokens,
                            stored_tokens = result.tokens,
                            "Situation stored in truncated form"
                        );
                    }
                    embedded.push((result, recommendation.as_ref()));
                }
                Err(e) => {
                    warn!(
                        collection = %self.name,
                        index,
                        tokens,
                        error = %e,
                        "Situation skipped after fallback failed"
                    );
                    skipped += 1;
                }
            }
        }

        if embedded.is_empty() {
            warn!(
                collection = %self.name,
                pairs = pairs.len(),
                "No situations could be embedded, nothing added"
            );
            return Ok(AddReport {
                added: 0,
                skipped,
                first_id: None,
            });
        }

        let offset = self.store.count().await?;
        let records: Vec<StoredSituation> = embedded
            .into_iter()
            .enumerate()
            .map(|(i, (result, recommendation))| {
                StoredSituation::new((offset + i).to_string(), result.text, recommendation, result.embedding)
            })
            .collect();
        let added = records.len();

        self.store.add(records).await?;

        info!(
            collection = %self.name,
            added,
            skipped,
            first_id = offset,
            "step: situations added"
        );
        Ok(AddReport {
            added,
            skipped,
            first_id: Some(offset),
        })
    }

    /// Returns up to `n_matches` stored situations most similar to `current_situation`,
    /// most similar first.
    ///
    /// # Errors
    ///
    /// `QueryEmbedding` if the query cannot be embedded; `Store` if the store fails.
    pub async fn get_memories(
        &self,
        current_situation: &str,
        n_matches: usize,
    ) -> Result<Vec<SituationMatch>, MemoryError> {
        let embedding = self
            .client
            .get_embedding(current_situation)
            .await
            .map_err(MemoryError::QueryEmbedding)?;

        let metric = self.store.metric();
        let neighbors = self.store.query(&embedding, n_matches).await?;
        let matches: Vec<SituationMatch> = neighbors
            .into_iter()
            .map(|neighbor| SituationMatch {
                matched_situation: neighbor.text,
                recommendation: neighbor.recommendation,
                similarity_score: metric.similarity(neighbor.distance),
            })
            .collect();

        info!(
            collection = %self.name,
            n_matches,
            count = matches.len(),
            metric = metric.as_str(),
            "step: memories retrieved"
        );
        Ok(matches)
    }
}
