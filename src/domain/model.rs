use crate::utils::error::{ClientError, Result};
use crate::utils::validation::Validate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Catalog entry describing one benefit offering. Owned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prestation {
    pub id: u64,
    pub nom: String,
    pub categorie: String,
    pub description: String,
    /// Pre-formatted amount with its currency, e.g. "$500". Never parsed.
    pub montant_max: String,
    pub duree: String,
    pub conditions: String,
    pub couleur: String,
    pub icone: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemandeStatus {
    EnCours,
    Approuvee,
    Refusee,
}

impl DemandeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DemandeStatus::EnCours => "en_cours",
            DemandeStatus::Approuvee => "approuvee",
            DemandeStatus::Refusee => "refusee",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DemandeStatus::Approuvee | DemandeStatus::Refusee)
    }
}

impl fmt::Display for DemandeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application record as returned by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Demande {
    pub id: u64,
    pub prestation_id: u64,
    pub user_id: u64,
    pub statut: DemandeStatus,
    pub date_creation: DateTime<Utc>,
    pub date_mise_a_jour: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub montant_demande: Option<f64>,
    pub motif: String,
    pub documents: Vec<String>,
}

impl Demande {
    /// True once the server has approved or refused the demande.
    pub fn is_settled(&self) -> bool {
        self.statut.is_terminal()
    }
}

impl Validate for Demande {
    fn validate(&self) -> Result<()> {
        if self.date_mise_a_jour < self.date_creation {
            return Err(ClientError::InvalidResponse {
                message: format!(
                    "demande {} was updated ({}) before it was created ({})",
                    self.id, self.date_mise_a_jour, self.date_creation
                ),
            });
        }
        Ok(())
    }
}

/// Client-side payload for creating a demande. Server-owned fields
/// (`id`, `statut`, timestamps) cannot be expressed here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDemande {
    pub prestation_id: u64,
    pub user_id: u64,
    pub motif: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub montant_demande: Option<f64>,
    #[serde(default)]
    pub documents: Vec<String>,
}

impl NewDemande {
    pub fn new(prestation_id: u64, user_id: u64, motif: impl Into<String>) -> Self {
        Self {
            prestation_id,
            user_id,
            motif: motif.into(),
            montant_demande: None,
            documents: Vec::new(),
        }
    }

    pub fn with_montant(mut self, montant: f64) -> Self {
        self.montant_demande = Some(montant);
        self
    }

    pub fn with_document(mut self, document: impl Into<String>) -> Self {
        self.documents.push(document.into());
        self
    }
}

/// Optional catalog filters. Empty values are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrestationFilter {
    pub categorie: Option<String>,
    pub search: Option<String>,
}

impl PrestationFilter {
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        let fields = [("category", &self.categorie), ("search", &self.search)];
        for (key, value) in fields {
            if let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                pairs.push((key.to_string(), value.to_string()));
            }
        }
        pairs
    }

    pub fn is_empty(&self) -> bool {
        self.query_pairs().is_empty()
    }
}

/// Groups prestations by `categorie`, keeping server order inside each group.
pub fn group_by_categorie(prestations: &[Prestation]) -> BTreeMap<&str, Vec<&Prestation>> {
    let mut groups: BTreeMap<&str, Vec<&Prestation>> = BTreeMap::new();
    for prestation in prestations {
        groups
            .entry(prestation.categorie.as_str())
            .or_default()
            .push(prestation);
    }
    groups
}
