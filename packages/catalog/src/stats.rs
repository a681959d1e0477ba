//! Aggregated views over the catalogue.

use chrono::Datelike;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::accessors::Catalog;
use crate::models::{
    value_text, Encadreur, EncadreurView, Filiere, FiliereView, KeyWord, Memoire, MemoireView,
    RecordKey,
};

/// Dashboard summary handed to the UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobalStats {
    pub memoires: Vec<MemoireView>,
    pub filieres: Vec<FiliereView>,
    pub encadreurs: Vec<EncadreurView>,
    #[serde(rename = "keyWords")]
    pub keywords: Vec<KeyWord>,
    pub total_memoires: usize,
    pub total_filieres: usize,
    pub total_encadreurs: usize,
    pub latest_year: i32,
    /// Count per `annee`, in first-seen order.
    pub memoires_par_annee: IndexMap<String, usize>,
    /// Count per track name (`filiere`, else `track`), in first-seen order.
    pub memoires_par_filiere: IndexMap<String, usize>,
}

impl GlobalStats {
    /// Build the summary from already fetched collections.
    ///
    /// `current_year` is used as `latest_year` when no record carries a year.
    pub fn compute(
        memoires: &[Memoire],
        filieres: &[Filiere],
        encadreurs: &[Encadreur],
        keywords: Vec<KeyWord>,
        media_root: &Url,
        current_year: i32,
    ) -> Self {
        let latest_year = memoires
            .iter()
            .filter_map(|m| m.annee)
            .max()
            .unwrap_or(current_year);

        let mut par_annee = IndexMap::new();
        let mut par_filiere = IndexMap::new();
        for memoire in memoires {
            if let Some(annee) = memoire.annee {
                *par_annee.entry(annee.to_string()).or_insert(0) += 1;
            }
            if let Some(filiere) = memoire.filiere_ref() {
                *par_filiere.entry(value_text(filiere)).or_insert(0) += 1;
            }
        }

        Self {
            memoires: memoires
                .iter()
                .map(|m| MemoireView::project(m, media_root))
                .collect(),
            filieres: filieres.iter().map(FiliereView::from).collect(),
            encadreurs: encadreurs.iter().map(EncadreurView::from).collect(),
            keywords,
            total_memoires: memoires.len(),
            total_filieres: filieres.len(),
            total_encadreurs: encadreurs.len(),
            latest_year,
            memoires_par_annee: par_annee,
            memoires_par_filiere: par_filiere,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FiliereStats {
    pub id: u64,
    pub nom: String,
    pub total_memoires: usize,
    pub derniere_annee: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EncadreurStats {
    pub id: u64,
    pub nom: String,
    pub total_memoires: usize,
    /// Distinct years, newest first.
    pub annees: Vec<i32>,
    /// Distinct track references, first-seen order.
    pub filieres: Vec<Value>,
}

impl EncadreurStats {
    fn compute(encadreur: &Encadreur, memoires: &[Memoire]) -> Self {
        let mut annees: Vec<i32> = memoires.iter().filter_map(|m| m.annee).collect();
        annees.sort_unstable_by(|a, b| b.cmp(a));
        annees.dedup();

        let mut filieres: Vec<Value> = Vec::new();
        for filiere in memoires.iter().filter_map(Memoire::filiere_ref) {
            if !filieres.contains(filiere) {
                filieres.push(filiere.clone());
            }
        }

        Self {
            id: encadreur.id,
            nom: encadreur.nom.clone(),
            total_memoires: memoires.len(),
            annees,
            filieres,
        }
    }
}

pub(crate) fn current_year() -> i32 {
    chrono::Local::now().year()
}

impl Catalog {
    /// Fetch all four collections at once and summarise them.
    ///
    /// Never fails: each collection already degrades to its cached copy or
    /// to an empty list.
    pub async fn get_global_stats(&self) -> GlobalStats {
        let (memoires, filieres, encadreurs, keywords) = tokio::join!(
            self.get_all_memoires(),
            self.get_all_filieres(),
            self.get_all_encadreurs(),
            self.get_all_keywords(),
        );

        GlobalStats::compute(
            &memoires,
            &filieres,
            &encadreurs,
            keywords,
            &self.config.media_root,
            current_year(),
        )
    }

    /// `None` when the track cannot be found.
    pub async fn get_filiere_stats(&self, id: u64) -> Option<FiliereStats> {
        let filiere = self.get_filiere_by_id(id).await?;
        Some(self.stats_for_filiere(&filiere).await)
    }

    /// Statistics for a track already in hand. Only the collection of
    /// theses is read.
    pub async fn stats_for_filiere(&self, filiere: &Filiere) -> FiliereStats {
        let memoires = self.get_memoires_by_filiere(&RecordKey::Id(filiere.id)).await;

        FiliereStats {
            id: filiere.id,
            nom: filiere.nom.clone(),
            total_memoires: memoires.len(),
            derniere_annee: memoires.iter().filter_map(|m| m.annee).max(),
        }
    }

    /// `None` when the supervisor cannot be found.
    pub async fn get_encadreur_stats(&self, id: u64) -> Option<EncadreurStats> {
        let encadreur = self.get_encadreur_by_id(id).await?;
        Some(self.stats_for_encadreur(&encadreur).await)
    }

    pub async fn stats_for_encadreur(&self, encadreur: &Encadreur) -> EncadreurStats {
        let memoires = self.get_memoires_by_encadreur(&RecordKey::Id(encadreur.id)).await;
        EncadreurStats::compute(encadreur, &memoires)
    }
}
