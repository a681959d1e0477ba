//! Records exchanged with the backend and the shapes handed to the UI.
//!
//! Raw records keep every field the backend sends (unknown ones land in
//! `extra`), so nothing is lost between a fetch and a projection.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

/// A thesis record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memoire {
    #[serde(deserialize_with = "lenient::id")]
    pub id: u64,
    #[serde(default, deserialize_with = "lenient::text")]
    pub titre: String,
    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub auteur: Option<String>,
    /// Accepts `2024` or `"2024"`; anything else reads as absent.
    #[serde(
        default,
        deserialize_with = "lenient::opt_year",
        skip_serializing_if = "Option::is_none"
    )]
    pub annee: Option<i32>,
    /// Track reference; an id or a name depending on the endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filiere: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filiere_id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_id: Option<Value>,
    /// Supervisor reference; an id or a name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encadreur: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encadreur_id: Option<Value>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub nom_filiere: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub nom_encadreur: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mots_cles: Option<Value>,
    #[serde(
        default,
        rename = "motsCles_list",
        deserialize_with = "lenient::opt_text_list",
        skip_serializing_if = "Option::is_none"
    )]
    pub mots_cles_list: Option<Vec<String>>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub fichier: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub fichier_pdf: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taille: Option<Value>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub date_ajout: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub date_modification: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Memoire {
    /// Track used for grouping: `filiere`, else `track`.
    pub fn filiere_ref(&self) -> Option<&Value> {
        [&self.filiere, &self.track]
            .into_iter()
            .flatten()
            .find(|value| is_truthy(value))
    }

    pub fn belongs_to_filiere(&self, key: &RecordKey) -> bool {
        [&self.filiere_id, &self.filiere, &self.track_id]
            .into_iter()
            .flatten()
            .any(|value| key.matches(value))
    }

    pub fn supervised_by(&self, key: &RecordKey) -> bool {
        [&self.encadreur_id, &self.encadreur]
            .into_iter()
            .flatten()
            .any(|value| key.matches(value))
    }

    /// Ordering for "recent" lists: newest `annee` first, then newest
    /// `created_at`. Records missing both sort last and keep their relative order
    /// under a stable sort.
    pub fn newest_first(a: &Memoire, b: &Memoire) -> Ordering {
        b.annee
            .cmp(&a.annee)
            .then_with(|| b.created_at.cmp(&a.created_at))
    }

    /// Text of the wire field `name`, for searching. Empty and falsy
    /// values count as absent; arrays are joined with commas.
    pub fn field_text(&self, name: &str) -> Option<String> {
        let text = |field: &Option<String>| field.clone().filter(|s| !s.is_empty());
        let json = |field: &Option<Value>| field.as_ref().and_then(search_text);

        match name {
            "id" => Some(self.id).filter(|id| *id != 0).map(|id| id.to_string()),
            "titre" => Some(self.titre.clone()).filter(|s| !s.is_empty()),
            "auteur" => text(&self.auteur),
            "annee" => self.annee.filter(|y| *y != 0).map(|y| y.to_string()),
            "filiere" => json(&self.filiere),
            "filiere_id" => json(&self.filiere_id),
            "track" => json(&self.track),
            "track_id" => json(&self.track_id),
            "encadreur" => json(&self.encadreur),
            "encadreur_id" => json(&self.encadreur_id),
            "nom_filiere" => text(&self.nom_filiere),
            "nom_encadreur" => text(&self.nom_encadreur),
            "description" => text(&self.description),
            "mots_cles" => json(&self.mots_cles),
            "motsCles_list" => self.mots_cles_list.as_ref().map(|list| list.join(",")),
            "fichier" => text(&self.fichier),
            "fichier_pdf" => text(&self.fichier_pdf),
            "taille" => json(&self.taille),
            "date_ajout" => text(&self.date_ajout),
            "date_modification" => text(&self.date_modification),
            "created_at" => text(&self.created_at),
            other => self.extra.get(other).and_then(search_text),
        }
    }
}

/// A track ("filière").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filiere {
    #[serde(deserialize_with = "lenient::id")]
    pub id: u64,
    #[serde(default, deserialize_with = "lenient::text")]
    pub nom: String,
    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memos: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encadreurs: Option<Value>,
    #[serde(
        default,
        rename = "derniereAnnee",
        skip_serializing_if = "Option::is_none"
    )]
    pub derniere_annee: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A supervisor ("encadreur").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Encadreur {
    #[serde(deserialize_with = "lenient::id")]
    pub id: u64,
    #[serde(default, deserialize_with = "lenient::text")]
    pub nom: String,
    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub avatar: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub nom_specialite: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depuis: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memos: Option<Value>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A keyword entry, passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyWord(pub Value);

/// Reference to a related record by id or by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordKey {
    Id(u64),
    Name(String),
}

impl RecordKey {
    /// Parse a CLI-style key: digits are an id, anything else a name.
    pub fn parse(raw: &str) -> Self {
        raw.parse()
            .map(RecordKey::Id)
            .unwrap_or_else(|_| RecordKey::Name(raw.to_string()))
    }

    /// Strict equality against a JSON field; `3` never matches `"3"`.
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (RecordKey::Id(id), Value::Number(n)) => n.as_u64() == Some(*id),
            (RecordKey::Name(name), Value::String(s)) => s == name,
            _ => false,
        }
    }
}

impl From<u64> for RecordKey {
    fn from(id: u64) -> Self {
        RecordKey::Id(id)
    }
}

impl From<&str> for RecordKey {
    fn from(name: &str) -> Self {
        RecordKey::Name(name.to_string())
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64() != Some(0.0),
        _ => true,
    }
}

fn search_text(value: &Value) -> Option<String> {
    if !is_truthy(value) {
        return None;
    }
    Some(value_text(value))
}

/// Plain text of a JSON value: strings unquoted, arrays comma-joined.
pub(crate) fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(value_text).collect::<Vec<_>>().join(","),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Field readers that accept what the backend actually sends.
///
/// One odd field must not make a whole collection undecodable, so type
/// mismatches degrade to "absent" instead of failing. Only a record id is
/// required to be an integer (or a string holding one).
mod lenient {
    use serde::de::{Deserializer, Error};
    use serde::Deserialize;
    use serde_json::Value;

    use super::value_text;

    pub fn id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Number(n) => n
                .as_u64()
                .ok_or_else(|| D::Error::custom(format!("invalid record id {}", n))),
            Value::String(s) => s
                .trim()
                .parse()
                .map_err(|_| D::Error::custom(format!("invalid record id '{}'", s))),
            other => Err(D::Error::custom(format!("invalid record id {}", other))),
        }
    }

    pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(opt_text(deserializer)?.unwrap_or_default())
    }

    pub fn opt_text<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Null => None,
            other => Some(value_text(&other)),
        })
    }

    pub fn opt_year<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i32>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Number(n) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
    }

    pub fn opt_text_list<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<String>>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Null => None,
            Value::Array(items) => Some(
                items
                    .iter()
                    .filter(|item| !item.is_null())
                    .map(value_text)
                    .collect(),
            ),
            other => Some(vec![value_text(&other)]),
        })
    }
}

/// Thesis as shown in lists and cards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoireView {
    pub id: u64,
    pub titre: String,
    pub auteur: Option<String>,
    pub encadreur: Option<String>,
    pub filiere: Option<String>,
    pub annee: Option<i32>,
    pub fichier: Option<String>,
    pub taille: Option<Value>,
    /// Download link for the PDF.
    pub url: Option<String>,
    pub date_ajout: Option<String>,
    pub date_modification: Option<String>,
    #[serde(rename = "motsCles")]
    pub mots_cles: Option<Vec<String>>,
}

impl MemoireView {
    /// Reshape a record; file paths are resolved against `media_root`.
    pub fn project(memoire: &Memoire, media_root: &Url) -> Self {
        Self {
            id: memoire.id,
            titre: memoire.titre.clone(),
            auteur: memoire.auteur.clone(),
            encadreur: memoire.nom_encadreur.clone(),
            filiere: memoire.nom_filiere.clone(),
            annee: memoire.annee,
            fichier: memoire.fichier.clone(),
            taille: memoire.taille.clone(),
            url: memoire
                .fichier_pdf
                .as_deref()
                .map(|file| media_url(media_root, file)),
            date_ajout: memoire.date_ajout.clone(),
            date_modification: memoire.date_modification.clone(),
            mots_cles: memoire.mots_cles_list.clone(),
        }
    }
}

fn media_url(media_root: &Url, file: &str) -> String {
    if file.starts_with("http://") || file.starts_with("https://") {
        return file.to_string();
    }
    format!(
        "{}/{}",
        media_root.as_str().trim_end_matches('/'),
        file.trim_start_matches('/')
    )
}

/// Track as shown in the UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FiliereView {
    pub id: u64,
    pub nom: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub memos: Option<Value>,
    pub encadreurs: Option<Value>,
    #[serde(rename = "derniereAnnee")]
    pub derniere_annee: Option<Value>,
}

impl From<&Filiere> for FiliereView {
    fn from(filiere: &Filiere) -> Self {
        Self {
            id: filiere.id,
            nom: filiere.nom.clone(),
            description: filiere.description.clone(),
            icon: filiere.icon.clone(),
            memos: filiere.memos.clone(),
            encadreurs: filiere.encadreurs.clone(),
            derniere_annee: filiere.derniere_annee.clone(),
        }
    }
}

/// Supervisor as shown in the UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EncadreurView {
    pub id: u64,
    pub nom: String,
    pub avatar: Option<String>,
    pub specialite: Option<String>,
    pub depuis: Option<Value>,
    pub memos: Option<Value>,
    pub description: Option<String>,
}

impl From<&Encadreur> for EncadreurView {
    fn from(encadreur: &Encadreur) -> Self {
        Self {
            id: encadreur.id,
            nom: encadreur.nom.clone(),
            avatar: encadreur.avatar.clone(),
            specialite: encadreur.nom_specialite.clone(),
            depuis: encadreur.depuis.clone(),
            memos: encadreur.memos.clone(),
            description: encadreur.description.clone(),
        }
    }
}
