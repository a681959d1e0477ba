//! Subcommand execution.
//!
//! Every command produces one JSON value; [`crate::run`] prints it.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use memoires_catalog::{
    Catalog, EncadreurView, FiliereView, Memoire, RecordKey, DEFAULT_SEARCH_FIELDS,
};
use memoires_http::{
    ApiClient, AuthenticatedClient, ClientConfig, CookieJar, CsrfTokenSource, FileRules,
    FileUpload, Payload, RequestOptions,
};

use crate::args::{Args, Command};
use crate::error::CliError;

/// Clients shared by all commands of one invocation.
pub struct Context {
    pub catalog: Catalog,
    pub auth: AuthenticatedClient,
}

impl Context {
    /// Real clients. The cookie string seeds the session jar used by
    /// `request`, which also supplies the CSRF token.
    pub fn from_args(args: &Args) -> Result<Self, CliError> {
        let config = ClientConfig::new(&args.api_url)?
            .with_timeout(Duration::from_secs(args.timeout))
            .require_csrf_token(args.require_csrf);

        let jar = CookieJar::new(config.base_url.clone());
        if let Some(cookie) = &args.cookie {
            jar.add_cookie_str(cookie);
        }

        let client = ApiClient::with_cookie_jar(config, jar.clone())?;
        Ok(Self::with_client(client, Arc::new(jar)))
    }

    pub fn with_client(client: ApiClient, tokens: Arc<dyn CsrfTokenSource>) -> Self {
        Self {
            catalog: Catalog::new(client.clone()),
            auth: AuthenticatedClient::new(client, tokens),
        }
    }
}

fn to_json(value: impl Serialize) -> Result<Value, CliError> {
    Ok(serde_json::to_value(value)?)
}

/// Run `command` and return what should be printed.
pub async fn execute(command: Command, ctx: &Context) -> Result<Value, CliError> {
    let catalog = &ctx.catalog;

    match command {
        Command::Stats => to_json(catalog.get_global_stats().await),

        Command::List {
            year,
            filiere,
            encadreur,
            recent,
        } => {
            let memoires = list(catalog, year, filiere, encadreur, recent).await;
            let root = &catalog.config().media_root;
            to_json(
                memoires
                    .iter()
                    .map(|m| memoires_catalog::MemoireView::project(m, root))
                    .collect::<Vec<_>>(),
            )
        }

        Command::Show { id } => {
            let memoire = catalog
                .get_memoire_by_id(id)
                .await
                .ok_or(CliError::NotFound { kind: "memoire", id })?;
            to_json(memoire)
        }

        Command::Search { query, fields } => {
            let fields: Vec<&str> = if fields.is_empty() {
                DEFAULT_SEARCH_FIELDS.to_vec()
            } else {
                fields.iter().map(String::as_str).collect()
            };
            to_json(catalog.search_memoires(&query, &fields).await)
        }

        Command::Filieres { id: None } => to_json(
            catalog
                .get_all_filieres()
                .await
                .iter()
                .map(FiliereView::from)
                .collect::<Vec<_>>(),
        ),

        Command::Filieres { id: Some(id) } => {
            let filiere = catalog
                .get_filiere_by_id(id)
                .await
                .ok_or(CliError::NotFound { kind: "filiere", id })?;
            let stats = catalog.stats_for_filiere(&filiere).await;
            Ok(json!({
                "filiere": to_json(FiliereView::from(&filiere))?,
                "stats": to_json(stats)?,
            }))
        }

        Command::Encadreurs { id: None } => to_json(
            catalog
                .get_all_encadreurs()
                .await
                .iter()
                .map(EncadreurView::from)
                .collect::<Vec<_>>(),
        ),

        Command::Encadreurs { id: Some(id) } => {
            let encadreur = catalog
                .get_encadreur_by_id(id)
                .await
                .ok_or(CliError::NotFound {
                    kind: "encadreur",
                    id,
                })?;
            let stats = catalog.stats_for_encadreur(&encadreur).await;
            Ok(json!({
                "encadreur": to_json(EncadreurView::from(&encadreur))?,
                "stats": to_json(stats)?,
            }))
        }

        Command::Keywords => to_json(catalog.get_all_keywords().await),

        Command::Upload {
            file,
            file_field,
            mime,
            max_size_mb,
            fields,
        } => {
            let upload = load_file(&file, mime)?;
            let rules = FileRules {
                max_size_mb,
                ..FileRules::default()
            };
            let payload: Payload = fields.into_iter().collect();
            let response = catalog
                .create_memoire_with_file(payload, &file_field, upload, &rules)
                .await?;
            Ok(response.to_value())
        }

        Command::Delete { ids } => {
            let report = catalog.delete_memoires(&ids).await;
            if report.failed > 0 {
                // Still show which ids failed before reporting the error.
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Err(CliError::BatchFailed {
                    failed: report.failed,
                    total: report.total,
                });
            }
            to_json(report)
        }

        Command::Request { method, path, data } => {
            let data = data
                .map(|raw| serde_json::from_str(&raw).map_err(CliError::InvalidData))
                .transpose()?;
            let response = ctx
                .auth
                .request(method, &path, data, RequestOptions::default())
                .await?;
            Ok(response.to_value())
        }
    }
}

/// Narrow with the first filter through its accessor, apply the rest in
/// memory, then order by recency if asked.
async fn list(
    catalog: &Catalog,
    year: Option<i32>,
    filiere: Option<String>,
    encadreur: Option<String>,
    recent: Option<Option<usize>>,
) -> Vec<Memoire> {
    let filiere = filiere.as_deref().map(RecordKey::parse);
    let encadreur = encadreur.as_deref().map(RecordKey::parse);

    let mut memoires = match (&filiere, &encadreur, year) {
        (Some(key), _, _) => catalog.get_memoires_by_filiere(key).await,
        (None, Some(key), _) => catalog.get_memoires_by_encadreur(key).await,
        (None, None, Some(annee)) => catalog.get_memoires_by_year(annee).await,
        (None, None, None) => catalog.get_all_memoires().await,
    };

    memoires.retain(|m| {
        year.map_or(true, |annee| m.annee == Some(annee))
            && encadreur.as_ref().map_or(true, |key| m.supervised_by(key))
    });

    if let Some(limit) = recent {
        let limit = limit.unwrap_or(catalog.config().recent_limit);
        memoires.sort_by(Memoire::newest_first);
        memoires.truncate(limit);
    }

    debug!(count = memoires.len(), "listing memoires");
    memoires
}

/// Read `path` from disk. The MIME type defaults to one guessed from the
/// extension.
fn load_file(path: &Path, mime: Option<String>) -> Result<FileUpload, CliError> {
    let bytes = std::fs::read(path).map_err(|source| CliError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let mime = mime.unwrap_or_else(|| guess_mime(&file_name).to_string());
    Ok(FileUpload::new(file_name, mime, bytes))
}

fn guess_mime(file_name: &str) -> &'static str {
    match file_name.rsplit('.').next().map(str::to_ascii_lowercase).as_deref() {
        Some("pdf") => "application/pdf",
        Some("doc") => "application/msword",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memoires_http::executor::mock::MockExecutor;
    use memoires_http::{CookieString, Method, WireBody};

    fn context(executor: &MockExecutor, cookie: &str) -> Context {
        let client = ApiClient::with_executor(ClientConfig::default(), Arc::new(executor.clone()));
        Context::with_client(client, Arc::new(CookieString::new(cookie)))
    }

    fn records() -> Value {
        json!([
            {"id": 1, "titre": "Monitoring IoT", "annee": 2023, "filiere_id": 1, "encadreur_id": 4},
            {"id": 2, "titre": "Pont mixte", "annee": 2025, "filiere_id": 2, "encadreur_id": 4},
            {"id": 3, "titre": "Réseau 5G", "annee": 2025, "filiere_id": 1, "encadreur_id": 5},
            {"id": 4, "titre": "Drone agricole", "annee": 2024, "filiere_id": 1, "encadreur_id": 4},
        ])
    }

    fn ids(value: &Value) -> Vec<u64> {
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["id"].as_u64().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn list_combines_filters() {
        let executor = MockExecutor::new().with_json("/api/memories/", records());
        let ctx = context(&executor, "");

        let out = execute(
            Command::List {
                year: None,
                filiere: Some("1".to_string()),
                encadreur: Some("4".to_string()),
                recent: Some(None),
            },
            &ctx,
        )
        .await
        .unwrap();

        assert_eq!(ids(&out), vec![4, 1]);
    }

    #[tokio::test]
    async fn list_recent_limit() {
        let executor = MockExecutor::new().with_json("/api/memories/", records());
        let ctx = context(&executor, "");

        let command = Command::List {
            year: None,
            filiere: None,
            encadreur: None,
            recent: Some(Some(2)),
        };
        let out = execute(command, &ctx).await.unwrap();

        assert_eq!(ids(&out).len(), 2);
        assert!(ids(&out).iter().all(|id| [2, 3].contains(id)));
    }

    #[tokio::test]
    async fn show_missing_is_an_error() {
        let executor = MockExecutor::new();
        let ctx = context(&executor, "");

        let error = execute(Command::Show { id: 42 }, &ctx).await.unwrap_err();

        assert_eq!(error.to_string(), "memoire 42 not found");
    }

    #[tokio::test]
    async fn search_defaults_to_standard_fields() {
        let executor = MockExecutor::new().with_json("/api/memories/", records());
        let ctx = context(&executor, "");

        let out = execute(
            Command::Search {
                query: "PONT".to_string(),
                fields: Vec::new(),
            },
            &ctx,
        )
        .await
        .unwrap();

        assert_eq!(ids(&out), vec![2]);
    }

    #[tokio::test]
    async fn filiere_detail_looks_the_track_up_once() {
        let executor = MockExecutor::new()
            .with_json("/api/tracks/1/", json!({"id": 1, "nom": "Génie Logiciel"}))
            .with_json("/api/memories/", records());
        let ctx = context(&executor, "");

        let out = execute(Command::Filieres { id: Some(1) }, &ctx).await.unwrap();

        assert_eq!(out["filiere"]["nom"], json!("Génie Logiciel"));
        assert_eq!(out["stats"]["total_memoires"], json!(3));
        assert_eq!(out["stats"]["derniere_annee"], json!(2025));
        let lookups = executor
            .recorded_requests()
            .iter()
            .filter(|r| r.url.path() == "/api/tracks/1/")
            .count();
        assert_eq!(lookups, 1);
    }

    #[tokio::test]
    async fn encadreur_detail_looks_the_supervisor_up_once() {
        let executor = MockExecutor::new()
            .with_json("/api/supervisors/4/", json!({"id": 4, "nom": "Dr. Murel Nkeng"}))
            .with_json("/api/memories/", records());
        let ctx = context(&executor, "");

        let out = execute(Command::Encadreurs { id: Some(4) }, &ctx).await.unwrap();

        assert_eq!(out["stats"]["total_memoires"], json!(3));
        let lookups = executor
            .recorded_requests()
            .iter()
            .filter(|r| r.url.path() == "/api/supervisors/4/")
            .count();
        assert_eq!(lookups, 1);
    }

    #[tokio::test]
    async fn request_sends_csrf_header() {
        let executor = MockExecutor::new().with_response(
            Method::PATCH,
            "/api/tracks/1/",
            MockExecutor::json_response(200, json!({"id": 1, "icon": "fas fa-code"})),
        );
        let ctx = context(&executor, "sessionid=s; csrftoken=abc");

        let out = execute(
            Command::Request {
                method: Method::PATCH,
                path: "/tracks/1/".to_string(),
                data: Some(r#"{"icon": "fas fa-code"}"#.to_string()),
            },
            &ctx,
        )
        .await
        .unwrap();

        assert_eq!(out["icon"], json!("fas fa-code"));
        let request = &executor.recorded_requests()[0];
        assert_eq!(request.header("x-csrftoken"), Some("abc"));
        assert_eq!(request.body, Some(WireBody::Json(json!({"icon": "fas fa-code"}))));
    }

    #[tokio::test]
    async fn request_rejects_bad_json() {
        let executor = MockExecutor::new();
        let ctx = context(&executor, "");

        let error = execute(
            Command::Request {
                method: Method::POST,
                path: "/tracks/".to_string(),
                data: Some("{nope".to_string()),
            },
            &ctx,
        )
        .await
        .unwrap_err();

        assert!(matches!(error, CliError::InvalidData(_)));
        assert_eq!(executor.request_count(), 0);
    }

    #[test]
    fn mime_guess() {
        assert_eq!(guess_mime("rapport.PDF"), "application/pdf");
        assert_eq!(guess_mime("archive.tar.gz"), "application/octet-stream");
    }

    #[test]
    fn unreadable_file() {
        let error = load_file(Path::new("/nonexistent/rapport.pdf"), None).unwrap_err();
        assert!(error.to_string().starts_with("Failed to read /nonexistent/rapport.pdf"));
    }
}
