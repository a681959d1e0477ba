use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use memoires_catalog::{Catalog, CatalogConfig, RecordKey, Throttle};
use memoires_http::{ApiClient, ClientConfig, FileRules, FileUpload, Payload};

fn catalog_for(server: &MockServer) -> Catalog {
    let config = ClientConfig::new(&format!("{}/api", server.uri())).unwrap();
    Catalog::new(ApiClient::new(config).unwrap())
}

fn memoires() -> serde_json::Value {
    json!([
        {"id": 1, "titre": "Monitoring IoT", "annee": 2025, "filiere": "Génie Informatique",
         "filiere_id": 1, "nom_filiere": "Génie Informatique",
         "fichier_pdf": "media/memoires/iot.pdf", "motsCles_list": ["IoT"]},
        {"id": 2, "titre": "Parc solaire", "annee": 2024, "track": "Génie Électrique",
         "filiere_id": 2},
    ])
}

#[tokio::test]
async fn test_stale_collection_served_after_backend_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/memories/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(memoires()))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/memories/"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "down"})))
        .mount(&server)
        .await;

    let catalog = catalog_for(&server);
    let fresh = catalog.get_all_memoires().await;
    let stale = catalog.get_all_memoires().await;

    assert_eq!(fresh.len(), 2);
    assert_eq!(fresh, stale);
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_global_stats_fan_out() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/memories/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(memoires()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/tracks/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"id": 1, "nom": "Génie Informatique", "derniereAnnee": 2025}])),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/supervisors/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!([{"id": 3, "nom": "Dr. Alexis Fotso", "nom_specialite": "IA"}]),
        ))
        .mount(&server)
        .await;
    // Keywords are down; the summary is still produced.
    Mock::given(method("GET"))
        .and(path("/api/keywords/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let stats = catalog_for(&server).get_global_stats().await;
    let value = serde_json::to_value(&stats).unwrap();

    assert_eq!(stats.total_memoires, 2);
    assert_eq!(stats.total_filieres, 1);
    assert_eq!(stats.total_encadreurs, 1);
    assert_eq!(stats.latest_year, 2025);
    assert_eq!(value["keyWords"], json!([]));
    assert_eq!(
        value["memoires_par_filiere"],
        json!({"Génie Informatique": 1, "Génie Électrique": 1})
    );
    assert_eq!(value["encadreurs"][0]["specialite"], json!("IA"));
    assert_eq!(value["filieres"][0]["derniereAnnee"], json!(2025));
    assert_eq!(
        value["memoires"][0]["url"],
        json!(format!("{}/media/memoires/iot.pdf", server.uri()))
    );
    assert_eq!(value["memoires"][0]["motsCles"], json!(["IoT"]));
}

#[tokio::test]
async fn test_filter_after_refresh_refetches() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/memories/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(memoires()))
        .expect(2)
        .mount(&server)
        .await;

    let catalog = catalog_for(&server);
    let by_track = catalog.get_memoires_by_filiere(&RecordKey::Id(2)).await;
    assert_eq!(by_track.len(), 1);

    catalog.refresh_all_data();
    assert!(!catalog.cache().memoires.is_populated());

    let by_year = catalog.get_memoires_by_year(2025).await;
    assert_eq!(by_year[0].titre, "Monitoring IoT");
}

#[tokio::test]
async fn test_upload_with_file() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/memories/create"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 9})))
        .mount(&server)
        .await;

    let catalog = catalog_for(&server);
    let file = FileUpload::new("pont.pdf", "application/pdf", b"%PDF-1.7".to_vec());

    let created = catalog
        .create_memoire_with_file(
            Payload::new().with("titre", "Pont mixte").with("annee", 2025),
            "fichier_pdf",
            file,
            &FileRules::default(),
        )
        .await
        .unwrap();

    assert_eq!(created.to_value()["id"], json!(9));

    let requests = server.received_requests().await.unwrap();
    let content_type = requests[0]
        .headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("multipart/form-data; boundary="));
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains(r#"name="annee""#));
    assert!(body.contains(r#"filename="pont.pdf""#));
}

#[tokio::test]
async fn test_batch_delete_is_sequential_and_paced() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/memories/delete/1/"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/memories/delete/2/"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"error": "Permission refusée"})))
        .mount(&server)
        .await;

    let config = ClientConfig::new(&format!("{}/api", server.uri())).unwrap();
    let client = ApiClient::new(config).unwrap();
    let catalog_config = CatalogConfig::for_client(client.config())
        .with_batch(Throttle::new(1, Duration::from_millis(30)));
    let catalog = Catalog::with_cache(client, Default::default(), catalog_config);

    let started = std::time::Instant::now();
    let report = catalog.delete_memoires(&[1, 2]).await;

    assert!(started.elapsed() >= Duration::from_millis(60));
    assert_eq!(report.success, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.errors[0].id, 2);
    assert_eq!(report.errors[0].error, "Permission refusée");
}
