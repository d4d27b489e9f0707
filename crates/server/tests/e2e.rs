use std::net::SocketAddr;
use std::sync::Arc;

use configs::AdminConfig;
use reqwest::StatusCode as HttpStatusCode;
use serde_json::{json, Value};
use server::routes::{build_router, AppState};
use server::startup::serve;
use service::bank::BankService;
use service::storage::{CollectionStorage, JsonFileStore, Seeds, Storage};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

struct TestApp {
    base_url: String,
    stop: Option<oneshot::Sender<()>>,
    server: tokio::task::JoinHandle<anyhow::Result<()>>,
    data_dir: std::path::PathBuf,
}

async fn start_server() -> anyhow::Result<TestApp> {
    let data_dir = std::env::temp_dir().join(format!("bank_e2e_{}", uuid::Uuid::new_v4()));
    let store = JsonFileStore::new(&data_dir).await?;
    let storage: Arc<dyn Storage> = Arc::new(CollectionStorage::new(store, Seeds::new(None, true)));
    let state = AppState::new(BankService::new(storage, AdminConfig::default()));

    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    let (stop, stopped) = oneshot::channel::<()>();
    let server = tokio::spawn(serve(listener, build_router(state), async move {
        let _ = stopped.await;
    }));
    Ok(TestApp { base_url: format!("http://{}", addr), stop: Some(stop), server, data_dir })
}

#[tokio::test]
async fn serves_over_http_and_shuts_down_gracefully() -> anyhow::Result<()> {
    let mut app = start_server().await?;
    let client = reqwest::Client::new();

    let health: Value = client.get(format!("{}/health", app.base_url)).send().await?.json().await?;
    assert_eq!(health["status"], "ok");

    // seeded demo users are visible on first access
    let res: Value = client
        .post(format!("{}/api?endpoint=login", app.base_url))
        .json(&json!({"username": "jane.doe@example.com", "password": "DemoPass1!"}))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(res["success"], true);
    assert_eq!(res["data"]["user"]["username"], "janedoe");
    assert!(res["data"]["user"].get("password").is_none());

    let res = client
        .post(format!("{}/api/checkdeposit", app.base_url))
        .json(&json!({"username": "janedoe", "amount": "250.75", "checkNumber": "1042", "image": "data:image/png;base64,AA"}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let created: Value = res.json().await?;
    let id = created["data"]["check"]["id"].as_str().unwrap_or_default().to_string();
    assert_eq!(created["data"]["check"]["amount"].as_f64(), Some(250.75));

    let listed: Value = client.get(format!("{}/api/checkdeposit", app.base_url)).send().await?.json().await?;
    assert_eq!(listed["data"]["checks"][0]["id"], id.as_str());

    let res = client.delete(format!("{}/api/checkdeposit/{}", app.base_url, id)).send().await?;
    let deleted: Value = res.json().await?;
    assert_eq!(deleted["data"]["message"], "Check deleted");

    let res = client.get(format!("{}/api/unknown", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::NOT_FOUND);

    if let Some(stop) = app.stop.take() {
        let _ = stop.send(());
    }
    (&mut app.server).await??;

    let on_disk: Value = serde_json::from_slice(&tokio::fs::read(app.data_dir.join("checkdeposits.json")).await?)?;
    assert_eq!(on_disk, json!([]));
    let _ = tokio::fs::remove_dir_all(&app.data_dir).await;
    Ok(())
}
