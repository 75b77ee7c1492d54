use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use serde::Deserialize;
use tokio::sync::broadcast;
use tracing::info;

use crate::db::DbHandle;
use crate::errors::StoreError;
use crate::models::*;
use crate::ws::{WsMessage, broadcast_message};

// ── Shared application state ──────────────────────────────────────────

pub struct AppState {
    pub db: DbHandle,
    pub ws_tx: broadcast::Sender<String>,
}

pub type SharedState = Arc<AppState>;

// ── Request payload types ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateKaryawanRequest {
    pub nama: String,
    pub telepon: Option<String>,
    pub alamat: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateKaryawanRequest {
    pub nama: Option<String>,
    pub telepon: Option<String>,
    pub alamat: Option<String>,
    pub aktif: Option<bool>,
}

#[derive(Deserialize)]
pub struct UpdateProduksiRequest {
    pub nama_produk: Option<String>,
    pub keterangan: Option<String>,
    pub tarif: Option<i64>,
}

#[derive(Deserialize)]
pub struct CatatProgressRequest {
    pub jumlah: i64,
}

#[derive(Deserialize)]
pub struct UbahHariKerjaRequest {
    pub hari: i64,
}

#[derive(Deserialize)]
pub struct CreateKeuanganRequest {
    pub jenis: JenisKeuangan,
    pub jumlah: i64,
    pub keterangan: Option<String>,
    pub tanggal: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateKeuanganRequest {
    pub jenis: Option<JenisKeuangan>,
    pub jumlah: Option<i64>,
    pub keterangan: Option<String>,
    pub tanggal: Option<String>,
}

// ── Error handling ────────────────────────────────────────────────────

pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(serde_json::json!({"error": message}))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        if err.is_not_found() {
            return ApiError::NotFound(err.to_string());
        }
        match err {
            StoreError::Validation(_)
            | StoreError::KaryawanMasihBertugas { .. }
            | StoreError::KodeBatchDuplikat { .. } => ApiError::BadRequest(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

// ── Router ────────────────────────────────────────────────────────────

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/api/karyawan", get(list_karyawan).post(create_karyawan))
        .route(
            "/api/karyawan/{id}",
            get(get_karyawan).patch(update_karyawan).delete(delete_karyawan),
        )
        .route("/api/karyawan/{id}/bayar", post(bayar_karyawan))
        .route("/api/produksi", get(list_produksi).post(create_produksi))
        .route(
            "/api/produksi/{id}",
            get(get_produksi).patch(update_produksi).delete(delete_produksi),
        )
        .route(
            "/api/produksi/{id}/keuangan",
            get(list_keuangan).post(create_keuangan),
        )
        .route("/api/tugas/{id}/progress", post(catat_progress))
        .route("/api/tugas/{id}/riwayat", get(list_riwayat_tugas))
        .route("/api/tugas/{id}/hari-kerja", patch(ubah_hari_kerja))
        .route("/api/tugas/{id}/bayar", post(bayar_tugas))
        .route(
            "/api/keuangan/{id}",
            patch(update_keuangan).delete(delete_keuangan),
        )
        .route("/api/dashboard", get(get_dashboard))
        .route("/api/laporan/upah", get(laporan_upah))
        .route("/api/laporan/keuangan", get(laporan_keuangan))
        .route("/health", get(health_check))
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn health_check() -> &'static str {
    "ok"
}

// Karyawan

async fn list_karyawan(State(state): State<SharedState>) -> Result<impl IntoResponse, ApiError> {
    let karyawan = state.db.call(|db| db.list_karyawan()).await?;
    Ok(Json(karyawan))
}

async fn create_karyawan(
    State(state): State<SharedState>,
    Json(req): Json<CreateKaryawanRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let karyawan = state
        .db
        .call(move |db| {
            db.create_karyawan(&req.nama, req.telepon.as_deref(), req.alamat.as_deref())
        })
        .await?;
    info!(id = karyawan.id, nama = %karyawan.nama, "karyawan dibuat");
    broadcast_message(&state.ws_tx, &WsMessage::KaryawanCreated { karyawan: karyawan.clone() });
    Ok((StatusCode::CREATED, Json(karyawan)))
}

async fn get_karyawan(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let karyawan = state
        .db
        .call(move |db| db.get_karyawan(id))
        .await?
        .ok_or(StoreError::KaryawanNotFound { id })?;
    Ok(Json(karyawan))
}

async fn update_karyawan(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateKaryawanRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let karyawan = state
        .db
        .call(move |db| {
            db.update_karyawan(
                id,
                req.nama.as_deref(),
                req.telepon.as_deref(),
                req.alamat.as_deref(),
                req.aktif,
            )
        })
        .await?;
    broadcast_message(&state.ws_tx, &WsMessage::KaryawanUpdated { karyawan: karyawan.clone() });
    Ok(Json(karyawan))
}

async fn delete_karyawan(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.db.call(move |db| db.delete_karyawan(id)).await?;
    info!(id, "karyawan dihapus");
    broadcast_message(&state.ws_tx, &WsMessage::KaryawanDeleted { karyawan_id: id });
    Ok(StatusCode::NO_CONTENT)
}

async fn bayar_karyawan(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let pembayaran = state.db.call(move |db| db.bayar_karyawan(id)).await?;
    info!(
        karyawan_id = id,
        jumlah_tugas = pembayaran.jumlah_tugas,
        total_upah = pembayaran.total_upah,
        "upah karyawan dibayar"
    );
    broadcast_message(
        &state.ws_tx,
        &WsMessage::PembayaranKaryawanDicatat {
            karyawan_id: pembayaran.karyawan_id,
            jumlah_tugas: pembayaran.jumlah_tugas,
            total_upah: pembayaran.total_upah,
        },
    );
    Ok(Json(pembayaran))
}

// Produksi

async fn list_produksi(State(state): State<SharedState>) -> Result<impl IntoResponse, ApiError> {
    let produksi = state.db.call(|db| db.list_produksi()).await?;
    Ok(Json(produksi))
}

async fn create_produksi(
    State(state): State<SharedState>,
    Json(baru): Json<ProduksiBaru>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = state.db.call(move |db| db.create_produksi(baru)).await?;
    info!(
        id = detail.produksi.id,
        kode_batch = %detail.produksi.kode_batch,
        jumlah_pola = detail.produksi.jumlah_pola,
        karyawan = detail.tugas.len(),
        "produksi dibuat"
    );
    broadcast_message(
        &state.ws_tx,
        &WsMessage::ProduksiCreated { produksi: detail.produksi.clone() },
    );
    Ok((StatusCode::CREATED, Json(detail)))
}

async fn get_produksi(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = state
        .db
        .call(move |db| db.get_produksi_detail(id))
        .await?
        .ok_or(StoreError::ProduksiNotFound { id })?;
    Ok(Json(detail))
}

async fn update_produksi(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateProduksiRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let produksi = state
        .db
        .call(move |db| {
            db.update_produksi(
                id,
                req.nama_produk.as_deref(),
                req.keterangan.as_deref(),
                req.tarif,
            )
        })
        .await?;
    broadcast_message(&state.ws_tx, &WsMessage::ProduksiUpdated { produksi: produksi.clone() });
    Ok(Json(produksi))
}

async fn delete_produksi(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.db.call(move |db| db.delete_produksi(id)).await?;
    info!(id, "produksi dihapus");
    broadcast_message(&state.ws_tx, &WsMessage::ProduksiDeleted { produksi_id: id });
    Ok(StatusCode::NO_CONTENT)
}

// Tugas & progres

async fn catat_progress(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(req): Json<CatatProgressRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let jumlah = req.jumlah;
    let hasil = state.db.call(move |db| db.catat_progress(id, jumlah)).await?;
    info!(
        tugas_id = id,
        jumlah,
        progress = hasil.tugas.progress,
        target = hasil.tugas.target,
        "progress dicatat"
    );

    broadcast_message(
        &state.ws_tx,
        &WsMessage::ProgressDicatat {
            tugas_id: hasil.tugas.id,
            produksi_id: hasil.tugas.produksi_id,
            karyawan_id: hasil.tugas.karyawan_id,
            jumlah,
            progress: hasil.tugas.progress,
            target: hasil.tugas.target,
            upah: hasil.tugas.upah,
        },
    );
    if hasil.tugas_selesai {
        broadcast_message(
            &state.ws_tx,
            &WsMessage::TugasSelesai {
                tugas_id: hasil.tugas.id,
                produksi_id: hasil.tugas.produksi_id,
                karyawan_id: hasil.tugas.karyawan_id,
            },
        );
    }
    if hasil.produksi_selesai {
        info!(produksi_id = hasil.tugas.produksi_id, "produksi selesai");
        broadcast_message(
            &state.ws_tx,
            &WsMessage::ProduksiSelesai { produksi_id: hasil.tugas.produksi_id },
        );
    }
    Ok(Json(hasil))
}

async fn list_riwayat_tugas(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let riwayat = state
        .db
        .call(move |db| {
            if db.get_tugas(id)?.is_none() {
                return Err(StoreError::TugasNotFound { id });
            }
            db.list_riwayat_tugas(id)
        })
        .await?;
    Ok(Json(riwayat))
}

async fn ubah_hari_kerja(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(req): Json<UbahHariKerjaRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let hari = req.hari;
    let tugas = state.db.call(move |db| db.ubah_hari_kerja(id, hari)).await?;
    broadcast_message(
        &state.ws_tx,
        &WsMessage::HariKerjaDiubah {
            tugas_id: tugas.id,
            hari_kerja: tugas.hari_kerja,
            upah: tugas.upah,
        },
    );
    Ok(Json(tugas))
}

async fn bayar_tugas(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let (tugas, sudah_dibayar) = state.db.call(move |db| db.bayar_tugas(id)).await?;
    if !sudah_dibayar {
        info!(tugas_id = id, upah = tugas.upah, "upah tugas dibayar");
        broadcast_message(
            &state.ws_tx,
            &WsMessage::PembayaranDicatat {
                tugas_id: tugas.id,
                karyawan_id: tugas.karyawan_id,
                jumlah: tugas.upah,
            },
        );
    }
    Ok(Json(serde_json::json!({
        "tugas": tugas,
        "sudah_dibayar_sebelumnya": sudah_dibayar,
    })))
}

// Keuangan

async fn list_keuangan(
    State(state): State<SharedState>,
    Path(produksi_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let keuangan = state
        .db
        .call(move |db| {
            if db.get_produksi(produksi_id)?.is_none() {
                return Err(StoreError::ProduksiNotFound { id: produksi_id });
            }
            db.list_keuangan(produksi_id)
        })
        .await?;
    Ok(Json(keuangan))
}

async fn create_keuangan(
    State(state): State<SharedState>,
    Path(produksi_id): Path<i64>,
    Json(req): Json<CreateKeuanganRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let keuangan = state
        .db
        .call(move |db| {
            db.create_keuangan(
                produksi_id,
                req.jenis,
                req.jumlah,
                req.keterangan.as_deref().unwrap_or(""),
                req.tanggal.as_deref(),
            )
        })
        .await?;
    info!(
        produksi_id,
        jenis = %keuangan.jenis,
        jumlah = keuangan.jumlah,
        "catatan keuangan dibuat"
    );
    broadcast_message(&state.ws_tx, &WsMessage::KeuanganDicatat { keuangan: keuangan.clone() });
    Ok((StatusCode::CREATED, Json(keuangan)))
}

async fn update_keuangan(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateKeuanganRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let keuangan = state
        .db
        .call(move |db| {
            db.update_keuangan(
                id,
                req.jenis,
                req.jumlah,
                req.keterangan.as_deref(),
                req.tanggal.as_deref(),
            )
        })
        .await?;
    broadcast_message(&state.ws_tx, &WsMessage::KeuanganDiubah { keuangan: keuangan.clone() });
    Ok(Json(keuangan))
}

async fn delete_keuangan(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.db.call(move |db| db.delete_keuangan(id)).await?;
    broadcast_message(&state.ws_tx, &WsMessage::KeuanganDihapus { keuangan_id: id });
    Ok(StatusCode::NO_CONTENT)
}

// Laporan & dashboard

async fn get_dashboard(State(state): State<SharedState>) -> Result<impl IntoResponse, ApiError> {
    let dashboard = state.db.call(|db| db.get_dashboard()).await?;
    Ok(Json(dashboard))
}

async fn laporan_upah(State(state): State<SharedState>) -> Result<impl IntoResponse, ApiError> {
    let laporan = state.db.call(|db| db.laporan_upah()).await?;
    Ok(Json(laporan))
}

async fn laporan_keuangan(State(state): State<SharedState>) -> Result<impl IntoResponse, ApiError> {
    let laporan = state.db.call(|db| db.laporan_keuangan()).await?;
    Ok(Json(laporan))
}

// ── Tests ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Store;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_router() -> Router {
        let db = DbHandle::new(Store::new_in_memory().unwrap());
        let (ws_tx, _) = broadcast::channel(16);
        let state = Arc::new(AppState { db, ws_tx });
        api_router().with_state(state)
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let resp = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    /// Seed one employee through the API and return their id.
    async fn seed_karyawan(app: &Router, nama: &str) -> i64 {
        let (status, json) = send(
            app,
            "POST",
            "/api/karyawan",
            Some(serde_json::json!({"nama": nama})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        json["id"].as_i64().unwrap()
    }

    #[tokio::test]
    async fn health_endpoint_responds() {
        let app = test_router();
        let resp = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn karyawan_crud_over_http() {
        let app = test_router();
        let id = seed_karyawan(&app, "Siti").await;

        let (status, json) = send(&app, "GET", &format!("/api/karyawan/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["nama"], "Siti");
        assert_eq!(json["aktif"], true);

        let (status, json) = send(
            &app,
            "PATCH",
            &format!("/api/karyawan/{}", id),
            Some(serde_json::json!({"telepon": "0812", "aktif": false})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["telepon"], "0812");
        assert_eq!(json["aktif"], false);

        let (status, _) = send(&app, "DELETE", &format!("/api/karyawan/{}", id), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, json) = send(&app, "GET", &format!("/api/karyawan/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(json["error"].as_str().unwrap().contains("tidak ditemukan"));
    }

    #[tokio::test]
    async fn create_produksi_with_even_distribution() {
        let app = test_router();
        let siti = seed_karyawan(&app, "Siti").await;
        let rina = seed_karyawan(&app, "Rina").await;

        let (status, json) = send(
            &app,
            "POST",
            "/api/produksi",
            Some(serde_json::json!({
                "nama_produk": "Kemeja Batik",
                "kode_batch": "KB-01",
                "jumlah_pola": 101,
                "tipe_upah": "per_unit",
                "tarif": 5000,
                "keterangan": null,
                "pembagian": {"mode": "merata", "karyawan_ids": [siti, rina]},
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["produksi"]["status"], "berjalan");
        assert_eq!(json["total_target"], 101);
        // Remainder unit lands on the first employee.
        assert_eq!(json["tugas"][0]["target"], 51);
        assert_eq!(json["tugas"][1]["target"], 50);
        assert_eq!(json["tugas"][0]["nama_karyawan"], "Siti");
    }

    #[tokio::test]
    async fn unbalanced_manual_distribution_is_rejected() {
        let app = test_router();
        let siti = seed_karyawan(&app, "Siti").await;

        let (status, json) = send(
            &app,
            "POST",
            "/api/produksi",
            Some(serde_json::json!({
                "nama_produk": "Gamis",
                "kode_batch": "GM-01",
                "jumlah_pola": 50,
                "tipe_upah": "per_unit",
                "tarif": 4000,
                "keterangan": null,
                "pembagian": {"mode": "manual", "rincian": [
                    {"karyawan_id": siti, "target": 30}
                ]},
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("jumlah pola"));
    }

    #[tokio::test]
    async fn progress_flow_completes_batch() {
        let app = test_router();
        let siti = seed_karyawan(&app, "Siti").await;

        let (_, produksi) = send(
            &app,
            "POST",
            "/api/produksi",
            Some(serde_json::json!({
                "nama_produk": "Daster",
                "kode_batch": "DS-01",
                "jumlah_pola": 20,
                "tipe_upah": "per_unit",
                "tarif": 2000,
                "keterangan": null,
                "pembagian": {"mode": "merata", "karyawan_ids": [siti]},
            })),
        )
        .await;
        let produksi_id = produksi["produksi"]["id"].as_i64().unwrap();
        let tugas_id = produksi["tugas"][0]["id"].as_i64().unwrap();

        let (status, json) = send(
            &app,
            "POST",
            &format!("/api/tugas/{}/progress", tugas_id),
            Some(serde_json::json!({"jumlah": 15})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["tugas"]["progress"], 15);
        assert_eq!(json["tugas"]["upah"], 30_000);
        assert_eq!(json["tugas_selesai"], false);

        // Over-target increments are rejected without side effects.
        let (status, _) = send(
            &app,
            "POST",
            &format!("/api/tugas/{}/progress", tugas_id),
            Some(serde_json::json!({"jumlah": 10})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, json) = send(
            &app,
            "POST",
            &format!("/api/tugas/{}/progress", tugas_id),
            Some(serde_json::json!({"jumlah": 5})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["tugas_selesai"], true);
        assert_eq!(json["produksi_selesai"], true);

        let (_, detail) = send(&app, "GET", &format!("/api/produksi/{}", produksi_id), None).await;
        assert_eq!(detail["produksi"]["status"], "selesai");
        assert_eq!(detail["persen_selesai"], 100.0);

        // The rejected increment left no trace in the history.
        let (status, riwayat) =
            send(&app, "GET", &format!("/api/tugas/{}/riwayat", tugas_id), None).await;
        assert_eq!(status, StatusCode::OK);
        let riwayat = riwayat.as_array().unwrap();
        assert_eq!(riwayat.len(), 2);
        assert_eq!(riwayat[0]["jumlah"], 15);
        assert_eq!(riwayat[1]["jumlah"], 5);
    }

    #[tokio::test]
    async fn payment_endpoints_track_status() {
        let app = test_router();
        let siti = seed_karyawan(&app, "Siti").await;
        let (_, produksi) = send(
            &app,
            "POST",
            "/api/produksi",
            Some(serde_json::json!({
                "nama_produk": "Rok",
                "kode_batch": "RK-01",
                "jumlah_pola": 10,
                "tipe_upah": "per_unit",
                "tarif": 3000,
                "keterangan": null,
                "pembagian": {"mode": "merata", "karyawan_ids": [siti]},
            })),
        )
        .await;
        let tugas_id = produksi["tugas"][0]["id"].as_i64().unwrap();
        send(
            &app,
            "POST",
            &format!("/api/tugas/{}/progress", tugas_id),
            Some(serde_json::json!({"jumlah": 10})),
        )
        .await;

        let (status, json) = send(&app, "POST", &format!("/api/tugas/{}/bayar", tugas_id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["sudah_dibayar_sebelumnya"], false);
        assert_eq!(json["tugas"]["status_pembayaran"], "dibayar");

        let (_, json) = send(&app, "POST", &format!("/api/tugas/{}/bayar", tugas_id), None).await;
        assert_eq!(json["sudah_dibayar_sebelumnya"], true);

        let (status, json) = send(&app, "POST", &format!("/api/karyawan/{}/bayar", siti), None).await;
        assert_eq!(status, StatusCode::OK);
        // Everything was already settled per-tugas.
        assert_eq!(json["jumlah_tugas"], 0);
        assert_eq!(json["total_upah"], 0);
    }

    #[tokio::test]
    async fn keuangan_endpoints_and_laporan() {
        let app = test_router();
        let siti = seed_karyawan(&app, "Siti").await;
        let (_, produksi) = send(
            &app,
            "POST",
            "/api/produksi",
            Some(serde_json::json!({
                "nama_produk": "Seragam",
                "kode_batch": "SG-01",
                "jumlah_pola": 10,
                "tipe_upah": "per_unit",
                "tarif": 3000,
                "keterangan": null,
                "pembagian": {"mode": "merata", "karyawan_ids": [siti]},
            })),
        )
        .await;
        let produksi_id = produksi["produksi"]["id"].as_i64().unwrap();

        let (status, masuk) = send(
            &app,
            "POST",
            &format!("/api/produksi/{}/keuangan", produksi_id),
            Some(serde_json::json!({"jenis": "pemasukan", "jumlah": 400000, "keterangan": "DP"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        send(
            &app,
            "POST",
            &format!("/api/produksi/{}/keuangan", produksi_id),
            Some(serde_json::json!({"jenis": "pengeluaran", "jumlah": 100000, "keterangan": "kain"})),
        )
        .await;

        let (status, json) = send(&app, "GET", "/api/laporan/keuangan", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["total_pemasukan"], 400_000);
        assert_eq!(json["total_pengeluaran"], 100_000);
        assert_eq!(json["saldo"], 300_000);

        let keuangan_id = masuk["id"].as_i64().unwrap();
        let (status, _) = send(&app, "DELETE", &format!("/api/keuangan/{}", keuangan_id), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, "DELETE", &format!("/api/keuangan/{}", keuangan_id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn dashboard_and_laporan_upah_respond() {
        let app = test_router();
        seed_karyawan(&app, "Siti").await;

        let (status, json) = send(&app, "GET", "/api/dashboard", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["karyawan_aktif"], 1);
        assert_eq!(json["produksi_berjalan"], 0);

        let (status, json) = send(&app, "GET", "/api/laporan/upah", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json.as_array().unwrap().len(), 1);
        assert_eq!(json[0]["nama"], "Siti");
        assert_eq!(json[0]["jumlah_tugas"], 0);
    }

    #[tokio::test]
    async fn unknown_ids_return_not_found() {
        let app = test_router();
        let (status, _) = send(&app, "GET", "/api/produksi/999", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(
            &app,
            "POST",
            "/api/tugas/999/progress",
            Some(serde_json::json!({"jumlah": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, "POST", "/api/karyawan/999/bayar", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
