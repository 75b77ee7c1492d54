use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt, stream::SplitSink, stream::SplitStream};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::time::Instant;

use crate::api::AppState;
use crate::models::*;

/// How often to send WebSocket Ping frames.
const PING_INTERVAL: Duration = Duration::from_secs(30);

/// How long to wait for a Pong response before considering the connection dead.
const PONG_TIMEOUT: Duration = Duration::from_secs(60);

// ── WebSocket message types ──────────────────────────────────────────

/// Events pushed to connected dashboards after every committed mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum WsMessage {
    KaryawanCreated {
        karyawan: Karyawan,
    },
    KaryawanUpdated {
        karyawan: Karyawan,
    },
    KaryawanDeleted {
        karyawan_id: i64,
    },

    ProduksiCreated {
        produksi: Produksi,
    },
    ProduksiUpdated {
        produksi: Produksi,
    },
    ProduksiDeleted {
        produksi_id: i64,
    },
    /// Every assignment hit its target; the batch closed automatically.
    ProduksiSelesai {
        produksi_id: i64,
    },

    ProgressDicatat {
        tugas_id: i64,
        produksi_id: i64,
        karyawan_id: i64,
        jumlah: i64,
        progress: i64,
        target: i64,
        upah: i64,
    },
    TugasSelesai {
        tugas_id: i64,
        produksi_id: i64,
        karyawan_id: i64,
    },
    HariKerjaDiubah {
        tugas_id: i64,
        hari_kerja: i64,
        upah: i64,
    },

    PembayaranDicatat {
        tugas_id: i64,
        karyawan_id: i64,
        jumlah: i64,
    },
    PembayaranKaryawanDicatat {
        karyawan_id: i64,
        jumlah_tugas: i64,
        total_upah: i64,
    },

    KeuanganDicatat {
        keuangan: Keuangan,
    },
    KeuanganDiubah {
        keuangan: Keuangan,
    },
    KeuanganDihapus {
        keuangan_id: i64,
    },
}

// ── WebSocket handler ────────────────────────────────────────────────

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (sender, receiver) = socket.split();
    let rx = state.ws_tx.subscribe();
    run_socket_loop(sender, receiver, rx).await;
}

/// Core WebSocket loop with ping/pong keepalive.
///
/// Combines broadcast forwarding, client message receiving, and periodic
/// ping/pong health checking into a single select loop. If no Pong is
/// received within [`PONG_TIMEOUT`] after a Ping is sent, the connection
/// is considered dead and the loop exits.
async fn run_socket_loop(
    mut sender: SplitSink<WebSocket, Message>,
    mut receiver: SplitStream<WebSocket>,
    mut rx: broadcast::Receiver<String>,
) {
    let mut ping_interval = tokio::time::interval(PING_INTERVAL);
    // The first tick completes immediately; consume it so the first real
    // ping fires after PING_INTERVAL has elapsed.
    ping_interval.tick().await;

    let mut last_pong = Instant::now();
    let mut awaiting_pong = false;

    loop {
        tokio::select! {
            _ = ping_interval.tick() => {
                if awaiting_pong && last_pong.elapsed() > PONG_TIMEOUT {
                    // No pong in time; the connection is dead.
                    break;
                }
                if sender.send(Message::Ping(Bytes::new())).await.is_err() {
                    break;
                }
                awaiting_pong = true;
            }

            result = rx.recv() => {
                match result {
                    Ok(msg) => {
                        if sender.send(Message::Text(msg.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(_)) => {
                        // Missed some messages; continue receiving.
                        continue;
                    }
                }
            }

            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Pong(_))) => {
                        last_pong = Instant::now();
                        awaiting_pong = false;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {
                        // Ignore other client messages (Text, Binary, Ping).
                    }
                    Some(Err(_)) => break,
                }
            }
        }
    }

    let _ = sender.send(Message::Close(None)).await;
}

// ── Broadcast helper ─────────────────────────────────────────────────

/// Serialize and broadcast a WsMessage to all connected clients.
/// Returns silently even if no clients are connected.
pub fn broadcast_message(tx: &broadcast::Sender<String>, msg: &WsMessage) {
    match serde_json::to_string(msg) {
        Ok(json) => {
            let _ = tx.send(json); // Ignore error if no receivers
        }
        Err(e) => {
            tracing::warn!("failed to serialize WsMessage: {}", e);
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn karyawan_created_serialization() {
        let karyawan = Karyawan {
            id: 1,
            nama: "Siti".to_string(),
            telepon: Some("0812".to_string()),
            alamat: None,
            aktif: true,
            created_at: "2026-08-01".to_string(),
        };
        let msg = WsMessage::KaryawanCreated { karyawan };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"KaryawanCreated\""));
        assert!(json.contains("\"data\""));
        assert!(json.contains("\"nama\":\"Siti\""));
    }

    #[test]
    fn progress_dicatat_serialization() {
        let msg = WsMessage::ProgressDicatat {
            tugas_id: 3,
            produksi_id: 1,
            karyawan_id: 2,
            jumlah: 10,
            progress: 25,
            target: 50,
            upah: 125_000,
        };
        let json = serde_json::to_string(&msg).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["type"], "ProgressDicatat");
        assert_eq!(parsed["data"]["jumlah"], 10);
        assert_eq!(parsed["data"]["upah"], 125_000);
    }

    #[test]
    fn produksi_selesai_roundtrip() {
        let msg = WsMessage::ProduksiSelesai { produksi_id: 7 };
        let json = serde_json::to_string(&msg).unwrap();
        let deser: WsMessage = serde_json::from_str(&json).unwrap();
        match deser {
            WsMessage::ProduksiSelesai { produksi_id } => assert_eq!(produksi_id, 7),
            _ => panic!("Expected ProduksiSelesai"),
        }
    }

    #[test]
    fn pembayaran_karyawan_serialization() {
        let msg = WsMessage::PembayaranKaryawanDicatat {
            karyawan_id: 4,
            jumlah_tugas: 2,
            total_upah: 190_000,
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"PembayaranKaryawanDicatat\""));
        assert!(json.contains("\"total_upah\":190000"));
    }

    #[test]
    fn keuangan_dicatat_carries_entry() {
        let msg = WsMessage::KeuanganDicatat {
            keuangan: Keuangan {
                id: 9,
                produksi_id: 1,
                jenis: JenisKeuangan::Pengeluaran,
                jumlah: 150_000,
                keterangan: "benang".to_string(),
                tanggal: "2026-08-02".to_string(),
            },
        };
        let json = serde_json::to_string(&msg).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["data"]["keuangan"]["jenis"], "pengeluaran");
        assert_eq!(parsed["data"]["keuangan"]["jumlah"], 150_000);
    }

    #[tokio::test]
    async fn broadcast_delivers_to_all_subscribers() {
        let (tx, _) = tokio::sync::broadcast::channel::<String>(16);
        let mut rx1 = tx.subscribe();
        let mut rx2 = tx.subscribe();

        broadcast_message(&tx, &WsMessage::KaryawanDeleted { karyawan_id: 1 });

        let received1 = rx1.recv().await.unwrap();
        let received2 = rx2.recv().await.unwrap();
        assert!(received1.contains("KaryawanDeleted"));
        assert_eq!(received1, received2);
    }

    #[tokio::test]
    async fn broadcast_without_receivers_does_not_panic() {
        let (tx, _) = tokio::sync::broadcast::channel::<String>(16);
        broadcast_message(&tx, &WsMessage::ProduksiDeleted { produksi_id: 1 });
    }

    #[test]
    fn keepalive_constants() {
        // PONG_TIMEOUT must exceed PING_INTERVAL so a fresh connection is
        // not immediately considered dead.
        assert!(PONG_TIMEOUT > PING_INTERVAL);
    }
}
