//! Typed error hierarchy for the garmen store and API.
//!
//! `StoreError` covers everything the persistence layer can report. The API
//! layer maps these onto HTTP status codes in one place (`api::ApiError`),
//! so handlers can use `?` throughout.

use thiserror::Error;

/// Errors from the store (SQLite persistence and reconciliation logic).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Karyawan {id} tidak ditemukan")]
    KaryawanNotFound { id: i64 },

    #[error("Produksi {id} tidak ditemukan")]
    ProduksiNotFound { id: i64 },

    #[error("Tugas {id} tidak ditemukan")]
    TugasNotFound { id: i64 },

    #[error("Catatan keuangan {id} tidak ditemukan")]
    KeuanganNotFound { id: i64 },

    #[error("Karyawan {id} masih memiliki tugas; nonaktifkan saja")]
    KaryawanMasihBertugas { id: i64 },

    #[error("Kode batch '{kode}' sudah dipakai")]
    KodeBatchDuplikat { kode: String },

    #[error("Validasi gagal: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database lock poisoned")]
    LockPoisoned,

    #[error("Database task failed: {0}")]
    Internal(String),
}

impl StoreError {
    /// True for the variants that mean "the referenced row does not exist".
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::KaryawanNotFound { .. }
                | Self::ProduksiNotFound { .. }
                | Self::TugasNotFound { .. }
                | Self::KeuanganNotFound { .. }
        )
    }
}
