use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ── Karyawan ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Karyawan {
    pub id: i64,
    pub nama: String,
    pub telepon: Option<String>,
    pub alamat: Option<String>,
    pub aktif: bool,
    pub created_at: String,
}

// ── Produksi ──────────────────────────────────────────────────────────

/// Wage scheme for a batch. `PerUnit` pays per finished unit, `Harian`
/// pays per day worked regardless of unit count.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum TipeUpah {
    PerUnit,
    Harian,
}

impl TipeUpah {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PerUnit => "per_unit",
            Self::Harian => "harian",
        }
    }
}

impl std::fmt::Display for TipeUpah {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TipeUpah {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "per_unit" => Ok(Self::PerUnit),
            "harian" => Ok(Self::Harian),
            _ => Err(format!("Invalid tipe upah: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum StatusProduksi {
    Berjalan,
    Selesai,
}

impl StatusProduksi {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Berjalan => "berjalan",
            Self::Selesai => "selesai",
        }
    }
}

impl std::fmt::Display for StatusProduksi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusProduksi {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "berjalan" => Ok(Self::Berjalan),
            "selesai" => Ok(Self::Selesai),
            _ => Err(format!("Invalid status produksi: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Produksi {
    pub id: i64,
    pub nama_produk: String,
    pub kode_batch: String,
    pub jumlah_pola: i64,
    pub tipe_upah: TipeUpah,
    /// Rupiah per unit (per_unit) or per day (harian).
    pub tarif: i64,
    pub status: StatusProduksi,
    pub keterangan: Option<String>,
    pub tanggal_mulai: String,
    pub tanggal_selesai: Option<String>,
}

// ── Tugas ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum StatusTugas {
    Berjalan,
    Selesai,
}

impl StatusTugas {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Berjalan => "berjalan",
            Self::Selesai => "selesai",
        }
    }
}

impl std::fmt::Display for StatusTugas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusTugas {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "berjalan" => Ok(Self::Berjalan),
            "selesai" => Ok(Self::Selesai),
            _ => Err(format!("Invalid status tugas: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum StatusPembayaran {
    BelumDibayar,
    Dibayar,
}

impl StatusPembayaran {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BelumDibayar => "belum_dibayar",
            Self::Dibayar => "dibayar",
        }
    }
}

impl std::fmt::Display for StatusPembayaran {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusPembayaran {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "belum_dibayar" => Ok(Self::BelumDibayar),
            "dibayar" => Ok(Self::Dibayar),
            _ => Err(format!("Invalid status pembayaran: {}", s)),
        }
    }
}

/// One employee's assignment within a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tugas {
    pub id: i64,
    pub produksi_id: i64,
    pub karyawan_id: i64,
    pub target: i64,
    pub progress: i64,
    /// Days worked; only meaningful for `harian` batches.
    pub hari_kerja: i64,
    /// Accumulated wage in rupiah, recomputed on every progress or
    /// hari_kerja change.
    pub upah: i64,
    pub status: StatusTugas,
    pub status_pembayaran: StatusPembayaran,
    pub tanggal_dibayar: Option<String>,
}

// ── Keuangan ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum JenisKeuangan {
    Pemasukan,
    Pengeluaran,
}

impl JenisKeuangan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pemasukan => "pemasukan",
            Self::Pengeluaran => "pengeluaran",
        }
    }
}

impl std::fmt::Display for JenisKeuangan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JenisKeuangan {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pemasukan" => Ok(Self::Pemasukan),
            "pengeluaran" => Ok(Self::Pengeluaran),
            _ => Err(format!("Invalid jenis keuangan: {}", s)),
        }
    }
}

/// Miscellaneous income/expense entry tied to one batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Keuangan {
    pub id: i64,
    pub produksi_id: i64,
    pub jenis: JenisKeuangan,
    pub jumlah: i64,
    pub keterangan: String,
    pub tanggal: String,
}

// ── Riwayat progress ──────────────────────────────────────────────────

/// Append-only record of one progress increment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiwayatProgress {
    pub id: i64,
    pub tugas_id: i64,
    pub jumlah: i64,
    pub progress_setelah: i64,
    pub dicatat_pada: String,
}

// ── Pembagian (work distribution request) ─────────────────────────────

/// How `jumlah_pola` units are divided across employees at batch creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Pembagian {
    /// Even split in the order given; the remainder goes to the first
    /// employees one unit each.
    Merata { karyawan_ids: Vec<i64> },
    /// Caller-specified targets; must balance to exactly `jumlah_pola`.
    Manual { rincian: Vec<TargetKaryawan> },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TargetKaryawan {
    pub karyawan_id: i64,
    pub target: i64,
}

/// Payload for creating a batch together with its work distribution.
/// Deserialized straight from the API request and applied by the store in
/// one transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProduksiBaru {
    pub nama_produk: String,
    pub kode_batch: String,
    pub jumlah_pola: i64,
    pub tipe_upah: TipeUpah,
    pub tarif: i64,
    pub keterangan: Option<String>,
    pub pembagian: Pembagian,
}

// ── API view types ────────────────────────────────────────────────────

/// Tugas joined with the employee's name, for list/detail views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TugasView {
    #[serde(flatten)]
    pub tugas: Tugas,
    pub nama_karyawan: String,
}

/// Result of one committed progress increment, with the transitions it
/// triggered. Drives both the HTTP response and the WebSocket events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgresTercatat {
    pub tugas: Tugas,
    pub tugas_selesai: bool,
    pub produksi_selesai: bool,
}

/// Result of paying all outstanding assignments of one employee.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PembayaranKaryawan {
    pub karyawan_id: i64,
    pub jumlah_tugas: i64,
    pub total_upah: i64,
}

/// Batch summary row for lists and the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProduksiRingkas {
    #[serde(flatten)]
    pub produksi: Produksi,
    pub total_target: i64,
    pub total_progress: i64,
    pub persen_selesai: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProduksiDetail {
    pub produksi: Produksi,
    pub tugas: Vec<TugasView>,
    pub keuangan: Vec<Keuangan>,
    pub total_target: i64,
    pub total_progress: i64,
    pub persen_selesai: f64,
}

/// Per-employee wage report row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaporanUpahRow {
    pub karyawan_id: i64,
    pub nama: String,
    pub jumlah_tugas: i64,
    pub tugas_selesai: i64,
    pub total_upah: i64,
    pub upah_dibayar: i64,
    pub upah_belum_dibayar: i64,
}

/// Per-batch finance report row. `saldo` is pemasukan minus pengeluaran;
/// wages are reported alongside, not folded into the saldo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaporanKeuanganRow {
    pub produksi_id: i64,
    pub nama_produk: String,
    pub kode_batch: String,
    pub total_pemasukan: i64,
    pub total_pengeluaran: i64,
    pub saldo: i64,
    pub upah_dibayar: i64,
    pub upah_belum_dibayar: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaporanKeuangan {
    pub rincian: Vec<LaporanKeuanganRow>,
    pub total_pemasukan: i64,
    pub total_pengeluaran: i64,
    pub saldo: i64,
    pub upah_dibayar: i64,
    pub upah_belum_dibayar: i64,
}

/// Recent progress entry joined with employee and product names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiwayatView {
    #[serde(flatten)]
    pub riwayat: RiwayatProgress,
    pub nama_karyawan: String,
    pub nama_produk: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
    pub produksi_berjalan: i64,
    pub produksi_selesai: i64,
    pub karyawan_aktif: i64,
    pub total_upah_belum_dibayar: i64,
    pub total_pemasukan: i64,
    pub total_pengeluaran: i64,
    pub saldo: i64,
    pub produksi: Vec<ProduksiRingkas>,
    pub riwayat_terbaru: Vec<RiwayatView>,
}

/// Completion percentage, rounded to one decimal. Zero-target batches
/// report 0 rather than dividing by zero.
pub fn persen_selesai(total_progress: i64, total_target: i64) -> f64 {
    if total_target <= 0 {
        return 0.0;
    }
    let persen = total_progress as f64 / total_target as f64 * 100.0;
    (persen * 10.0).round() / 10.0
}
