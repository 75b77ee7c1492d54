use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use rusqlite::{Connection, params};

use crate::errors::StoreError;
use crate::models::*;
use crate::pembagian::rencana_pembagian;

/// Async-safe handle to the garmen database.
///
/// Wraps `Store` behind `Arc<Mutex>` and runs all access on tokio's
/// blocking thread pool via `spawn_blocking`, preventing synchronous SQLite
/// I/O from tying up async worker threads.
#[derive(Clone)]
pub struct DbHandle {
    inner: Arc<std::sync::Mutex<Store>>,
}

impl DbHandle {
    pub fn new(store: Store) -> Self {
        Self {
            inner: Arc::new(std::sync::Mutex::new(store)),
        }
    }

    /// Run a closure with access to the database on a blocking thread.
    /// All data passed into `f` must be owned (`'static`).
    pub async fn call<F, R>(&self, f: F) -> Result<R, StoreError>
    where
        F: FnOnce(&Store) -> Result<R, StoreError> + Send + 'static,
        R: Send + 'static,
    {
        let store = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let guard = store.lock().map_err(|_| StoreError::LockPoisoned)?;
            f(&guard)
        })
        .await
        .map_err(|e| StoreError::Internal(e.to_string()))?
    }
}

pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (or create) a SQLite database at the given path and run migrations.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init()?;
        Ok(store)
    }

    /// Create an in-memory SQLite database (for testing).
    pub fn new_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init()?;
        Ok(store)
    }

    fn init(&self) -> Result<(), StoreError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.run_migrations()?;
        Ok(())
    }

    fn run_migrations(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS karyawan (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                nama TEXT NOT NULL,
                telepon TEXT,
                alamat TEXT,
                aktif INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS produksi (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                nama_produk TEXT NOT NULL,
                kode_batch TEXT NOT NULL UNIQUE,
                jumlah_pola INTEGER NOT NULL,
                tipe_upah TEXT NOT NULL,
                tarif INTEGER NOT NULL,
                status TEXT NOT NULL DEFAULT 'berjalan',
                keterangan TEXT,
                tanggal_mulai TEXT NOT NULL DEFAULT (datetime('now')),
                tanggal_selesai TEXT
            );

            CREATE TABLE IF NOT EXISTS tugas (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                produksi_id INTEGER NOT NULL REFERENCES produksi(id) ON DELETE CASCADE,
                karyawan_id INTEGER NOT NULL REFERENCES karyawan(id),
                target INTEGER NOT NULL,
                progress INTEGER NOT NULL DEFAULT 0,
                hari_kerja INTEGER NOT NULL DEFAULT 0,
                upah INTEGER NOT NULL DEFAULT 0,
                status TEXT NOT NULL DEFAULT 'berjalan',
                status_pembayaran TEXT NOT NULL DEFAULT 'belum_dibayar',
                tanggal_dibayar TEXT,
                UNIQUE(produksi_id, karyawan_id)
            );

            CREATE TABLE IF NOT EXISTS keuangan (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                produksi_id INTEGER NOT NULL REFERENCES produksi(id) ON DELETE CASCADE,
                jenis TEXT NOT NULL,
                jumlah INTEGER NOT NULL,
                keterangan TEXT NOT NULL DEFAULT '',
                tanggal TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS riwayat_progress (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                tugas_id INTEGER NOT NULL REFERENCES tugas(id) ON DELETE CASCADE,
                jumlah INTEGER NOT NULL,
                progress_setelah INTEGER NOT NULL,
                dicatat_pada TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX IF NOT EXISTS idx_tugas_produksi ON tugas(produksi_id);
            CREATE INDEX IF NOT EXISTS idx_tugas_karyawan ON tugas(karyawan_id);
            CREATE INDEX IF NOT EXISTS idx_keuangan_produksi ON keuangan(produksi_id);
            CREATE INDEX IF NOT EXISTS idx_riwayat_tugas ON riwayat_progress(tugas_id);
            ",
        )?;
        Ok(())
    }

    // ── Karyawan CRUD ─────────────────────────────────────────────────

    pub fn create_karyawan(
        &self,
        nama: &str,
        telepon: Option<&str>,
        alamat: Option<&str>,
    ) -> Result<Karyawan, StoreError> {
        if nama.trim().is_empty() {
            return Err(StoreError::Validation("nama karyawan tidak boleh kosong".into()));
        }
        self.conn.execute(
            "INSERT INTO karyawan (nama, telepon, alamat) VALUES (?1, ?2, ?3)",
            params![nama.trim(), telepon, alamat],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_karyawan(id)?
            .ok_or(StoreError::KaryawanNotFound { id })
    }

    pub fn list_karyawan(&self) -> Result<Vec<Karyawan>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, nama, telepon, alamat, aktif, created_at FROM karyawan ORDER BY nama",
        )?;
        let rows = stmt.query_map([], karyawan_from_row)?;
        let mut karyawan = Vec::new();
        for row in rows {
            karyawan.push(row?);
        }
        Ok(karyawan)
    }

    pub fn get_karyawan(&self, id: i64) -> Result<Option<Karyawan>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, nama, telepon, alamat, aktif, created_at FROM karyawan WHERE id = ?1",
        )?;
        let mut rows = stmt.query_map(params![id], karyawan_from_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    pub fn update_karyawan(
        &self,
        id: i64,
        nama: Option<&str>,
        telepon: Option<&str>,
        alamat: Option<&str>,
        aktif: Option<bool>,
    ) -> Result<Karyawan, StoreError> {
        if self.get_karyawan(id)?.is_none() {
            return Err(StoreError::KaryawanNotFound { id });
        }
        if let Some(n) = nama {
            if n.trim().is_empty() {
                return Err(StoreError::Validation("nama karyawan tidak boleh kosong".into()));
            }
        }

        // unchecked_transaction so all field updates land atomically.
        // Safety: DbHandle's Mutex already guarantees single-threaded access.
        let tx = self.conn.unchecked_transaction()?;
        if let Some(n) = nama {
            tx.execute("UPDATE karyawan SET nama = ?1 WHERE id = ?2", params![n.trim(), id])?;
        }
        if let Some(t) = telepon {
            tx.execute("UPDATE karyawan SET telepon = ?1 WHERE id = ?2", params![t, id])?;
        }
        if let Some(a) = alamat {
            tx.execute("UPDATE karyawan SET alamat = ?1 WHERE id = ?2", params![a, id])?;
        }
        if let Some(f) = aktif {
            tx.execute(
                "UPDATE karyawan SET aktif = ?1 WHERE id = ?2",
                params![f as i64, id],
            )?;
        }
        tx.commit()?;

        self.get_karyawan(id)?
            .ok_or(StoreError::KaryawanNotFound { id })
    }

    /// Delete an employee. Rejected while any tugas rows reference them;
    /// the caller should deactivate instead.
    pub fn delete_karyawan(&self, id: i64) -> Result<(), StoreError> {
        if self.get_karyawan(id)?.is_none() {
            return Err(StoreError::KaryawanNotFound { id });
        }
        let tugas_count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM tugas WHERE karyawan_id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        if tugas_count > 0 {
            return Err(StoreError::KaryawanMasihBertugas { id });
        }
        self.conn
            .execute("DELETE FROM karyawan WHERE id = ?1", params![id])?;
        Ok(())
    }

    // ── Produksi CRUD ─────────────────────────────────────────────────

    /// Create a batch and its tugas rows in one transaction, distributing
    /// `jumlah_pola` units across the chosen employees.
    pub fn create_produksi(&self, baru: ProduksiBaru) -> Result<ProduksiDetail, StoreError> {
        if baru.nama_produk.trim().is_empty() {
            return Err(StoreError::Validation("nama produk tidak boleh kosong".into()));
        }
        if baru.kode_batch.trim().is_empty() {
            return Err(StoreError::Validation("kode batch tidak boleh kosong".into()));
        }
        if baru.tarif <= 0 {
            return Err(StoreError::Validation("tarif harus lebih dari nol".into()));
        }

        let rencana = rencana_pembagian(baru.jumlah_pola, &baru.pembagian)?;

        let kode = baru.kode_batch.trim();
        let sudah_ada: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM produksi WHERE kode_batch = ?1",
            params![kode],
            |row| row.get(0),
        )?;
        if sudah_ada > 0 {
            return Err(StoreError::KodeBatchDuplikat { kode: kode.to_string() });
        }

        // Every referenced employee must exist and be active.
        for (karyawan_id, _) in &rencana {
            match self.get_karyawan(*karyawan_id)? {
                None => return Err(StoreError::KaryawanNotFound { id: *karyawan_id }),
                Some(k) if !k.aktif => {
                    return Err(StoreError::Validation(format!(
                        "karyawan {} ({}) sudah nonaktif",
                        k.id, k.nama
                    )));
                }
                Some(_) => {}
            }
        }

        // Safety: DbHandle's Mutex already guarantees single-threaded access.
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO produksi (nama_produk, kode_batch, jumlah_pola, tipe_upah, tarif, keterangan)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                baru.nama_produk.trim(),
                kode,
                baru.jumlah_pola,
                baru.tipe_upah.as_str(),
                baru.tarif,
                baru.keterangan,
            ],
        )?;
        let produksi_id = tx.last_insert_rowid();
        for (karyawan_id, target) in &rencana {
            tx.execute(
                "INSERT INTO tugas (produksi_id, karyawan_id, target) VALUES (?1, ?2, ?3)",
                params![produksi_id, karyawan_id, target],
            )?;
        }
        tx.commit()?;

        self.get_produksi_detail(produksi_id)?
            .ok_or(StoreError::ProduksiNotFound { id: produksi_id })
    }

    pub fn list_produksi(&self) -> Result<Vec<ProduksiRingkas>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT p.id, p.nama_produk, p.kode_batch, p.jumlah_pola, p.tipe_upah, p.tarif,
                    p.status, p.keterangan, p.tanggal_mulai, p.tanggal_selesai,
                    COALESCE(SUM(t.target), 0), COALESCE(SUM(t.progress), 0)
             FROM produksi p
             LEFT JOIN tugas t ON t.produksi_id = p.id
             GROUP BY p.id
             ORDER BY p.id DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((produksi_row(row)?, row.get::<_, i64>(10)?, row.get::<_, i64>(11)?))
        })?;
        let mut hasil = Vec::new();
        for row in rows {
            let (praw, total_target, total_progress) = row?;
            hasil.push(ProduksiRingkas {
                produksi: praw.into_produksi()?,
                total_target,
                total_progress,
                persen_selesai: persen_selesai(total_progress, total_target),
            });
        }
        Ok(hasil)
    }

    pub fn get_produksi(&self, id: i64) -> Result<Option<Produksi>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, nama_produk, kode_batch, jumlah_pola, tipe_upah, tarif,
                    status, keterangan, tanggal_mulai, tanggal_selesai
             FROM produksi WHERE id = ?1",
        )?;
        let mut rows = stmt.query_map(params![id], produksi_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?.into_produksi()?)),
            None => Ok(None),
        }
    }

    pub fn get_produksi_detail(&self, id: i64) -> Result<Option<ProduksiDetail>, StoreError> {
        let produksi = match self.get_produksi(id)? {
            Some(p) => p,
            None => return Ok(None),
        };
        let tugas = self.list_tugas_produksi(id)?;
        let keuangan = self.list_keuangan(id)?;
        let total_target: i64 = tugas.iter().map(|t| t.tugas.target).sum();
        let total_progress: i64 = tugas.iter().map(|t| t.tugas.progress).sum();
        Ok(Some(ProduksiDetail {
            produksi,
            tugas,
            keuangan,
            total_target,
            total_progress,
            persen_selesai: persen_selesai(total_progress, total_target),
        }))
    }

    /// Update batch fields. Changing the tarif recomputes every assignment's
    /// wage in the same transaction so totals never go stale.
    pub fn update_produksi(
        &self,
        id: i64,
        nama_produk: Option<&str>,
        keterangan: Option<&str>,
        tarif: Option<i64>,
    ) -> Result<Produksi, StoreError> {
        let produksi = self
            .get_produksi(id)?
            .ok_or(StoreError::ProduksiNotFound { id })?;
        if let Some(n) = nama_produk {
            if n.trim().is_empty() {
                return Err(StoreError::Validation("nama produk tidak boleh kosong".into()));
            }
        }
        if let Some(t) = tarif {
            if t <= 0 {
                return Err(StoreError::Validation("tarif harus lebih dari nol".into()));
            }
        }

        // Safety: DbHandle's Mutex already guarantees single-threaded access.
        let tx = self.conn.unchecked_transaction()?;
        if let Some(n) = nama_produk {
            tx.execute(
                "UPDATE produksi SET nama_produk = ?1 WHERE id = ?2",
                params![n.trim(), id],
            )?;
        }
        if let Some(k) = keterangan {
            tx.execute(
                "UPDATE produksi SET keterangan = ?1 WHERE id = ?2",
                params![k, id],
            )?;
        }
        if let Some(t) = tarif {
            tx.execute("UPDATE produksi SET tarif = ?1 WHERE id = ?2", params![t, id])?;
            match produksi.tipe_upah {
                TipeUpah::PerUnit => {
                    tx.execute(
                        "UPDATE tugas SET upah = progress * ?1 WHERE produksi_id = ?2",
                        params![t, id],
                    )?;
                }
                TipeUpah::Harian => {
                    tx.execute(
                        "UPDATE tugas SET upah = hari_kerja * ?1 WHERE produksi_id = ?2",
                        params![t, id],
                    )?;
                }
            }
        }
        tx.commit()?;

        self.get_produksi(id)?
            .ok_or(StoreError::ProduksiNotFound { id })
    }

    /// Delete a batch; tugas, keuangan, and riwayat rows cascade.
    pub fn delete_produksi(&self, id: i64) -> Result<(), StoreError> {
        let count = self
            .conn
            .execute("DELETE FROM produksi WHERE id = ?1", params![id])?;
        if count == 0 {
            return Err(StoreError::ProduksiNotFound { id });
        }
        Ok(())
    }

    // ── Tugas & progres ───────────────────────────────────────────────

    pub fn get_tugas(&self, id: i64) -> Result<Option<Tugas>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, produksi_id, karyawan_id, target, progress, hari_kerja, upah,
                    status, status_pembayaran, tanggal_dibayar
             FROM tugas WHERE id = ?1",
        )?;
        let mut rows = stmt.query_map(params![id], tugas_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?.into_tugas()?)),
            None => Ok(None),
        }
    }

    pub fn list_tugas_produksi(&self, produksi_id: i64) -> Result<Vec<TugasView>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT t.id, t.produksi_id, t.karyawan_id, t.target, t.progress, t.hari_kerja,
                    t.upah, t.status, t.status_pembayaran, t.tanggal_dibayar, k.nama
             FROM tugas t
             JOIN karyawan k ON k.id = t.karyawan_id
             WHERE t.produksi_id = ?1
             ORDER BY t.id",
        )?;
        let rows = stmt.query_map(params![produksi_id], |row| {
            Ok((tugas_row(row)?, row.get::<_, String>(10)?))
        })?;
        let mut hasil = Vec::new();
        for row in rows {
            let (traw, nama_karyawan) = row?;
            hasil.push(TugasView {
                tugas: traw.into_tugas()?,
                nama_karyawan,
            });
        }
        Ok(hasil)
    }

    /// Record a progress increment. One transaction covers the progress
    /// update, the riwayat append, the wage recomputation, and any status
    /// transitions it triggers (tugas selesai, produksi selesai).
    pub fn catat_progress(&self, tugas_id: i64, jumlah: i64) -> Result<ProgresTercatat, StoreError> {
        if jumlah <= 0 {
            return Err(StoreError::Validation("jumlah progress harus lebih dari nol".into()));
        }
        let tugas = self
            .get_tugas(tugas_id)?
            .ok_or(StoreError::TugasNotFound { id: tugas_id })?;
        if tugas.status == StatusTugas::Selesai {
            return Err(StoreError::Validation(format!(
                "tugas {} sudah selesai",
                tugas_id
            )));
        }
        let produksi = self
            .get_produksi(tugas.produksi_id)?
            .ok_or(StoreError::ProduksiNotFound { id: tugas.produksi_id })?;
        if produksi.status == StatusProduksi::Selesai {
            return Err(StoreError::Validation(format!(
                "produksi {} sudah selesai",
                produksi.id
            )));
        }
        if tugas.progress + jumlah > tugas.target {
            return Err(StoreError::Validation(format!(
                "progress melebihi target: {} + {} > {}",
                tugas.progress, jumlah, tugas.target
            )));
        }

        let progress_baru = tugas.progress + jumlah;
        let upah_baru = match produksi.tipe_upah {
            TipeUpah::PerUnit => progress_baru * produksi.tarif,
            TipeUpah::Harian => tugas.hari_kerja * produksi.tarif,
        };
        let tugas_selesai = progress_baru == tugas.target;

        // Safety: DbHandle's Mutex already guarantees single-threaded access.
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "UPDATE tugas SET progress = ?1, upah = ?2, status = ?3 WHERE id = ?4",
            params![
                progress_baru,
                upah_baru,
                if tugas_selesai {
                    StatusTugas::Selesai.as_str()
                } else {
                    StatusTugas::Berjalan.as_str()
                },
                tugas_id,
            ],
        )?;
        tx.execute(
            "INSERT INTO riwayat_progress (tugas_id, jumlah, progress_setelah) VALUES (?1, ?2, ?3)",
            params![tugas_id, jumlah, progress_baru],
        )?;

        let mut produksi_selesai = false;
        if tugas_selesai {
            let belum_selesai: i64 = tx.query_row(
                "SELECT COUNT(*) FROM tugas WHERE produksi_id = ?1 AND status != 'selesai'",
                params![produksi.id],
                |row| row.get(0),
            )?;
            if belum_selesai == 0 {
                tx.execute(
                    "UPDATE produksi SET status = 'selesai', tanggal_selesai = datetime('now')
                     WHERE id = ?1",
                    params![produksi.id],
                )?;
                produksi_selesai = true;
            }
        }
        tx.commit()?;

        let tugas = self
            .get_tugas(tugas_id)?
            .ok_or(StoreError::TugasNotFound { id: tugas_id })?;
        Ok(ProgresTercatat {
            tugas,
            tugas_selesai,
            produksi_selesai,
        })
    }

    /// Set days worked for a daily-wage assignment and recompute its wage.
    pub fn ubah_hari_kerja(&self, tugas_id: i64, hari: i64) -> Result<Tugas, StoreError> {
        if hari < 0 {
            return Err(StoreError::Validation("hari kerja tidak boleh negatif".into()));
        }
        let tugas = self
            .get_tugas(tugas_id)?
            .ok_or(StoreError::TugasNotFound { id: tugas_id })?;
        let produksi = self
            .get_produksi(tugas.produksi_id)?
            .ok_or(StoreError::ProduksiNotFound { id: tugas.produksi_id })?;
        if produksi.tipe_upah != TipeUpah::Harian {
            return Err(StoreError::Validation(format!(
                "produksi {} memakai upah per unit, bukan harian",
                produksi.id
            )));
        }

        self.conn.execute(
            "UPDATE tugas SET hari_kerja = ?1, upah = ?2 WHERE id = ?3",
            params![hari, hari * produksi.tarif, tugas_id],
        )?;
        self.get_tugas(tugas_id)?
            .ok_or(StoreError::TugasNotFound { id: tugas_id })
    }

    // ── Pembayaran ────────────────────────────────────────────────────

    /// Mark one assignment paid. Returns the tugas and whether it had
    /// already been paid (in which case nothing was written).
    pub fn bayar_tugas(&self, tugas_id: i64) -> Result<(Tugas, bool), StoreError> {
        let tugas = self
            .get_tugas(tugas_id)?
            .ok_or(StoreError::TugasNotFound { id: tugas_id })?;
        if tugas.status_pembayaran == StatusPembayaran::Dibayar {
            return Ok((tugas, true));
        }
        self.conn.execute(
            "UPDATE tugas SET status_pembayaran = 'dibayar', tanggal_dibayar = datetime('now')
             WHERE id = ?1",
            params![tugas_id],
        )?;
        let tugas = self
            .get_tugas(tugas_id)?
            .ok_or(StoreError::TugasNotFound { id: tugas_id })?;
        Ok((tugas, false))
    }

    /// Mark every unpaid assignment of one employee paid, in one
    /// transaction. Returns the count and total amount settled.
    pub fn bayar_karyawan(&self, karyawan_id: i64) -> Result<PembayaranKaryawan, StoreError> {
        if self.get_karyawan(karyawan_id)?.is_none() {
            return Err(StoreError::KaryawanNotFound { id: karyawan_id });
        }

        // Safety: DbHandle's Mutex already guarantees single-threaded access.
        let tx = self.conn.unchecked_transaction()?;
        let (jumlah_tugas, total_upah): (i64, i64) = tx.query_row(
            "SELECT COUNT(*), COALESCE(SUM(upah), 0) FROM tugas
             WHERE karyawan_id = ?1 AND status_pembayaran = 'belum_dibayar'",
            params![karyawan_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        tx.execute(
            "UPDATE tugas SET status_pembayaran = 'dibayar', tanggal_dibayar = datetime('now')
             WHERE karyawan_id = ?1 AND status_pembayaran = 'belum_dibayar'",
            params![karyawan_id],
        )?;
        tx.commit()?;

        Ok(PembayaranKaryawan {
            karyawan_id,
            jumlah_tugas,
            total_upah,
        })
    }

    // ── Keuangan CRUD ─────────────────────────────────────────────────

    pub fn create_keuangan(
        &self,
        produksi_id: i64,
        jenis: JenisKeuangan,
        jumlah: i64,
        keterangan: &str,
        tanggal: Option<&str>,
    ) -> Result<Keuangan, StoreError> {
        if jumlah <= 0 {
            return Err(StoreError::Validation("jumlah harus lebih dari nol".into()));
        }
        if self.get_produksi(produksi_id)?.is_none() {
            return Err(StoreError::ProduksiNotFound { id: produksi_id });
        }
        match tanggal {
            Some(t) => {
                self.conn.execute(
                    "INSERT INTO keuangan (produksi_id, jenis, jumlah, keterangan, tanggal)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![produksi_id, jenis.as_str(), jumlah, keterangan, t],
                )?;
            }
            None => {
                self.conn.execute(
                    "INSERT INTO keuangan (produksi_id, jenis, jumlah, keterangan)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![produksi_id, jenis.as_str(), jumlah, keterangan],
                )?;
            }
        }
        let id = self.conn.last_insert_rowid();
        self.get_keuangan(id)?
            .ok_or(StoreError::KeuanganNotFound { id })
    }

    pub fn get_keuangan(&self, id: i64) -> Result<Option<Keuangan>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, produksi_id, jenis, jumlah, keterangan, tanggal FROM keuangan WHERE id = ?1",
        )?;
        let mut rows = stmt.query_map(params![id], keuangan_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?.into_keuangan()?)),
            None => Ok(None),
        }
    }

    pub fn list_keuangan(&self, produksi_id: i64) -> Result<Vec<Keuangan>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, produksi_id, jenis, jumlah, keterangan, tanggal
             FROM keuangan WHERE produksi_id = ?1 ORDER BY tanggal, id",
        )?;
        let rows = stmt.query_map(params![produksi_id], keuangan_row)?;
        let mut hasil = Vec::new();
        for row in rows {
            hasil.push(row?.into_keuangan()?);
        }
        Ok(hasil)
    }

    pub fn update_keuangan(
        &self,
        id: i64,
        jenis: Option<JenisKeuangan>,
        jumlah: Option<i64>,
        keterangan: Option<&str>,
        tanggal: Option<&str>,
    ) -> Result<Keuangan, StoreError> {
        if self.get_keuangan(id)?.is_none() {
            return Err(StoreError::KeuanganNotFound { id });
        }
        if let Some(j) = jumlah {
            if j <= 0 {
                return Err(StoreError::Validation("jumlah harus lebih dari nol".into()));
            }
        }

        // Safety: DbHandle's Mutex already guarantees single-threaded access.
        let tx = self.conn.unchecked_transaction()?;
        if let Some(j) = jenis {
            tx.execute("UPDATE keuangan SET jenis = ?1 WHERE id = ?2", params![j.as_str(), id])?;
        }
        if let Some(j) = jumlah {
            tx.execute("UPDATE keuangan SET jumlah = ?1 WHERE id = ?2", params![j, id])?;
        }
        if let Some(k) = keterangan {
            tx.execute("UPDATE keuangan SET keterangan = ?1 WHERE id = ?2", params![k, id])?;
        }
        if let Some(t) = tanggal {
            tx.execute("UPDATE keuangan SET tanggal = ?1 WHERE id = ?2", params![t, id])?;
        }
        tx.commit()?;

        self.get_keuangan(id)?
            .ok_or(StoreError::KeuanganNotFound { id })
    }

    pub fn delete_keuangan(&self, id: i64) -> Result<(), StoreError> {
        let count = self
            .conn
            .execute("DELETE FROM keuangan WHERE id = ?1", params![id])?;
        if count == 0 {
            return Err(StoreError::KeuanganNotFound { id });
        }
        Ok(())
    }

    // ── Laporan & dashboard ───────────────────────────────────────────

    pub fn laporan_upah(&self) -> Result<Vec<LaporanUpahRow>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT k.id, k.nama,
                    COUNT(t.id),
                    COALESCE(SUM(CASE WHEN t.status = 'selesai' THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(t.upah), 0),
                    COALESCE(SUM(CASE WHEN t.status_pembayaran = 'dibayar' THEN t.upah ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN t.status_pembayaran = 'belum_dibayar' THEN t.upah ELSE 0 END), 0)
             FROM karyawan k
             LEFT JOIN tugas t ON t.karyawan_id = k.id
             GROUP BY k.id
             ORDER BY k.nama",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(LaporanUpahRow {
                karyawan_id: row.get(0)?,
                nama: row.get(1)?,
                jumlah_tugas: row.get(2)?,
                tugas_selesai: row.get(3)?,
                total_upah: row.get(4)?,
                upah_dibayar: row.get(5)?,
                upah_belum_dibayar: row.get(6)?,
            })
        })?;
        let mut hasil = Vec::new();
        for row in rows {
            hasil.push(row?);
        }
        Ok(hasil)
    }

    pub fn laporan_keuangan(&self) -> Result<LaporanKeuangan, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT p.id, p.nama_produk, p.kode_batch,
                    COALESCE(k.pemasukan, 0), COALESCE(k.pengeluaran, 0),
                    COALESCE(t.dibayar, 0), COALESCE(t.belum, 0)
             FROM produksi p
             LEFT JOIN (
                 SELECT produksi_id,
                        SUM(CASE WHEN jenis = 'pemasukan' THEN jumlah ELSE 0 END) AS pemasukan,
                        SUM(CASE WHEN jenis = 'pengeluaran' THEN jumlah ELSE 0 END) AS pengeluaran
                 FROM keuangan GROUP BY produksi_id
             ) k ON k.produksi_id = p.id
             LEFT JOIN (
                 SELECT produksi_id,
                        SUM(CASE WHEN status_pembayaran = 'dibayar' THEN upah ELSE 0 END) AS dibayar,
                        SUM(CASE WHEN status_pembayaran = 'belum_dibayar' THEN upah ELSE 0 END) AS belum
                 FROM tugas GROUP BY produksi_id
             ) t ON t.produksi_id = p.id
             ORDER BY p.id",
        )?;
        let rows = stmt.query_map([], |row| {
            let pemasukan: i64 = row.get(3)?;
            let pengeluaran: i64 = row.get(4)?;
            Ok(LaporanKeuanganRow {
                produksi_id: row.get(0)?,
                nama_produk: row.get(1)?,
                kode_batch: row.get(2)?,
                total_pemasukan: pemasukan,
                total_pengeluaran: pengeluaran,
                saldo: pemasukan - pengeluaran,
                upah_dibayar: row.get(5)?,
                upah_belum_dibayar: row.get(6)?,
            })
        })?;
        let mut rincian = Vec::new();
        for row in rows {
            rincian.push(row?);
        }

        let total_pemasukan: i64 = rincian.iter().map(|r| r.total_pemasukan).sum();
        let total_pengeluaran: i64 = rincian.iter().map(|r| r.total_pengeluaran).sum();
        let upah_dibayar: i64 = rincian.iter().map(|r| r.upah_dibayar).sum();
        let upah_belum_dibayar: i64 = rincian.iter().map(|r| r.upah_belum_dibayar).sum();
        Ok(LaporanKeuangan {
            rincian,
            total_pemasukan,
            total_pengeluaran,
            saldo: total_pemasukan - total_pengeluaran,
            upah_dibayar,
            upah_belum_dibayar,
        })
    }

    pub fn get_dashboard(&self) -> Result<Dashboard, StoreError> {
        let produksi_berjalan: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM produksi WHERE status = 'berjalan'",
            [],
            |row| row.get(0),
        )?;
        let produksi_selesai: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM produksi WHERE status = 'selesai'",
            [],
            |row| row.get(0),
        )?;
        let karyawan_aktif: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM karyawan WHERE aktif = 1",
            [],
            |row| row.get(0),
        )?;
        let total_upah_belum_dibayar: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(upah), 0) FROM tugas WHERE status_pembayaran = 'belum_dibayar'",
            [],
            |row| row.get(0),
        )?;
        let (total_pemasukan, total_pengeluaran): (i64, i64) = self.conn.query_row(
            "SELECT COALESCE(SUM(CASE WHEN jenis = 'pemasukan' THEN jumlah ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN jenis = 'pengeluaran' THEN jumlah ELSE 0 END), 0)
             FROM keuangan",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let produksi = self.list_produksi()?;
        let riwayat_terbaru = self.riwayat_terbaru(10)?;

        Ok(Dashboard {
            produksi_berjalan,
            produksi_selesai,
            karyawan_aktif,
            total_upah_belum_dibayar,
            total_pemasukan,
            total_pengeluaran,
            saldo: total_pemasukan - total_pengeluaran,
            produksi,
            riwayat_terbaru,
        })
    }

    pub fn riwayat_terbaru(&self, limit: i64) -> Result<Vec<RiwayatView>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT r.id, r.tugas_id, r.jumlah, r.progress_setelah, r.dicatat_pada,
                    k.nama, p.nama_produk
             FROM riwayat_progress r
             JOIN tugas t ON t.id = r.tugas_id
             JOIN karyawan k ON k.id = t.karyawan_id
             JOIN produksi p ON p.id = t.produksi_id
             ORDER BY r.id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], |row| {
            Ok(RiwayatView {
                riwayat: RiwayatProgress {
                    id: row.get(0)?,
                    tugas_id: row.get(1)?,
                    jumlah: row.get(2)?,
                    progress_setelah: row.get(3)?,
                    dicatat_pada: row.get(4)?,
                },
                nama_karyawan: row.get(5)?,
                nama_produk: row.get(6)?,
            })
        })?;
        let mut hasil = Vec::new();
        for row in rows {
            hasil.push(row?);
        }
        Ok(hasil)
    }

    pub fn list_riwayat_tugas(&self, tugas_id: i64) -> Result<Vec<RiwayatProgress>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, tugas_id, jumlah, progress_setelah, dicatat_pada
             FROM riwayat_progress WHERE tugas_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![tugas_id], |row| {
            Ok(RiwayatProgress {
                id: row.get(0)?,
                tugas_id: row.get(1)?,
                jumlah: row.get(2)?,
                progress_setelah: row.get(3)?,
                dicatat_pada: row.get(4)?,
            })
        })?;
        let mut hasil = Vec::new();
        for row in rows {
            hasil.push(row?);
        }
        Ok(hasil)
    }
}

// ── Internal row helpers ──────────────────────────────────────────────

fn karyawan_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Karyawan> {
    Ok(Karyawan {
        id: row.get(0)?,
        nama: row.get(1)?,
        telepon: row.get(2)?,
        alamat: row.get(3)?,
        aktif: row.get::<_, i64>(4)? != 0,
        created_at: row.get(5)?,
    })
}

/// Intermediate row struct for reading produksi before parsing the
/// tipe_upah / status strings into typed values.
struct ProduksiRow {
    id: i64,
    nama_produk: String,
    kode_batch: String,
    jumlah_pola: i64,
    tipe_upah: String,
    tarif: i64,
    status: String,
    keterangan: Option<String>,
    tanggal_mulai: String,
    tanggal_selesai: Option<String>,
}

fn produksi_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProduksiRow> {
    Ok(ProduksiRow {
        id: row.get(0)?,
        nama_produk: row.get(1)?,
        kode_batch: row.get(2)?,
        jumlah_pola: row.get(3)?,
        tipe_upah: row.get(4)?,
        tarif: row.get(5)?,
        status: row.get(6)?,
        keterangan: row.get(7)?,
        tanggal_mulai: row.get(8)?,
        tanggal_selesai: row.get(9)?,
    })
}

impl ProduksiRow {
    fn into_produksi(self) -> Result<Produksi, StoreError> {
        let tipe_upah = TipeUpah::from_str(&self.tipe_upah)
            .map_err(StoreError::Validation)?;
        let status = StatusProduksi::from_str(&self.status)
            .map_err(StoreError::Validation)?;
        Ok(Produksi {
            id: self.id,
            nama_produk: self.nama_produk,
            kode_batch: self.kode_batch,
            jumlah_pola: self.jumlah_pola,
            tipe_upah,
            tarif: self.tarif,
            status,
            keterangan: self.keterangan,
            tanggal_mulai: self.tanggal_mulai,
            tanggal_selesai: self.tanggal_selesai,
        })
    }
}

/// Intermediate row struct for tugas.
struct TugasRow {
    id: i64,
    produksi_id: i64,
    karyawan_id: i64,
    target: i64,
    progress: i64,
    hari_kerja: i64,
    upah: i64,
    status: String,
    status_pembayaran: String,
    tanggal_dibayar: Option<String>,
}

fn tugas_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TugasRow> {
    Ok(TugasRow {
        id: row.get(0)?,
        produksi_id: row.get(1)?,
        karyawan_id: row.get(2)?,
        target: row.get(3)?,
        progress: row.get(4)?,
        hari_kerja: row.get(5)?,
        upah: row.get(6)?,
        status: row.get(7)?,
        status_pembayaran: row.get(8)?,
        tanggal_dibayar: row.get(9)?,
    })
}

impl TugasRow {
    fn into_tugas(self) -> Result<Tugas, StoreError> {
        let status = StatusTugas::from_str(&self.status).map_err(StoreError::Validation)?;
        let status_pembayaran = StatusPembayaran::from_str(&self.status_pembayaran)
            .map_err(StoreError::Validation)?;
        Ok(Tugas {
            id: self.id,
            produksi_id: self.produksi_id,
            karyawan_id: self.karyawan_id,
            target: self.target,
            progress: self.progress,
            hari_kerja: self.hari_kerja,
            upah: self.upah,
            status,
            status_pembayaran,
            tanggal_dibayar: self.tanggal_dibayar,
        })
    }
}

/// Intermediate row struct for keuangan.
struct KeuanganRow {
    id: i64,
    produksi_id: i64,
    jenis: String,
    jumlah: i64,
    keterangan: String,
    tanggal: String,
}

fn keuangan_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<KeuanganRow> {
    Ok(KeuanganRow {
        id: row.get(0)?,
        produksi_id: row.get(1)?,
        jenis: row.get(2)?,
        jumlah: row.get(3)?,
        keterangan: row.get(4)?,
        tanggal: row.get(5)?,
    })
}

impl KeuanganRow {
    fn into_keuangan(self) -> Result<Keuangan, StoreError> {
        let jenis = JenisKeuangan::from_str(&self.jenis).map_err(StoreError::Validation)?;
        Ok(Keuangan {
            id: self.id,
            produksi_id: self.produksi_id,
            jenis,
            jumlah: self.jumlah,
            keterangan: self.keterangan,
            tanggal: self.tanggal,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────
