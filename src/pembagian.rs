//! Work distribution: turning a batch's `jumlah_pola` and a [`Pembagian`]
//! request into per-employee targets.
//!
//! This is pure validation and arithmetic; the store applies the resulting
//! plan inside the batch-creation transaction.

use std::collections::HashSet;

use crate::errors::StoreError;
use crate::models::Pembagian;

/// Resolve a distribution request into `(karyawan_id, target)` pairs.
///
/// The returned targets always sum to exactly `jumlah_pola`; any request
/// that cannot satisfy that balance is rejected as a whole.
pub fn rencana_pembagian(
    jumlah_pola: i64,
    pembagian: &Pembagian,
) -> Result<Vec<(i64, i64)>, StoreError> {
    if jumlah_pola <= 0 {
        return Err(StoreError::Validation(
            "jumlah_pola harus lebih dari nol".into(),
        ));
    }

    match pembagian {
        Pembagian::Merata { karyawan_ids } => bagi_merata(jumlah_pola, karyawan_ids),
        Pembagian::Manual { rincian } => {
            if rincian.is_empty() {
                return Err(StoreError::Validation(
                    "pembagian manual membutuhkan minimal satu karyawan".into(),
                ));
            }
            let mut seen = HashSet::new();
            let mut total = 0i64;
            for baris in rincian {
                if !seen.insert(baris.karyawan_id) {
                    return Err(StoreError::Validation(format!(
                        "karyawan {} muncul lebih dari sekali",
                        baris.karyawan_id
                    )));
                }
                if baris.target <= 0 {
                    return Err(StoreError::Validation(format!(
                        "target untuk karyawan {} harus lebih dari nol",
                        baris.karyawan_id
                    )));
                }
                total += baris.target;
            }
            if total != jumlah_pola {
                return Err(StoreError::Validation(format!(
                    "total target ({}) harus sama dengan jumlah pola ({})",
                    total, jumlah_pola
                )));
            }
            Ok(rincian
                .iter()
                .map(|b| (b.karyawan_id, b.target))
                .collect())
        }
    }
}

/// Even split: everyone gets `jumlah_pola / n`, the first `jumlah_pola % n`
/// employees get one extra unit.
fn bagi_merata(jumlah_pola: i64, karyawan_ids: &[i64]) -> Result<Vec<(i64, i64)>, StoreError> {
    if karyawan_ids.is_empty() {
        return Err(StoreError::Validation(
            "pembagian merata membutuhkan minimal satu karyawan".into(),
        ));
    }
    let mut seen = HashSet::new();
    for id in karyawan_ids {
        if !seen.insert(*id) {
            return Err(StoreError::Validation(format!(
                "karyawan {} muncul lebih dari sekali",
                id
            )));
        }
    }

    let n = karyawan_ids.len() as i64;
    if jumlah_pola < n {
        return Err(StoreError::Validation(format!(
            "jumlah pola ({}) lebih kecil dari jumlah karyawan ({})",
            jumlah_pola, n
        )));
    }

    let dasar = jumlah_pola / n;
    let sisa = jumlah_pola % n;
    Ok(karyawan_ids
        .iter()
        .enumerate()
        .map(|(i, id)| {
            let target = if (i as i64) < sisa { dasar + 1 } else { dasar };
            (*id, target)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TargetKaryawan;

    #[test]
    fn merata_splits_evenly() {
        let plan = rencana_pembagian(
            90,
            &Pembagian::Merata {
                karyawan_ids: vec![1, 2, 3],
            },
        )
        .unwrap();
        assert_eq!(plan, vec![(1, 30), (2, 30), (3, 30)]);
    }

    #[test]
    fn merata_gives_remainder_to_first_employees() {
        let plan = rencana_pembagian(
            100,
            &Pembagian::Merata {
                karyawan_ids: vec![5, 6, 7],
            },
        )
        .unwrap();
        assert_eq!(plan, vec![(5, 34), (6, 33), (7, 33)]);
        let total: i64 = plan.iter().map(|(_, t)| t).sum();
        assert_eq!(total, 100);
    }

    #[test]
    fn merata_rejects_more_employees_than_units() {
        let err = rencana_pembagian(
            2,
            &Pembagian::Merata {
                karyawan_ids: vec![1, 2, 3],
            },
        )
        .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[test]
    fn merata_rejects_empty_and_duplicate_employees() {
        assert!(rencana_pembagian(10, &Pembagian::Merata { karyawan_ids: vec![] }).is_err());
        assert!(
            rencana_pembagian(
                10,
                &Pembagian::Merata {
                    karyawan_ids: vec![1, 1]
                }
            )
            .is_err()
        );
    }

    #[test]
    fn manual_accepts_exact_balance() {
        let plan = rencana_pembagian(
            60,
            &Pembagian::Manual {
                rincian: vec![
                    TargetKaryawan { karyawan_id: 1, target: 40 },
                    TargetKaryawan { karyawan_id: 2, target: 20 },
                ],
            },
        )
        .unwrap();
        assert_eq!(plan, vec![(1, 40), (2, 20)]);
    }

    #[test]
    fn manual_rejects_unbalanced_targets() {
        let err = rencana_pembagian(
            60,
            &Pembagian::Manual {
                rincian: vec![
                    TargetKaryawan { karyawan_id: 1, target: 40 },
                    TargetKaryawan { karyawan_id: 2, target: 10 },
                ],
            },
        )
        .unwrap_err();
        match err {
            StoreError::Validation(msg) => {
                assert!(msg.contains("50"));
                assert!(msg.contains("60"));
            }
            _ => panic!("Expected Validation error"),
        }
    }

    #[test]
    fn manual_rejects_zero_target_and_duplicates() {
        assert!(
            rencana_pembagian(
                10,
                &Pembagian::Manual {
                    rincian: vec![TargetKaryawan { karyawan_id: 1, target: 0 }]
                }
            )
            .is_err()
        );
        assert!(
            rencana_pembagian(
                10,
                &Pembagian::Manual {
                    rincian: vec![
                        TargetKaryawan { karyawan_id: 1, target: 5 },
                        TargetKaryawan { karyawan_id: 1, target: 5 },
                    ]
                }
            )
            .is_err()
        );
    }

    #[test]
    fn rejects_nonpositive_jumlah_pola() {
        assert!(
            rencana_pembagian(0, &Pembagian::Merata { karyawan_ids: vec![1] }).is_err()
        );
        assert!(
            rencana_pembagian(-5, &Pembagian::Merata { karyawan_ids: vec![1] }).is_err()
        );
    }
}
