//! Lifecycle rules for file records.
//!
//! Pure functions encoding the valid status/price/payment transitions. They
//! carry no state and perform no I/O; the record store calls [`validate`]
//! after every transform so an invariant-violating mutation is rejected
//! before anything is persisted.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::{FileRecord, FileStatus, PaymentStatus};

/// A requested transition that would violate the record invariants.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransitionError {
    #[error("price must be non-negative, got {0}")]
    NegativePrice(Decimal),

    #[error("a priced record must be approved")]
    PricedButPending,

    #[error("price cannot be cleared once set")]
    PriceCleared,

    #[error("download count cannot decrease ({from} -> {to})")]
    DownloadCountDecreased { from: u64, to: u64 },

    #[error("{0} is immutable after creation")]
    ImmutableFieldChanged(&'static str),
}

/// Set a price. Valid iff `price >= 0`; pricing a record always approves it.
pub fn set_price(record: &mut FileRecord, price: Decimal) -> Result<(), TransitionError> {
    if price.is_sign_negative() {
        return Err(TransitionError::NegativePrice(price));
    }
    record.price = Some(price);
    record.status = FileStatus::Approved;
    Ok(())
}

/// Approve a record without touching its price. Always valid.
pub fn approve(record: &mut FileRecord) {
    record.status = FileStatus::Approved;
}

/// Set the payment state. Valid for any defined enum value; no other field
/// changes.
pub fn set_payment(record: &mut FileRecord, payment_status: PaymentStatus) {
    record.payment_status = payment_status;
}

/// Count one successful download. The caller is responsible for checking
/// that the record's blob exists before invoking this.
pub fn record_download(record: &mut FileRecord) {
    record.download_count += 1;
}

/// True iff the record may appear in the public listing: approved and priced.
pub fn is_publicly_listed(record: &FileRecord) -> bool {
    record.status == FileStatus::Approved && record.price.is_some()
}

/// Check the whole-record invariants a mutation must preserve relative to the
/// state it started from.
pub fn validate(before: &FileRecord, after: &FileRecord) -> Result<(), TransitionError> {
    if after.id != before.id {
        return Err(TransitionError::ImmutableFieldChanged("id"));
    }
    if after.original_name != before.original_name {
        return Err(TransitionError::ImmutableFieldChanged("original name"));
    }
    if after.storage_key != before.storage_key {
        return Err(TransitionError::ImmutableFieldChanged("storage key"));
    }
    if after.size_bytes != before.size_bytes {
        return Err(TransitionError::ImmutableFieldChanged("size"));
    }
    if after.uploaded_at != before.uploaded_at {
        return Err(TransitionError::ImmutableFieldChanged("upload timestamp"));
    }
    if after.customer_name != before.customer_name || after.purpose != before.purpose {
        return Err(TransitionError::ImmutableFieldChanged("metadata"));
    }
    if let Some(price) = after.price {
        if price.is_sign_negative() {
            return Err(TransitionError::NegativePrice(price));
        }
        if after.status != FileStatus::Approved {
            return Err(TransitionError::PricedButPending);
        }
    } else if before.price.is_some() {
        return Err(TransitionError::PriceCleared);
    }
    if after.download_count < before.download_count {
        return Err(TransitionError::DownloadCountDecreased {
            from: before.download_count,
            to: after.download_count,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn pending() -> FileRecord {
        FileRecord::new(
            Uuid::new_v4(),
            "bracket.stl".to_string(),
            "blobs/x.stl".to_string(),
            1024,
            None,
            None,
        )
    }

    #[test]
    fn set_price_forces_approval() {
        let mut r = pending();
        set_price(&mut r, dec("12.50")).unwrap();
        assert_eq!(r.price, Some(dec("12.50")));
        assert_eq!(r.status, FileStatus::Approved);
    }

    #[test]
    fn negative_price_rejected() {
        let mut r = pending();
        let err = set_price(&mut r, dec("-1")).unwrap_err();
        assert_eq!(err, TransitionError::NegativePrice(dec("-1")));
        assert_eq!(r.price, None);
        assert_eq!(r.status, FileStatus::Pending);
    }

    #[test]
    fn approve_leaves_price_untouched() {
        let mut r = pending();
        approve(&mut r);
        assert_eq!(r.status, FileStatus::Approved);
        assert_eq!(r.price, None);
    }

    #[test]
    fn payment_is_independent_of_status() {
        let mut r = pending();
        set_payment(&mut r, PaymentStatus::PaidCash);
        assert_eq!(r.payment_status, PaymentStatus::PaidCash);
        assert_eq!(r.status, FileStatus::Pending);
    }

    #[test]
    fn public_listing_requires_approval_and_price() {
        let mut r = pending();
        assert!(!is_publicly_listed(&r));
        approve(&mut r);
        // Approved but unpriced must stay off the public listing.
        assert!(!is_publicly_listed(&r));
        set_price(&mut r, dec("9.99")).unwrap();
        assert!(is_publicly_listed(&r));
    }

    #[test]
    fn validate_rejects_priced_pending_record() {
        let before = pending();
        let mut after = before.clone();
        after.price = Some(dec("5"));
        assert_eq!(
            validate(&before, &after),
            Err(TransitionError::PricedButPending)
        );
    }

    #[test]
    fn validate_rejects_unsetting_price() {
        let mut before = pending();
        set_price(&mut before, dec("5")).unwrap();
        let mut after = before.clone();
        after.price = None;
        assert_eq!(validate(&before, &after), Err(TransitionError::PriceCleared));
    }

    #[test]
    fn validate_rejects_download_count_rollback() {
        let mut before = pending();
        record_download(&mut before);
        let mut after = before.clone();
        after.download_count = 0;
        assert_eq!(
            validate(&before, &after),
            Err(TransitionError::DownloadCountDecreased { from: 1, to: 0 })
        );
    }

    #[test]
    fn validate_rejects_rewriting_immutable_fields() {
        let before = pending();
        let mut after = before.clone();
        after.storage_key = "blobs/other.stl".to_string();
        assert_eq!(
            validate(&before, &after),
            Err(TransitionError::ImmutableFieldChanged("storage key"))
        );
    }

    #[test]
    fn validate_accepts_normal_transitions() {
        let before = pending();
        let mut after = before.clone();
        set_price(&mut after, dec("3.75")).unwrap();
        record_download(&mut after);
        assert_eq!(validate(&before, &after), Ok(()));
    }
}
