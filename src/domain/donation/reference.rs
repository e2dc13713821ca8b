//! Payment reference formats and correlation helpers.
//!
//! A donation's stored payment reference correlates it to the provider-side
//! transaction. The storage form is `<provider>:<transaction id>` for Stripe
//! and Khalti. eSewa cannot echo an opaque token, so its initiation
//! reference is the composite `esewa_<donation id>` and its transaction UUID
//! embeds a timestamp plus a short id prefix that the failure callback can
//! recover.

use crate::domain::foundation::DonationId;

use super::provider::Provider;

/// Prefix of the composite eSewa reference id.
pub const ESEWA_REFERENCE_PREFIX: &str = "esewa_";

/// Number of donation-id characters embedded in the eSewa transaction UUID.
pub const ESEWA_ID_PREFIX_LEN: usize = 8;

/// Formats the storage form of a provider transaction reference.
pub fn payment_reference(provider: Provider, transaction_id: &str) -> String {
    format!("{}:{}", provider.as_str(), transaction_id)
}

/// Formats the Khalti storage reference for a payment index.
pub fn khalti_reference(pidx: &str) -> String {
    payment_reference(Provider::Khalti, pidx)
}

/// Formats the composite eSewa reference id for a donation.
pub fn esewa_reference(donation_id: &DonationId) -> String {
    format!("{}{}", ESEWA_REFERENCE_PREFIX, donation_id)
}

/// Recovers the donation id from a composite eSewa reference (`pid`/`oid`).
pub fn donation_id_from_esewa_reference(reference: &str) -> Option<DonationId> {
    reference
        .strip_prefix(ESEWA_REFERENCE_PREFIX)?
        .parse()
        .ok()
}

/// Builds the eSewa transaction UUID: `<unix seconds>-<donation id prefix>`.
///
/// eSewa echoes this value back on both callbacks; it is the only
/// correlation data available on the failure path.
pub fn esewa_transaction_uuid(unix_secs: i64, donation_id: &DonationId) -> String {
    format!(
        "{}-{}",
        unix_secs,
        donation_id.short_prefix(ESEWA_ID_PREFIX_LEN)
    )
}

/// Extracts the donation id prefix from an echoed eSewa transaction UUID.
///
/// The UUID is `<timestamp>-<prefix>`; the second `-`-separated segment is
/// the prefix. Returns `None` when the shape does not match.
pub fn id_prefix_from_transaction_uuid(transaction_uuid: &str) -> Option<&str> {
    let mut parts = transaction_uuid.split('-');
    let _timestamp = parts.next()?;
    let prefix = parts.next()?;
    if prefix.is_empty() {
        None
    } else {
        Some(prefix)
    }
}

/// Masks a transaction identifier or token for logging.
///
/// Keeps a short leading fragment so log lines remain correlatable without
/// exposing the full identifier.
pub fn masked(value: &str) -> String {
    const VISIBLE: usize = 4;
    if value.len() <= VISIBLE {
        return "****".to_string();
    }
    let head: String = value.chars().take(VISIBLE).collect();
    format!("{}****", head)
}
