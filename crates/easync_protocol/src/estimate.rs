//! GetItemEstimate message shapes.

use easync_wbxml::{Codepage, Element, WbxmlResult};

use crate::folder::{missing, CollectionClass};
use crate::status::ItemEstimateStatus;
use crate::sync::SyncKey;

/// The parsed result of one GetItemEstimate round-trip.
#[derive(Debug, Clone)]
pub struct ItemEstimateResponse {
    /// Command status.
    pub status: ItemEstimateStatus,
    /// Number of changes a sync with the same key would deliver.
    pub estimate: Option<u32>,
}

/// Build a GetItemEstimate request for one collection.
///
/// The estimate is advisory and does not consume the sync key; the
/// same key remains valid for the following Sync.
pub fn item_estimate_request(
    collection_id: &str,
    sync_key: &SyncKey,
    class: CollectionClass,
) -> Element {
    Element::new(Codepage::ItemEstimate, "GetItemEstimate").with(
        Element::new(Codepage::ItemEstimate, "Collections").with(
            Element::new(Codepage::ItemEstimate, "Collection")
                .with_text(Codepage::ItemEstimate, "Class", class.as_str())
                .with_text(Codepage::AirSync, "SyncKey", sync_key.as_str())
                .with_text(Codepage::ItemEstimate, "CollectionId", collection_id),
        ),
    )
}

/// Parse a GetItemEstimate response for its first collection.
pub fn parse_item_estimate(root: &Element) -> WbxmlResult<ItemEstimateResponse> {
    let response = root
        .child("Response")
        .ok_or_else(|| missing("GetItemEstimate", "Response"))?;
    let status = response
        .child_parsed::<u8>("Status")
        .map(ItemEstimateStatus::from_code)
        .ok_or_else(|| missing("GetItemEstimate", "Status"))?;
    let estimate = response
        .child("Collection")
        .and_then(|c| c.child_parsed("Estimate"));
    Ok(ItemEstimateResponse { status, estimate })
}
