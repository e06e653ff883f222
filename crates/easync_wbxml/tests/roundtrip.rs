//! Round-trip property tests for the WBXML codec.

use easync_wbxml::{decode, encode, Codepage, Element, Node};
use proptest::prelude::*;

/// Tag vocabulary the generator draws from, spanning several codepages
/// so page switches are exercised.
const TAGS: &[(Codepage, &str)] = &[
    (Codepage::AirSync, "Sync"),
    (Codepage::AirSync, "Collections"),
    (Codepage::AirSync, "Collection"),
    (Codepage::AirSync, "SyncKey"),
    (Codepage::AirSync, "Status"),
    (Codepage::AirSync, "ApplicationData"),
    (Codepage::Email, "Subject"),
    (Codepage::Email, "Read"),
    (Codepage::Email, "From"),
    (Codepage::Calendar, "Location"),
    (Codepage::Tasks, "DueDate"),
    (Codepage::FolderHierarchy, "DisplayName"),
    (Codepage::Ping, "HeartbeatInterval"),
    (Codepage::Provision, "PolicyKey"),
    (Codepage::AirSyncBase, "Body"),
    (Codepage::AirSyncBase, "Data"),
    (Codepage::Settings, "Model"),
    (Codepage::ItemOperations, "Fetch"),
    (Codepage::Notes, "MessageClass"),
];

fn arb_tag() -> impl Strategy<Value = (Codepage, &'static str)> {
    (0..TAGS.len()).prop_map(|i| TAGS[i])
}

fn arb_text() -> impl Strategy<Value = String> {
    // Anything without NUL is representable as an inline string.
    "[ -~]{0,40}".prop_map(String::from)
}

fn arb_element() -> impl Strategy<Value = Element> {
    let leaf = prop_oneof![
        arb_tag().prop_map(|(page, name)| Element::new(page, name)),
        (arb_tag(), arb_text()).prop_map(|((page, name), text)| Element::text(page, name, text)),
        (arb_tag(), prop::collection::vec(any::<u8>(), 0..32))
            .prop_map(|((page, name), data)| Element::opaque(page, name, data)),
    ];

    leaf.prop_recursive(4, 48, 6, |inner| {
        (arb_tag(), prop::collection::vec(inner, 0..6)).prop_map(|((page, name), children)| {
            let mut element = Element::new(page, name);
            for child in children {
                element.children.push(Node::Element(child));
            }
            element
        })
    })
}

proptest! {
    #[test]
    fn roundtrip_is_lossless(doc in arb_element()) {
        let bytes = encode(&doc).unwrap();
        let decoded = decode(&bytes).unwrap();
        prop_assert_eq!(decoded, doc);
    }

    #[test]
    fn decode_never_panics_on_garbage(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        // Arbitrary input must either decode or fail cleanly.
        let _ = decode(&bytes);
    }
}
