//! Batch aggregation
//!
//! A cut hands this module a contiguous prefix of the queue. The prefix is
//! partitioned by destination, preserving arrival order inside each
//! partition, and each partition is encoded into one JSON array body. An
//! event that fails to encode is left out of the body and remembered with
//! its error; the rest of the partition still ships.

use std::collections::HashMap;

use crate::event::{Destination, ValidatedEvent};

/// Events sharing one destination, in arrival order
#[derive(Debug)]
pub struct Partition {
    /// The shared destination triple
    pub destination: Destination,

    /// The partition's events, a subsequence of the cut prefix
    pub events: Vec<ValidatedEvent>,
}

/// Group a cut prefix by destination.
///
/// Within a partition the prefix order is preserved; partitions themselves
/// come out in first-seen order, which callers must not rely on.
pub fn partition_events(events: Vec<ValidatedEvent>) -> Vec<Partition> {
    let mut partitions: Vec<Partition> = Vec::new();
    let mut index: HashMap<Destination, usize> = HashMap::new();

    for event in events {
        let destination = event.destination();
        match index.get(&destination) {
            Some(&i) => partitions[i].events.push(event),
            None => {
                index.insert(destination.clone(), partitions.len());
                partitions.push(Partition {
                    destination,
                    events: vec![event],
                });
            }
        }
    }

    partitions
}

/// Disposition of one event of a partition after encoding
#[derive(Debug)]
pub enum EventSlot {
    /// Encoded successfully; holds the event's index within the body
    /// array (and within the per-event response array)
    Encoded(usize),

    /// Failed to serialize; carries the error message
    Failed(String),
}

/// One partition encoded to a request body
#[derive(Debug)]
pub struct EncodedPartition {
    /// JSON array body containing the successfully-encoded events
    pub body: String,

    /// Per-event dispositions, parallel to the partition's event list
    pub slots: Vec<EventSlot>,

    /// Number of events present in `body`
    pub encoded_count: usize,
}

/// Encode a partition's events into one JSON array body.
///
/// Never fails as a whole: encode failures are per event and recorded in
/// the matching slot. `encoded_count == 0` means there is nothing to send.
pub fn encode_partition(events: &[ValidatedEvent]) -> EncodedPartition {
    let mut parts: Vec<String> = Vec::with_capacity(events.len());
    let mut slots: Vec<EventSlot> = Vec::with_capacity(events.len());

    for event in events {
        match event.wire_json() {
            Ok(encoded) => {
                slots.push(EventSlot::Encoded(parts.len()));
                parts.push(encoded);
            }
            Err(e) => slots.push(EventSlot::Failed(e.to_string())),
        }
    }

    EncodedPartition {
        encoded_count: parts.len(),
        body: format!("[{}]", parts.join(",")),
        slots,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{CustomPayload, Payload};
    use serde_json::{Value, json};
    use std::sync::Arc;

    fn event(dataset: &str, marker: i64) -> ValidatedEvent {
        let mut map = serde_json::Map::new();
        map.insert("marker".into(), json!(marker));

        ValidatedEvent {
            timestamp: "2026-08-02T10:15:00Z".parse().unwrap(),
            api_host: "http://localhost:9999".into(),
            write_key: "key".into(),
            dataset: dataset.into(),
            sample_rate: 1,
            post_data: Payload::fields(map),
            metadata: json!(marker),
        }
    }

    #[derive(Debug)]
    struct Poisoned;

    impl CustomPayload for Poisoned {
        fn to_json(&self) -> Result<Value, serde_json::Error> {
            Err(serde::ser::Error::custom("poisoned payload"))
        }
    }

    fn poisoned_event(dataset: &str) -> ValidatedEvent {
        let mut e = event(dataset, -1);
        e.post_data = Payload::Custom(Arc::new(Poisoned));
        e
    }

    #[test]
    fn test_single_destination_single_partition() {
        let partitions = partition_events(vec![event("d", 1), event("d", 2), event("d", 3)]);
        assert_eq!(partitions.len(), 1);
        assert_eq!(partitions[0].events.len(), 3);
        assert_eq!(partitions[0].destination.dataset, "d");
    }

    #[test]
    fn test_partition_preserves_order_within_destination() {
        let partitions = partition_events(vec![
            event("a", 1),
            event("b", 2),
            event("a", 3),
            event("b", 4),
            event("a", 5),
        ]);

        assert_eq!(partitions.len(), 2);
        let a = partitions.iter().find(|p| p.destination.dataset == "a").unwrap();
        let markers: Vec<_> = a.events.iter().map(|e| e.metadata.clone()).collect();
        assert_eq!(markers, vec![json!(1), json!(3), json!(5)]);
    }

    #[test]
    fn test_write_key_splits_partitions() {
        let mut other = event("d", 2);
        other.write_key = "other-key".into();

        let partitions = partition_events(vec![event("d", 1), other]);
        assert_eq!(partitions.len(), 2);
    }

    #[test]
    fn test_encode_clean_partition() {
        let events = vec![event("d", 1), event("d", 2)];
        let encoded = encode_partition(&events);

        assert_eq!(encoded.encoded_count, 2);
        let body: Value = serde_json::from_str(&encoded.body).unwrap();
        assert_eq!(body.as_array().unwrap().len(), 2);
        assert_eq!(body[0]["data"]["marker"], 1);
        assert_eq!(body[1]["data"]["marker"], 2);
    }

    #[test]
    fn test_encode_failure_omitted_from_body() {
        let events = vec![event("d", 1), poisoned_event("d"), event("d", 3)];
        let encoded = encode_partition(&events);

        assert_eq!(encoded.encoded_count, 2);
        let body: Value = serde_json::from_str(&encoded.body).unwrap();
        assert_eq!(body.as_array().unwrap().len(), 2);

        // The failed event keeps its place in the slots, not in the body
        assert!(matches!(encoded.slots[0], EventSlot::Encoded(0)));
        assert!(matches!(encoded.slots[1], EventSlot::Failed(_)));
        assert!(matches!(encoded.slots[2], EventSlot::Encoded(1)));
    }

    #[test]
    fn test_encode_all_failed() {
        let events = vec![poisoned_event("d"), poisoned_event("d")];
        let encoded = encode_partition(&events);

        assert_eq!(encoded.encoded_count, 0);
        assert_eq!(encoded.body, "[]");
        assert!(encoded.slots.iter().all(|s| matches!(s, EventSlot::Failed(_))));
    }

    #[test]
    fn test_failed_slot_carries_message() {
        let events = vec![poisoned_event("d")];
        let encoded = encode_partition(&events);

        let EventSlot::Failed(message) = &encoded.slots[0] else {
            panic!("expected failed slot");
        };
        assert!(message.contains("poisoned payload"));
    }
}
