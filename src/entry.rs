use std::collections::BTreeMap;

use uuid::Uuid;

/// Attribute name carried by every generated entry.
pub const MEMBERSHIP_ATTRIBUTE: &str = "bungieMembershipId";

const MEMBERSHIP_ID: &str = "16650411";

/// Single message unit: unique id, body payload, and attribute set.
#[derive(Clone, Debug)]
pub struct MessageEntry {
    pub id: String,
    pub body: String,
    pub attributes: BTreeMap<String, MessageAttribute>,
}

/// Typed attribute value as the queue service models it.
#[derive(Clone, Debug)]
pub struct MessageAttribute {
    pub data_type: String,
    pub value: String,
}

/// Fixed payload content shared by every entry in a run.
#[derive(Clone, Debug)]
pub struct EntryTemplate {
    body: String,
}

impl EntryTemplate {
    pub fn new(body: String) -> Self {
        Self { body }
    }

    /// Build a fresh entry: new random id, templated body and attributes.
    pub fn new_entry(&self) -> MessageEntry {
        let mut attributes = BTreeMap::new();
        attributes.insert(
            MEMBERSHIP_ATTRIBUTE.to_string(),
            MessageAttribute {
                data_type: "String".to_string(),
                value: MEMBERSHIP_ID.to_string(),
            },
        );
        MessageEntry {
            id: Uuid::new_v4().to_string(),
            body: self.body.clone(),
            attributes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_get_unique_ids() {
        let template = EntryTemplate::new("body".to_string());
        let a = template.new_entry();
        let b = template.new_entry();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn entry_carries_templated_body_and_attribute() {
        let template = EntryTemplate::new("some-uid".to_string());
        let entry = template.new_entry();
        assert_eq!(entry.body, "some-uid");
        let attribute = entry.attributes.get(MEMBERSHIP_ATTRIBUTE).expect("attribute");
        assert_eq!(attribute.data_type, "String");
        assert_eq!(attribute.value, MEMBERSHIP_ID);
    }
}
