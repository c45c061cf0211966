use common::domain::{DomainError, DomainResult};

/// Event type carrying device uplinks
pub const UPLINK_EVENT: &str = "up";

/// Parsed network server event topic
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTopic {
    pub application_id: String,
    pub dev_eui: String,
    pub event: String,
}

impl ParsedTopic {
    pub fn is_uplink(&self) -> bool {
        self.event == UPLINK_EVENT
    }
}

/// Parse a topic in the format `application/{application_id}/device/{dev_eui}/event/{event}`
///
/// # Examples
/// ```
/// use lorawan_tracker::mqtt::parse_topic;
///
/// let parsed = parse_topic("application/ac81e18b/device/7d1f5420e81235c1/event/up").unwrap();
/// assert_eq!(parsed.dev_eui, "7d1f5420e81235c1");
/// assert!(parsed.is_uplink());
/// ```
pub fn parse_topic(topic: &str) -> DomainResult<ParsedTopic> {
    let parts: Vec<&str> = topic.split('/').collect();

    let [application, application_id, device, dev_eui, event_marker, event] = parts.as_slice()
    else {
        return Err(DomainError::InvalidTopic(format!(
            "'{}': expected 'application/{{application_id}}/device/{{dev_eui}}/event/{{event}}'",
            topic
        )));
    };

    if *application != "application" || *device != "device" || *event_marker != "event" {
        return Err(DomainError::InvalidTopic(format!(
            "'{}': unexpected topic layout",
            topic
        )));
    }

    let application_id = application_id.trim();
    let dev_eui = dev_eui.trim();
    let event = event.trim();

    if application_id.is_empty() {
        return Err(DomainError::InvalidTopic(
            "application ID cannot be empty in topic".to_string(),
        ));
    }

    if dev_eui.is_empty() {
        return Err(DomainError::InvalidDevEui(
            "device EUI cannot be empty in topic".to_string(),
        ));
    }

    if event.is_empty() {
        return Err(DomainError::InvalidTopic(
            "event type cannot be empty in topic".to_string(),
        ));
    }

    Ok(ParsedTopic {
        application_id: application_id.to_string(),
        dev_eui: dev_eui.to_lowercase(),
        event: event.to_string(),
    })
}
