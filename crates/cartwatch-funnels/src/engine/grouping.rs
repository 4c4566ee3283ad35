use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;

use super::classifier::FunnelEvent;

/// Which identifier attributes events to one shopper journey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    /// One browsing session
    Session,
    /// One device/browser across sessions
    Visitor,
    /// One authenticated user
    User,
}

impl Default for GroupBy {
    fn default() -> Self {
        GroupBy::Session
    }
}

impl GroupBy {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Session => "session",
            Self::Visitor => "visitor",
            Self::User => "user",
        }
    }
}

/// One shopper journey: every classified event sharing the selected
/// identifier, ascending by timestamp.
#[derive(Debug, Clone)]
pub struct EventGroup {
    pub key: String,
    pub group_by: GroupBy,
    pub events: Vec<FunnelEvent>,
}

/// Partition events into per-identifier groups.
///
/// Events without a value for the selected identifier cannot be attributed
/// to a cart and are silently dropped. The per-group sort is stable, so
/// events sharing a timestamp keep their input order, and groups come out
/// sorted by key so repeated runs produce identical output.
pub fn group_events(events: Vec<FunnelEvent>, group_by: GroupBy) -> Vec<EventGroup> {
    let mut buckets: HashMap<String, Vec<FunnelEvent>> = HashMap::new();

    for event in events {
        let identifier = match group_by {
            GroupBy::Session => event.session_id.clone(),
            GroupBy::Visitor => event.visitor_id.clone(),
            GroupBy::User => event.user_id.clone(),
        };
        let key = match identifier {
            Some(key) if !key.is_empty() => key,
            _ => continue,
        };
        buckets.entry(key).or_default().push(event);
    }

    let mut groups: Vec<EventGroup> = buckets
        .into_iter()
        .map(|(key, mut events)| {
            events.sort_by_key(|e| e.timestamp);
            EventGroup {
                key,
                group_by,
                events,
            }
        })
        .collect();
    groups.sort_by(|a, b| a.key.cmp(&b.key));

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::classifier::FunnelStep;
    use cartwatch_core::UtcDateTime;
    use chrono::{TimeZone, Utc};

    fn at(minute: u32) -> UtcDateTime {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, minute, 0).unwrap()
    }

    fn event(
        minute: u32,
        session: Option<&str>,
        visitor: Option<&str>,
        user: Option<&str>,
        page: &str,
    ) -> FunnelEvent {
        FunnelEvent {
            timestamp: at(minute),
            session_id: session.map(String::from),
            visitor_id: visitor.map(String::from),
            user_id: user.map(String::from),
            step: FunnelStep::AddToCart,
            page: page.to_string(),
            product: None,
        }
    }

    #[test]
    fn groups_by_selected_identifier() {
        let events = vec![
            event(0, Some("s1"), Some("v1"), None, "/a"),
            event(1, Some("s2"), Some("v1"), None, "/b"),
            event(2, Some("s1"), Some("v2"), None, "/c"),
        ];

        let by_session = group_events(events.clone(), GroupBy::Session);
        assert_eq!(by_session.len(), 2);
        assert_eq!(by_session[0].key, "s1");
        assert_eq!(by_session[0].events.len(), 2);
        assert_eq!(by_session[1].key, "s2");

        let by_visitor = group_events(events, GroupBy::Visitor);
        assert_eq!(by_visitor.len(), 2);
        assert_eq!(by_visitor[0].key, "v1");
        assert_eq!(by_visitor[0].events.len(), 2);
    }

    #[test]
    fn excludes_events_lacking_the_selected_identifier() {
        let events = vec![
            event(0, Some("s1"), None, None, "/a"),
            event(1, None, Some("v1"), None, "/b"),
            event(2, Some(""), None, None, "/c"),
        ];

        let groups = group_events(events, GroupBy::Session);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].key, "s1");
        assert_eq!(groups[0].events.len(), 1);
    }

    #[test]
    fn no_group_is_empty_and_no_event_is_duplicated() {
        let events = vec![
            event(0, Some("s1"), None, None, "/a"),
            event(1, Some("s2"), None, None, "/b"),
        ];

        let groups = group_events(events, GroupBy::Session);
        assert!(groups.iter().all(|g| !g.events.is_empty()));
        let total: usize = groups.iter().map(|g| g.events.len()).sum();
        assert_eq!(total, 2);
    }

    #[test]
    fn events_are_sorted_by_timestamp_within_a_group() {
        let events = vec![
            event(5, Some("s1"), None, None, "/late"),
            event(1, Some("s1"), None, None, "/early"),
            event(3, Some("s1"), None, None, "/middle"),
        ];

        let groups = group_events(events, GroupBy::Session);
        let pages: Vec<&str> = groups[0].events.iter().map(|e| e.page.as_str()).collect();
        assert_eq!(pages, ["/early", "/middle", "/late"]);
    }

    #[test]
    fn timestamp_ties_keep_input_order() {
        // The stable sort decides which event counts as "last" when two
        // share a timestamp, so input order must survive.
        let events = vec![
            event(2, Some("s1"), None, None, "/first"),
            event(2, Some("s1"), None, None, "/second"),
        ];

        let groups = group_events(events, GroupBy::Session);
        let pages: Vec<&str> = groups[0].events.iter().map(|e| e.page.as_str()).collect();
        assert_eq!(pages, ["/first", "/second"]);
    }

    #[test]
    fn groups_come_out_sorted_by_key() {
        let events = vec![
            event(0, Some("zeta"), None, None, "/a"),
            event(1, Some("alpha"), None, None, "/b"),
            event(2, Some("mid"), None, None, "/c"),
        ];

        let keys: Vec<String> = group_events(events, GroupBy::Session)
            .into_iter()
            .map(|g| g.key)
            .collect();
        assert_eq!(keys, ["alpha", "mid", "zeta"]);
    }

    #[test]
    fn group_by_serde_uses_snake_case() {
        assert_eq!(
            serde_json::from_str::<GroupBy>(r#""session""#).unwrap(),
            GroupBy::Session
        );
        assert_eq!(
            serde_json::from_str::<GroupBy>(r#""visitor""#).unwrap(),
            GroupBy::Visitor
        );
        assert!(serde_json::from_str::<GroupBy>(r#""account""#).is_err());
    }
}
