//! Event socket routing
//!
//! Most events go to the normal socket. A fixed set of hang, block, and
//! fault events go to the higher-priority socket so the collector handles
//! them ahead of the bulk stream.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use sysevent_protocol::{EventType, peek_header};

/// Destination socket for a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocketTarget {
    Normal,
    HigherPriority,
}

enum DomainRule {
    /// Only the listed event names
    Events(HashSet<&'static str>),
    /// Every event of type FAULT
    AllFaults,
}

static PRIORITY_TABLE: Lazy<HashMap<&'static str, DomainRule>> = Lazy::new(|| {
    let events = |names: &[&'static str]| DomainRule::Events(names.iter().copied().collect());

    HashMap::from([
        (
            "AAFWK",
            events(&[
                "APP_INPUT_BLOCK",
                "BUSSINESS_THREAD_BLOCK_3S",
                "BUSSINESS_THREAD_BLOCK_6S",
                "LIFECYCLE_HALF_TIMEOUT",
                "LIFECYCLE_TIMEOUT",
                "THREAD_BLOCK_3S",
                "THREAD_BLOCK_6S",
            ]),
        ),
        (
            "ACE",
            events(&["UI_BLOCK_3S", "UI_BLOCK_6S", "UI_BLOCK_RECOVERED"]),
        ),
        (
            "FRAMEWORK",
            events(&[
                "IPC_FULL",
                "IPC_FULL_WARNING",
                "SERVICE_BLOCK",
                "SERVICE_TIMEOUT",
                "SERVICE_WARNING",
            ]),
        ),
        ("RELIABILITY", DomainRule::AllFaults),
        ("GRAPHIC", events(&["NO_DRAW"])),
        ("MULTIMODALINPUT", events(&["TARGET_POINTER_EVENT_FAILURE"])),
        ("POWER", events(&["SCREEN_ON_TIMEOUT"])),
        ("WINDOWMANAGER", events(&["NO_FOCUS_WINDOW"])),
        ("SCHEDULE_EXT", events(&["SYSTEM_LOAD_LEVEL_CHANGED"])),
    ])
});

/// Pick the socket for an event
pub fn route(domain: &str, name: &str, event_type: EventType) -> SocketTarget {
    let priority = match PRIORITY_TABLE.get(domain) {
        Some(DomainRule::Events(names)) => names.contains(name),
        Some(DomainRule::AllFaults) => event_type == EventType::Fault,
        None => false,
    };

    if priority {
        SocketTarget::HigherPriority
    } else {
        SocketTarget::Normal
    }
}

/// Pick the socket for an encoded record by reading its header
///
/// Records too short to hold a header go to the normal socket.
pub fn route_record(record: &[u8]) -> SocketTarget {
    match peek_header(record) {
        Ok(header) => route(&header.domain, &header.name, header.event_type),
        Err(e) => {
            tracing::warn!(error = %e, len = record.len(), "record header unreadable, routing to normal socket");
            SocketTarget::Normal
        }
    }
}
