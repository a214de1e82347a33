//! Ambient trace context
//!
//! Each thread carries an optional [`TraceInfo`]. Writes made while a valid
//! trace is set embed it in the record header.

use std::cell::Cell;

use sysevent_protocol::TraceInfo;

thread_local! {
    static CURRENT: Cell<TraceInfo> = const { Cell::new(TraceInfo::new(0, 0, 0, 0)) };
}

/// Set the trace for the calling thread
pub fn set_current(info: TraceInfo) {
    CURRENT.with(|cell| cell.set(info));
}

/// Clear the trace for the calling thread
pub fn clear() {
    set_current(TraceInfo::default());
}

/// The calling thread's trace, if one with a non-zero id is set
pub fn current() -> Option<TraceInfo> {
    let info = CURRENT.with(Cell::get);
    info.is_valid().then_some(info)
}

/// Set a trace until the returned guard drops
///
/// The previous trace is restored on drop, so scopes nest.
pub fn scope(info: TraceInfo) -> TraceScope {
    let previous = CURRENT.with(|cell| cell.replace(info));
    TraceScope { previous }
}

/// Guard returned by [`scope`]
#[must_use = "the trace is cleared as soon as the guard drops"]
pub struct TraceScope {
    previous: TraceInfo,
}

impl Drop for TraceScope {
    fn drop(&mut self) {
        set_current(self.previous);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_none() {
        std::thread::spawn(|| assert_eq!(current(), None))
            .join()
            .unwrap();
    }

    #[test]
    fn test_set_and_clear() {
        let info = TraceInfo::new(42, 1, 0, 0);
        set_current(info);
        assert_eq!(current(), Some(info));

        clear();
        assert_eq!(current(), None);
    }

    #[test]
    fn test_zero_id_is_not_current() {
        set_current(TraceInfo::new(0, 5, 6, 1));
        assert_eq!(current(), None);
        clear();
    }

    #[test]
    fn test_scopes_nest() {
        let outer = TraceInfo::new(1, 1, 0, 0);
        let inner = TraceInfo::new(2, 2, 1, 0);

        let outer_guard = scope(outer);
        {
            let _inner = scope(inner);
            assert_eq!(current(), Some(inner));
        }
        assert_eq!(current(), Some(outer));

        drop(outer_guard);
        assert_eq!(current(), None);
    }

    #[test]
    fn test_trace_is_per_thread() {
        set_current(TraceInfo::new(7, 0, 0, 0));
        std::thread::spawn(|| assert_eq!(current(), None))
            .join()
            .unwrap();
        clear();
    }
}
