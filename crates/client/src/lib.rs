//! SysEvent Client Library
//!
//! Writes structured system events to the local collector over UNIX
//! datagram sockets.
//!
//! # Architecture
//!
//! - [`Writer`] - masks, rate control, record building, and sending
//! - [`controller`] - per call-site write throttling
//! - [`transport`] - datagram sockets with a bounded replay queue
//! - [`router`] - normal vs higher-priority socket selection
//! - [`trace`] - thread-local trace context embedded in records
//! - [`ffi`] - C ABI entry point
//!
//! Record encoding lives in `sysevent-protocol`.
//!
//! # Quick Start
//!
//! ```
//! use sysevent_client::{EventType, ret_code, sysevent_write};
//!
//! let code = sysevent_write!(
//!     "KERNEL_VENDOR", "POWER_KEY", EventType::Fault,
//!     "STATE" => 1u8,
//!     "REASON" => "long press",
//! );
//!
//! if ret_code::is_fatal(code) {
//!     eprintln!("event not written: {}", ret_code::explain(code));
//! }
//! ```
//!
//! ## Explicit writer and rate limit
//!
//! ```
//! use sysevent_client::{Config, ControlParam, EventType, Writer, sysevent_write};
//!
//! let writer = Writer::new(&Config::default());
//! let code = sysevent_write!(
//!     writer = writer;
//!     control = ControlParam::new(1, 5);
//!     "DOMAIN", "EVENT", EventType::Statistic,
//!     "COUNT" => 3u32,
//! );
//! # let _ = code;
//! ```
//!
//! # Status codes
//!
//! Every write returns an `i32` from [`ret_code`]: zero on success, a
//! positive warning when parameters were dropped or truncated but the event
//! was sent, and a negative code when nothing was sent.

pub mod controller;
pub mod error;
pub mod ffi;
pub mod logging;
pub mod ret_code;
pub mod router;
pub mod trace;
pub mod transport;
mod writer;

pub use controller::{Admission, CallSite, ControlParam, RateController};
pub use error::{TransportError, WriteError};
pub use router::{SocketTarget, route, route_record};
pub use transport::{RetryQueue, Transport};
pub use writer::Writer;

pub use sysevent_config::Config;
pub use sysevent_protocol::{EncodedParam, EventType, ParamValue, TraceInfo};

/// Write an event, capturing the call site for rate control
///
/// ```text
/// sysevent_write!(domain, name, event_type, "KEY" => value, ...)
/// sysevent_write!(writer = w; domain, name, event_type, ...)
/// sysevent_write!(control = ControlParam::new(period, threshold); ...)
/// sysevent_write!(writer = w; control = c; ...)
/// ```
///
/// Without `writer = ..;` the global writer is used. Evaluates to the `i32`
/// status code.
#[macro_export]
macro_rules! sysevent_write {
    (writer = $writer:expr; control = $control:expr; $($rest:tt)+) => {
        $crate::sysevent_write!(@emit $writer, ::core::option::Option::Some($control); $($rest)+)
    };
    (writer = $writer:expr; $($rest:tt)+) => {
        $crate::sysevent_write!(@emit $writer, ::core::option::Option::None; $($rest)+)
    };
    (control = $control:expr; $($rest:tt)+) => {
        $crate::sysevent_write!(
            @emit $crate::Writer::global(), ::core::option::Option::Some($control); $($rest)+
        )
    };
    (@emit $writer:expr, $control:expr;
        $domain:expr, $name:expr, $event_type:expr $(, $key:expr => $value:expr)* $(,)?
    ) => {{
        let params: ::std::vec::Vec<$crate::EncodedParam> =
            ::std::vec![$($crate::EncodedParam::new($key, $value)),*];
        $writer.write_with_control(
            $control,
            &$crate::CallSite::new(::core::module_path!(), ::core::line!()),
            $domain,
            $name,
            $event_type,
            params,
        )
    }};
    ($domain:expr, $name:expr, $event_type:expr $(, $($rest:tt)*)?) => {
        $crate::sysevent_write!(
            @emit $crate::Writer::global(), ::core::option::Option::None;
            $domain, $name, $event_type $(, $($rest)*)?
        )
    };
}
