//! Protocol trace formatter.
//!
//! Renders one hex-dump line per APDU and, for I-frames, a header line
//! plus a bracketed per-point line, all appended to an opaque sink. The
//! formatter has no other side effects; when no sink is attached every
//! call is a cheap no-op.

use std::fmt::Write as _;
use std::sync::Arc;

use crate::types::{Asdu, ObjectValue, TypeId};

/// Destination for trace lines. Implementations must tolerate append-only
/// access from the protocol task.
pub trait TraceSink: Send + Sync {
    /// Append one preformatted line.
    fn append(&self, line: &str);
}

/// Direction marker for frame dumps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Received from the controlled station
    Rx,
    /// Transmitted to the controlled station
    Tx,
}

/// Hex dump cap, octets.
const DUMP_LIMIT: usize = 100;

/// Cloneable handle over an optional trace sink.
#[derive(Clone, Default)]
pub struct Tracer {
    sink: Option<Arc<dyn TraceSink>>,
}

impl std::fmt::Debug for Tracer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracer")
            .field("active", &self.sink.is_some())
            .finish()
    }
}

impl Tracer {
    /// Tracer that writes to `sink`.
    pub fn new(sink: Arc<dyn TraceSink>) -> Self {
        Self { sink: Some(sink) }
    }

    /// Tracer that drops everything.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Whether a sink is attached.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.sink.is_some()
    }

    /// Append a free-form line.
    pub fn message(&self, line: &str) {
        if let Some(sink) = &self.sink {
            sink.append(line);
        }
    }

    /// Hex dump of a raw frame, capped at [`DUMP_LIMIT`] octets.
    pub fn frame(&self, direction: Direction, bytes: &[u8]) {
        let Some(sink) = &self.sink else { return };
        let mut line = String::with_capacity(16 + 3 * bytes.len().min(DUMP_LIMIT));
        let _ = write!(
            line,
            "{} {:03}: ",
            match direction {
                Direction::Rx => "R-->",
                Direction::Tx => "T<--",
            },
            bytes.len()
        );
        for byte in bytes.iter().take(DUMP_LIMIT) {
            let _ = write!(line, "{byte:02x} ");
        }
        if bytes.len() > DUMP_LIMIT {
            line.push_str("...");
        }
        sink.append(&line);
    }

    /// ASDU header line plus, for monitor process types, the per-point line.
    pub fn asdu(&self, asdu: &Asdu) {
        let Some(sink) = &self.sink else { return };

        let header = &asdu.header;
        let mut line = String::with_capacity(96);
        let _ = write!(
            line,
            "     OA {} CA {} TI TYPE {}:{} CAUSE {}:{} SQ {} ITEMS {}{}{}",
            header.originator,
            header.common_address,
            header.type_id.as_u8(),
            header.type_id.mnemonic(),
            header.cot.as_u8(),
            header.cot.mnemonic(),
            header.vsq.sequence as u8,
            header.vsq.count,
            if header.negative {
                " NEGATIVE"
            } else {
                " POSITIVE"
            },
            if header.test { " TEST" } else { "" },
        );
        sink.append(&line);

        if header.type_id.is_monitor_process() && !asdu.objects.is_empty() {
            let mut points = String::with_capacity(32 * asdu.objects.len());
            points.push_str("     ");
            for obj in &asdu.objects {
                let _ = write!(
                    points,
                    "[{} {} {}",
                    obj.ioa,
                    format_value(obj.value.scalar()),
                    point_flags(&obj.value)
                );
                while points.ends_with(' ') {
                    points.pop();
                }
                if let Some(time) = obj.value.time_tag() {
                    let _ = write!(points, " {time}");
                }
                points.push_str("] ");
            }
            sink.append(points.trim_end());
        }
    }
}

/// Zero decimals for integral values, three otherwise.
pub(crate) fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.3}")
    }
}

/// Per-point flag text in the trace vocabulary.
fn point_flags(value: &ObjectValue) -> String {
    use ObjectValue::*;
    match value {
        SinglePoint { on, quality } | SinglePointTime { on, quality, .. } => {
            format!("{} {quality}", if *on { "on" } else { "off" })
        }
        DoublePoint { state, quality } | DoublePointTime { state, quality, .. } => {
            format!("{} {quality}", state.mnemonic())
        }
        StepPosition {
            transient, quality, ..
        }
        | StepPositionTime {
            transient, quality, ..
        } => format!("{}{quality}", if *transient { "t " } else { "" }),
        IntegratedTotals { counter } | IntegratedTotalsTime { counter, .. } => format!(
            "{}{}{}sq={}",
            if counter.adjusted { "ca " } else { "" },
            if counter.carry { "cy " } else { "" },
            if counter.invalid { "iv " } else { "" },
            counter.sequence
        ),
        PackedSinglePoint {
            status,
            changes,
            quality,
        } => format!("{quality}st={status:016b} cd={changes:016b}"),
        ProtectionEventTime {
            state,
            elapsed_invalid,
            quality,
            elapsed_ms,
            ..
        } => format!(
            "{} {quality}{}{elapsed_ms}ms",
            state.mnemonic(),
            if *elapsed_invalid { "ei " } else { "" },
        ),
        ProtectionStartEventsTime {
            events,
            elapsed_invalid,
            quality,
            elapsed_ms,
            ..
        } => format!(
            "{quality}{}{}{}{}{}{}{}{elapsed_ms}ms",
            if *elapsed_invalid { "ei " } else { "" },
            if events.general { "gs " } else { "" },
            if events.l1 { "sl1 " } else { "" },
            if events.l2 { "sl2 " } else { "" },
            if events.l3 { "sl3 " } else { "" },
            if events.earth { "sie " } else { "" },
            if events.reverse { "srd " } else { "" },
        ),
        ProtectionOutputCircuitTime {
            circuits,
            elapsed_invalid,
            quality,
            elapsed_ms,
            ..
        } => format!(
            "{quality}{}{}{}{}{}{elapsed_ms}ms",
            if *elapsed_invalid { "ei " } else { "" },
            if circuits.general { "gc " } else { "" },
            if circuits.l1 { "cl1 " } else { "" },
            if circuits.l2 { "cl2 " } else { "" },
            if circuits.l3 { "cl3 " } else { "" },
        ),
        other => match other.quality() {
            Some(quality) => quality.to_string(),
            None => String::new(),
        },
    }
}

/// Trace line for a type identification octet that failed to decode.
pub(crate) fn unknown_type_line(raw: u8) -> String {
    format!(
        "     !!! TYPE NOT IMPLEMENTED: {}:{}",
        raw,
        TypeId::name_for_raw(raw)
    )
}
