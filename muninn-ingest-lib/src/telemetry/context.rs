//! Per-connection log correlation ids, formatted per W3C Trace Context.

use rand::{rng, Rng};

/// A 128-bit trace id and 64-bit span id minted when a connection opens.
/// Every log line for the session carries both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceContext {
    /// 32 lowercase hex characters.
    pub trace_id: String,
    /// 16 lowercase hex characters.
    pub span_id: String,
}

impl TraceContext {
    pub fn generate() -> Self {
        let mut rng = rng();
        // W3C forbids the all-zero ids.
        let mut trace: [u8; 16] = rng.random();
        while trace == [0u8; 16] {
            trace = rng.random();
        }
        let mut span: [u8; 8] = rng.random();
        while span == [0u8; 8] {
            span = rng.random();
        }
        Self { trace_id: hex::encode(trace), span_id: hex::encode(span) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_have_w3c_widths() {
        let ctx = TraceContext::generate();
        assert_eq!(ctx.trace_id.len(), 32);
        assert_eq!(ctx.span_id.len(), 16);
        assert!(ctx.trace_id.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(ctx.span_id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(ctx.trace_id, "0".repeat(32));
    }

    #[test]
    fn ids_are_distinct_per_connection() {
        let a = TraceContext::generate();
        let b = TraceContext::generate();
        assert_ne!(a, b);
    }
}
