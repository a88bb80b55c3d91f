//! Debounced edge interrupts as a sample stream.
//!
//! The reed switch can also be wired to an interrupt-capable pin instead of
//! an ADC input. The pin interrupt calls [`EdgeTrigger::on_edge`]; edges
//! less than the debounce interval apart are contact bounce and are
//! dropped, the rest reach the registered sink as one
//! [`EDGE_SAMPLE`] each. Pair with a
//! [`SampleCounter`](crate::filter::SampleCounter) to count closures.

use core::cell::RefCell;

use critical_section::Mutex;

use super::{same_sink, Channel, SampleSink, SampleSource};
use crate::constants::EDGE_SAMPLE;
use crate::hal::elapsed;

struct EdgeState<'a> {
    sink: Option<&'a dyn SampleSink>,
    last_edge_ms: Option<u32>,
    rejected: u32,
}

pub struct EdgeTrigger<'a> {
    debounce_ms: u32,
    state: Mutex<RefCell<EdgeState<'a>>>,
}

impl<'a> EdgeTrigger<'a> {
    pub const fn new(debounce_ms: u32) -> Self {
        EdgeTrigger {
            debounce_ms,
            state: Mutex::new(RefCell::new(EdgeState {
                sink: None,
                last_edge_ms: None,
                rejected: 0,
            })),
        }
    }

    /// Pin interrupt body. `now_ms` is the millisecond clock at the edge.
    pub fn on_edge(&self, now_ms: u32) {
        critical_section::with(|cs| {
            let mut st = self.state.borrow_ref_mut(cs);
            let bounce = st
                .last_edge_ms
                .is_some_and(|last| elapsed(now_ms, last) < self.debounce_ms);
            if bounce {
                st.rejected = st.rejected.wrapping_add(1);
                return;
            }
            st.last_edge_ms = Some(now_ms);

            let Some(sink) = st.sink else {
                return;
            };
            drop(st);
            sink.service(EDGE_SAMPLE);
        });
    }

    /// Edges dropped as bounce since construction.
    pub fn rejected(&self) -> u32 {
        critical_section::with(|cs| self.state.borrow_ref(cs).rejected)
    }
}

impl<'a> SampleSource<'a> for EdgeTrigger<'a> {
    /// The channel is ignored: an edge source has a single input.
    fn register(&self, sink: &'a dyn SampleSink, _channel: Channel) {
        critical_section::with(|cs| {
            self.state.borrow_ref_mut(cs).sink = Some(sink);
        });
    }

    fn unregister(&self, sink: &dyn SampleSink) {
        critical_section::with(|cs| {
            let mut st = self.state.borrow_ref_mut(cs);
            if st.sink.is_some_and(|current| same_sink(current, sink)) {
                st.sink = None;
            }
        });
    }
}
