use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Stats;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Count, Last }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self { Phase::Count => "count", Phase::Last => "last" } }
    fn span(&self) -> Span { match self { Phase::Count => info_span!("count"), Phase::Last => info_span!("last") } }
}

impl OpMarker for Stats {
    const NAME: &'static str = "stats";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("stats") }
}
