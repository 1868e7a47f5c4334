use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Feed;

#[derive(Copy, Clone, Debug)]
pub enum Phase { List, Render, Publish }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self { Phase::List => "list", Phase::Render => "render", Phase::Publish => "publish" } }
    fn span(&self) -> Span { match self { Phase::List => info_span!("list"), Phase::Render => info_span!("render"), Phase::Publish => info_span!("publish") } }
}

impl OpMarker for Feed {
    const NAME: &'static str = "feed";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("feed") }
}
