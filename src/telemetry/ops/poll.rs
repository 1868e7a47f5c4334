use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Poll;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Channel, List, Classify, Download, Save, Trim, Render, Publish }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Channel => "channel",
        Phase::List => "list",
        Phase::Classify => "classify",
        Phase::Download => "download",
        Phase::Save => "save",
        Phase::Trim => "trim",
        Phase::Render => "render",
        Phase::Publish => "publish",
    }}
    fn span(&self) -> Span { match self {
        Phase::Channel => info_span!("channel"),
        Phase::List => info_span!("list"),
        Phase::Classify => info_span!("classify"),
        Phase::Download => info_span!("download"),
        Phase::Save => info_span!("save"),
        Phase::Trim => info_span!("trim"),
        Phase::Render => info_span!("render"),
        Phase::Publish => info_span!("publish"),
    }}
}

impl OpMarker for Poll {
    const NAME: &'static str = "poll";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("poll") }
}
