use serde::{Deserialize, Serialize};

use crate::engine::Span;

/// A [`Span`] after the window controller has classified it.
///
/// `partial` is set exclusively by the controller: true means the span's
/// text or timing may still change once more audio arrives and the region
/// is re-recognized; false means the span is confirmed and will never be
/// re-emitted or revised. Times stay relative to the start of the buffer
/// the span was recognized in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub partial: bool,
    #[serde(flatten)]
    pub span: Span,
}

impl Segment {
    pub(crate) fn classified(span: Span, partial: bool) -> Self {
        Self { partial, span }
    }
}
