use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PipelineStage {
    Fetching,
    Transcribing,
    Analyzing,
    Refining,
    Producing,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ClipStatus {
    Cutting,
    Captioning,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PipelineProgress {
    Stage {
        stage: PipelineStage,
        detail: String,
    },
    Clip {
        index: usize,
        total: usize,
        status: ClipStatus,
    },
}

/// Optional event channel. Sending never blocks and a dropped receiver is ignored.
#[derive(Debug, Clone, Default)]
pub struct ProgressSink {
    sender: Option<UnboundedSender<PipelineProgress>>,
}

impl ProgressSink {
    pub fn new(sender: UnboundedSender<PipelineProgress>) -> Self {
        Self {
            sender: Some(sender),
        }
    }

    pub fn stage(&self, stage: PipelineStage, detail: impl Into<String>) {
        self.emit(PipelineProgress::Stage {
            stage,
            detail: detail.into(),
        });
    }

    pub fn clip(&self, index: usize, total: usize, status: ClipStatus) {
        self.emit(PipelineProgress::Clip {
            index,
            total,
            status,
        });
    }

    fn emit(&self, event: PipelineProgress) {
        if let Some(sender) = &self.sender {
            let _ = sender.send(event);
        }
    }
}
