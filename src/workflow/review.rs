use crate::domain::ticket::TicketRecord;
use crate::domain::triage::{ApprovedChange, Prediction};

/// One entry of the review queue.
#[derive(Debug, Clone)]
pub struct ReviewItem {
    pub ticket: TicketRecord,
    pub prediction: Prediction,
}

/// Operator input for the ticket currently presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewChoice {
    Approve,
    Skip,
    ShowDescription,
    OpenLink,
    Quit,
    Unrecognized,
}

impl ReviewChoice {
    /// Case-insensitive single-letter parse; an empty submission defaults to
    /// approval.
    pub fn parse(input: &str) -> Self {
        match input.trim().to_lowercase().as_str() {
            "" | "y" => Self::Approve,
            "s" => Self::Skip,
            "d" => Self::ShowDescription,
            "o" => Self::OpenLink,
            "q" => Self::Quit,
            _ => Self::Unrecognized,
        }
    }
}

/// What the caller should do after feeding a choice to the session. The
/// side-effecting steps leave the cursor on the same ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewStep {
    Approved,
    Skipped,
    ShowDescription,
    OpenLink,
    Quit,
    Unrecognized,
}

/// In-memory review state machine. Walks the queue in presentation order,
/// accumulating approved changes; it performs no I/O and never writes to the
/// tracker.
pub struct ReviewSession {
    queue: Vec<ReviewItem>,
    cursor: usize,
    approved: Vec<ApprovedChange>,
    quit: bool,
}

impl ReviewSession {
    pub fn new(queue: Vec<ReviewItem>) -> Self {
        Self {
            queue,
            cursor: 0,
            approved: Vec::new(),
            quit: false,
        }
    }

    /// The ticket awaiting a decision, or `None` once the queue is exhausted
    /// or the operator quit.
    pub fn current(&self) -> Option<&ReviewItem> {
        if self.quit {
            return None;
        }
        self.queue.get(self.cursor)
    }

    pub fn approved_count(&self) -> usize {
        self.approved.len()
    }

    /// Consume the session, yielding approved changes in presentation order.
    pub fn into_approved(self) -> Vec<ApprovedChange> {
        self.approved
    }

    pub fn apply_choice(&mut self, choice: ReviewChoice) -> ReviewStep {
        if self.quit || self.cursor >= self.queue.len() {
            return ReviewStep::Quit;
        }
        match choice {
            ReviewChoice::Approve => {
                let item = &self.queue[self.cursor];
                self.approved.push(ApprovedChange {
                    key: item.ticket.key.clone(),
                    team: item.prediction.team.clone(),
                    component: item.prediction.component.clone(),
                });
                self.cursor += 1;
                ReviewStep::Approved
            }
            ReviewChoice::Skip => {
                self.cursor += 1;
                ReviewStep::Skipped
            }
            ReviewChoice::ShowDescription => ReviewStep::ShowDescription,
            ReviewChoice::OpenLink => ReviewStep::OpenLink,
            ReviewChoice::Quit => {
                self.quit = true;
                ReviewStep::Quit
            }
            ReviewChoice::Unrecognized => ReviewStep::Unrecognized,
        }
    }
}

/// Human-readable batch summary shown before the confirmation gate.
pub fn summary_lines(changes: &[ApprovedChange]) -> Vec<String> {
    let mut lines = Vec::new();
    for (idx, change) in changes.iter().enumerate() {
        lines.push(format!("{}. {}:", idx + 1, change.key));
        if !change.team.is_empty() {
            lines.push(format!("   - Set Team -> {}", change.team));
        }
        if !change.component.is_empty() {
            lines.push(format!("   - Set Component -> {}", change.component));
        }
        if change.is_empty() {
            lines.push("   - No changes to apply".to_string());
        }
    }
    lines
}
