//! Ordered target list and the cursor walking through it.

/// Where the player is in the target list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencePhase {
    AwaitingFirstTarget,
    InProgress(usize),
    Complete,
}

/// What a call to [`TargetSequence::advance`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceTransition {
    Advanced { index: usize, target: String },
    Completed,
    /// The sequence was already complete; nothing changed.
    AlreadyComplete,
}

#[derive(Debug, Clone)]
pub struct TargetSequence {
    targets: Vec<String>,
    phase: SequencePhase,
}

impl TargetSequence {
    pub fn new(targets: Vec<String>) -> Self {
        Self {
            targets,
            phase: SequencePhase::AwaitingFirstTarget,
        }
    }

    pub fn phase(&self) -> SequencePhase {
        self.phase
    }

    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.phase == SequencePhase::Complete
    }

    /// The name currently being searched for. `None` before the first advance
    /// and after completion; `None` matches no node.
    pub fn current_target(&self) -> Option<&str> {
        match self.phase {
            SequencePhase::InProgress(index) => self.targets.get(index).map(String::as_str),
            SequencePhase::AwaitingFirstTarget | SequencePhase::Complete => None,
        }
    }

    /// Number of targets already found.
    pub fn found_count(&self) -> usize {
        match self.phase {
            SequencePhase::AwaitingFirstTarget => 0,
            SequencePhase::InProgress(index) => index,
            SequencePhase::Complete => self.targets.len(),
        }
    }

    /// Moves the cursor forward by one.
    pub fn advance(&mut self) -> SequenceTransition {
        let next = match self.phase {
            SequencePhase::AwaitingFirstTarget => 0,
            SequencePhase::InProgress(index) => index + 1,
            SequencePhase::Complete => return SequenceTransition::AlreadyComplete,
        };

        match self.targets.get(next) {
            Some(target) => {
                self.phase = SequencePhase::InProgress(next);
                SequenceTransition::Advanced {
                    index: next,
                    target: target.clone(),
                }
            }
            None => {
                self.phase = SequencePhase::Complete;
                SequenceTransition::Completed
            }
        }
    }
}
