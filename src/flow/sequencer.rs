//! The bidirectional sequencer: a linear chain of steps, each exposing a
//! forward and a backward action, walked by repeatedly calling
//! [`Sequencer::forward`]/[`Sequencer::backward`] until each returns
//! [`Status::Done`].
//!
//! This is a different shape from [`Flow`]: a flow graph fires every step's
//! action once per [`Flow::call`]; a sequencer steps through a chain one
//! [`Status`] at a time, and can run it back the way it came. A direction
//! change is refused — silently continuing to retry the in-progress
//! direction — until the current step reports `Done`, so a step's effect and
//! its undo are never interleaved. This pins down behavior the source
//! material left unspecified for the case where both directions are
//! mid-retry in the same session.

/// A single step's poll result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Done,
    NotDone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

struct SequencerStep {
    name: &'static str,
    forward: Box<dyn FnMut() -> Status + Send>,
    backward: Box<dyn FnMut() -> Status + Send>,
}

/// Accumulates steps for a [`Sequencer`], in chain order.
pub struct SequencerBuilder {
    steps: Vec<SequencerStep>,
}

impl Default for SequencerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SequencerBuilder {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Append one step with its forward and backward actions.
    pub fn step(
        mut self,
        name: &'static str,
        forward: impl FnMut() -> Status + Send + 'static,
        backward: impl FnMut() -> Status + Send + 'static,
    ) -> Self {
        self.steps.push(SequencerStep { name, forward: Box::new(forward), backward: Box::new(backward) });
        self
    }

    /// Finalize into a runnable [`Sequencer`], starting at the first step.
    pub fn build(self) -> Sequencer {
        Sequencer { steps: self.steps, position: 0, pending: None }
    }
}

/// A built, runnable bidirectional step chain.
pub struct Sequencer {
    steps: Vec<SequencerStep>,
    position: usize,
    /// `Some(d)` iff the step at `position` returned `NotDone` for direction
    /// `d` and hasn't been retried to completion yet.
    pending: Option<Direction>,
}

impl Sequencer {
    /// The name of the step the next call would act on, if any (`None` for
    /// an empty sequencer).
    pub fn current(&self) -> Option<&'static str> {
        self.steps.get(self.position).map(|s| s.name)
    }

    /// Advance forward: retries the in-progress direction (if any) until it
    /// completes, then proceeds to step forward through the chain, cascading
    /// past every step whose forward action immediately reports `Done`,
    /// until one reports `NotDone` or the end of the chain is reached.
    pub fn forward(&mut self) -> Status {
        self.drive(Direction::Forward)
    }

    /// Symmetric to [`Sequencer::forward`], walking backward through the chain.
    pub fn backward(&mut self) -> Status {
        self.drive(Direction::Backward)
    }

    fn drive(&mut self, requested: Direction) -> Status {
        if self.steps.is_empty() {
            return Status::Done;
        }

        if let Some(pending) = self.pending {
            if pending != requested {
                if self.invoke(pending) == Status::NotDone {
                    return Status::NotDone;
                }
                self.pending = None;
                if !self.advance(pending) {
                    return Status::Done;
                }
            }
        }

        loop {
            if self.invoke(requested) == Status::NotDone {
                self.pending = Some(requested);
                return Status::NotDone;
            }
            if !self.advance(requested) {
                self.pending = None;
                return Status::Done;
            }
        }
    }

    fn invoke(&mut self, direction: Direction) -> Status {
        let step = &mut self.steps[self.position];
        match direction {
            Direction::Forward => (step.forward)(),
            Direction::Backward => (step.backward)(),
        }
    }

    /// Moves `position` one step in `direction`. Returns `false` (leaving
    /// `position` unchanged) at either end of the chain.
    fn advance(&mut self, direction: Direction) -> bool {
        match direction {
            Direction::Forward => {
                if self.position + 1 < self.steps.len() {
                    self.position += 1;
                    true
                } else {
                    false
                }
            }
            Direction::Backward => {
                if self.position > 0 {
                    self.position -= 1;
                    true
                } else {
                    false
                }
            }
        }
    }
}
