use crate::error::Error;

/// A unit of work in a run: the scan and the deletion phase.
pub trait Task {
    type Report;

    fn run(&mut self) -> Result<Self::Report, Error>;
}
