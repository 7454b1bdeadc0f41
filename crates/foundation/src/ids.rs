/// Process-wide marker id sequence.
///
/// Ids are handed out in strictly increasing order and never reused,
/// independent of which map instance asked for them. The decimal string
/// form is the caller-facing identifier.
#[derive(Debug, Default)]
pub struct MarkerIdAllocator {
    next: u64,
}

impl MarkerIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next marker id as a decimal string.
    pub fn next_id(&mut self) -> String {
        let id = self.next;
        self.next += 1;
        id.to_string()
    }
}
