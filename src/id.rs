/// Source of identifiers for new entries.
///
/// Injected into the store so tests can substitute a deterministic source.
pub(crate) trait IdGenerator {
    fn generate(&self) -> String;
}

/// Random v4 UUIDs, the production source.
pub(crate) struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Counter-backed ids ("entry-0000", "entry-0001", ...) for tests.
#[cfg(test)]
pub(crate) struct SequentialIds(std::cell::Cell<u64>);

#[cfg(test)]
impl SequentialIds {
    pub(crate) fn new() -> Self {
        Self(std::cell::Cell::new(0))
    }
}

#[cfg(test)]
impl IdGenerator for SequentialIds {
    fn generate(&self) -> String {
        let n = self.0.get();
        self.0.set(n + 1);
        format!("entry-{n:04}")
    }
}
