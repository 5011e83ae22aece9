use super::types::is_bad;

/// True iff the trailing `threshold` codes are all bad.
///
/// Fewer than `threshold` codes is never enough evidence.
pub fn should_alert<I>(codes: I, threshold: usize) -> bool
where
    I: IntoIterator<Item = u16>,
    I::IntoIter: ExactSizeIterator,
{
    let codes = codes.into_iter();
    let len = codes.len();
    if threshold == 0 || len < threshold {
        return false;
    }

    codes.skip(len - threshold).all(is_bad)
}

/// Targets that crossed the alert threshold during one sweep
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AlertBatch {
    targets: Vec<String>,
}

impl AlertBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, target: impl Into<String>) {
        self.targets.push(target.into());
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    pub fn subject(&self) -> String {
        match self.targets.len() {
            1 => "Website down".to_string(),
            n => format!("{} websites down", n),
        }
    }

    /// One line per target, in sweep order
    pub fn body(&self) -> String {
        self.targets
            .iter()
            .map(|target| format!("{} is down!", target))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
