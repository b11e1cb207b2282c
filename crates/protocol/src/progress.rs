use serde::{Deserialize, Serialize};

/// A `(percent, message)` report emitted while a workflow runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
	pub percent: u8,
	pub message: String,
}

impl ProgressEvent {
	pub fn new(percent: u8, message: impl Into<String>) -> Self {
		Self {
			percent: percent.min(100),
			message: message.into(),
		}
	}

	/// Progress after `done` of `total` steps.
	pub fn step(done: usize, total: usize, message: impl Into<String>) -> Self {
		let percent = if total == 0 { 100 } else { (done.min(total) * 100 / total) as u8 };
		Self::new(percent, message)
	}

	/// Maps this event's 0-100 range onto the `low..=high` band.
	pub fn rescale(&self, low: u8, high: u8) -> u8 {
		let span = u32::from(high.saturating_sub(low));
		low + (u32::from(self.percent) * span / 100) as u8
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn step_percentages() {
		assert_eq!(ProgressEvent::step(1, 3, "").percent, 33);
		assert_eq!(ProgressEvent::step(3, 3, "").percent, 100);
		assert_eq!(ProgressEvent::step(0, 0, "").percent, 100);
	}

	#[test]
	fn rescales_into_task_band() {
		assert_eq!(ProgressEvent::new(0, "").rescale(20, 90), 20);
		assert_eq!(ProgressEvent::new(50, "").rescale(20, 90), 55);
		assert_eq!(ProgressEvent::new(100, "").rescale(20, 90), 90);
	}
}
